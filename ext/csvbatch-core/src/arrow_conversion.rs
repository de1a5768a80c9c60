//! Conversion between typed cell columns and Arrow arrays

use crate::{CellValue, SchemaError, SchemaResult};
use arrow_array::{builder::*, Array, ArrayRef};
use arrow_schema::{DataType, TimeUnit};
use bytes::Bytes;
use ordered_float::OrderedFloat;
use std::sync::Arc;

/// Convert a single value from an Arrow array at the given index to a CellValue
pub fn arrow_to_cell_value(array: &dyn Array, index: usize) -> SchemaResult<CellValue> {
    use arrow_array::*;

    if array.is_null(index) {
        return Ok(CellValue::Null);
    }

    match array.data_type() {
        DataType::Boolean => {
            let array = downcast_array::<BooleanArray>(array)?;
            Ok(CellValue::Boolean(array.value(index)))
        }
        DataType::Int32 => {
            let array = downcast_array::<Int32Array>(array)?;
            Ok(CellValue::Int32(array.value(index)))
        }
        DataType::Int64 => {
            let array = downcast_array::<Int64Array>(array)?;
            Ok(CellValue::Int64(array.value(index)))
        }
        DataType::Float32 => {
            let array = downcast_array::<Float32Array>(array)?;
            Ok(CellValue::Float32(OrderedFloat(array.value(index))))
        }
        DataType::Float64 => {
            let array = downcast_array::<Float64Array>(array)?;
            Ok(CellValue::Float64(OrderedFloat(array.value(index))))
        }
        DataType::Utf8 => {
            let array = downcast_array::<StringArray>(array)?;
            Ok(CellValue::String(Arc::from(array.value(index))))
        }
        DataType::Binary => {
            let array = downcast_array::<BinaryArray>(array)?;
            Ok(CellValue::Bytes(Bytes::copy_from_slice(array.value(index))))
        }
        DataType::Date32 => {
            let array = downcast_array::<Date32Array>(array)?;
            Ok(CellValue::Date32(array.value(index)))
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            let array = downcast_array::<TimestampMicrosecondArray>(array)?;
            Ok(CellValue::TimestampMicros(array.value(index)))
        }
        DataType::Decimal128(_precision, scale) => {
            let array = downcast_array::<Decimal128Array>(array)?;
            Ok(CellValue::Decimal128(array.value(index), *scale))
        }
        dt => Err(SchemaError::unsupported(format!(
            "Arrow data type {:?} has no cell representation",
            dt
        ))),
    }
}

/// Convert a column of CellValues to an Arrow array of `data_type`
pub fn cell_values_to_arrow_array(
    values: Vec<CellValue>,
    data_type: &DataType,
) -> SchemaResult<ArrayRef> {
    match data_type {
        DataType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(values.len());
            for value in values {
                match value {
                    CellValue::Boolean(b) => builder.append_value(b),
                    CellValue::Null => builder.append_null(),
                    other => return Err(mismatch("Boolean", &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }

        DataType::Int32 => build_int32_array(values),
        DataType::Int64 => build_int64_array(values),
        DataType::Float32 => build_float32_array(values),
        DataType::Float64 => build_float64_array(values),

        DataType::Utf8 => build_string_array(values),
        DataType::Binary => build_binary_array(values),

        DataType::Date32 => build_date32_array(values),
        DataType::Timestamp(TimeUnit::Microsecond, tz) => build_timestamp_array(values, tz.clone()),

        DataType::Decimal128(precision, scale) => {
            build_decimal128_array(values, *precision, *scale)
        }

        dt => Err(SchemaError::unsupported(format!(
            "Arrow data type {:?} for conversion",
            dt
        ))),
    }
}

/// Helper function to downcast an array with better error messages
fn downcast_array<T: 'static>(array: &dyn Array) -> SchemaResult<&T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        SchemaError::unsupported(format!("cast to {}", std::any::type_name::<T>()))
    })
}

fn mismatch(expected: &'static str, value: &CellValue) -> SchemaError {
    SchemaError::TypeMismatch {
        expected,
        found: value.type_name(),
    }
}

/// Build Int32 array
fn build_int32_array(values: Vec<CellValue>) -> SchemaResult<ArrayRef> {
    let mut builder = Int32Builder::with_capacity(values.len());
    for value in values {
        match value {
            CellValue::Int32(i) => builder.append_value(i),
            CellValue::Null => builder.append_null(),
            other => return Err(mismatch("Int32", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

/// Build Int64 array
fn build_int64_array(values: Vec<CellValue>) -> SchemaResult<ArrayRef> {
    let mut builder = Int64Builder::with_capacity(values.len());
    for value in values {
        match value {
            CellValue::Int64(i) => builder.append_value(i),
            CellValue::Null => builder.append_null(),
            other => return Err(mismatch("Int64", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

/// Build Float32 array
fn build_float32_array(values: Vec<CellValue>) -> SchemaResult<ArrayRef> {
    let mut builder = Float32Builder::with_capacity(values.len());
    for value in values {
        match value {
            CellValue::Float32(OrderedFloat(f)) => builder.append_value(f),
            CellValue::Null => builder.append_null(),
            other => return Err(mismatch("Float32", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

/// Build Float64 array
fn build_float64_array(values: Vec<CellValue>) -> SchemaResult<ArrayRef> {
    let mut builder = Float64Builder::with_capacity(values.len());
    for value in values {
        match value {
            CellValue::Float64(OrderedFloat(f)) => builder.append_value(f),
            CellValue::Null => builder.append_null(),
            other => return Err(mismatch("Float64", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

/// Build String array
fn build_string_array(values: Vec<CellValue>) -> SchemaResult<ArrayRef> {
    let mut builder = StringBuilder::with_capacity(values.len(), 0);
    for value in values {
        match value {
            CellValue::String(s) => builder.append_value(&s),
            CellValue::Null => builder.append_null(),
            other => return Err(mismatch("String", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

/// Build Binary array
fn build_binary_array(values: Vec<CellValue>) -> SchemaResult<ArrayRef> {
    let mut builder = BinaryBuilder::with_capacity(values.len(), 0);
    for value in values {
        match value {
            CellValue::Bytes(b) => builder.append_value(&b),
            CellValue::Null => builder.append_null(),
            other => return Err(mismatch("Bytes", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

/// Build Date32 array
fn build_date32_array(values: Vec<CellValue>) -> SchemaResult<ArrayRef> {
    let mut builder = Date32Builder::with_capacity(values.len());
    for value in values {
        match value {
            CellValue::Date32(d) => builder.append_value(d),
            CellValue::Null => builder.append_null(),
            other => return Err(mismatch("Date32", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

/// Build microsecond timestamp array
fn build_timestamp_array(
    values: Vec<CellValue>,
    timezone: Option<Arc<str>>,
) -> SchemaResult<ArrayRef> {
    let mut builder =
        TimestampMicrosecondBuilder::with_capacity(values.len()).with_timezone_opt(timezone);
    for value in values {
        match value {
            CellValue::TimestampMicros(t) => builder.append_value(t),
            CellValue::Null => builder.append_null(),
            other => return Err(mismatch("TimestampMicros", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}

/// Build Decimal128 array
fn build_decimal128_array(
    values: Vec<CellValue>,
    precision: u8,
    scale: i8,
) -> SchemaResult<ArrayRef> {
    let mut builder = Decimal128Builder::with_capacity(values.len())
        .with_precision_and_scale(precision, scale)?;
    for value in values {
        match value {
            CellValue::Decimal128(d, s) if s == scale => builder.append_value(d),
            CellValue::Null => builder.append_null(),
            other => return Err(mismatch("Decimal128", &other)),
        }
    }
    Ok(Arc::new(builder.finish()))
}
