//! Typed conversion of string batches into Arrow record batches
//!
//! A [`BatchConverter`] binds a [`SchemaDefinition`] to the header committed
//! by a [`BatchReader`](crate::BatchReader) once, then coerces every batch the
//! reader produces. Conversion is all-or-nothing: the first field that does
//! not fit its declared type fails the whole batch.

use crate::arrow_conversion::cell_values_to_arrow_array;
use crate::batch::{Batch, Header};
use crate::schema::{FieldSpec, FieldType, SchemaDefinition};
use crate::value::CellValue;
use crate::{SchemaError, SchemaResult};
use arrow_array::{ArrayRef, RecordBatch};
use arrow_schema::SchemaRef;
use bytes::Bytes;
use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::Timestamp;
use ordered_float::OrderedFloat;
use std::sync::Arc;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone)]
struct BoundColumn {
    spec: FieldSpec,
    index: usize,
}

/// Converts batches of string rows into Arrow record batches
#[derive(Debug, Clone)]
pub struct BatchConverter {
    schema: SchemaRef,
    columns: Vec<BoundColumn>,
}

impl BatchConverter {
    /// Bind every schema field to the header column of the same name.
    ///
    /// Header columns the schema does not mention are ignored.
    pub fn new(definition: &SchemaDefinition, header: &Header) -> SchemaResult<Self> {
        let columns = definition
            .fields()
            .map(|spec| {
                let index = header
                    .index_of(&spec.name)
                    .ok_or_else(|| SchemaError::MissingColumn(spec.name.clone()))?;
                Ok(BoundColumn {
                    spec: spec.clone(),
                    index,
                })
            })
            .collect::<SchemaResult<Vec<_>>>()?;

        log::debug!(
            "bound {} schema fields to a header of {} columns",
            columns.len(),
            header.len()
        );

        Ok(Self {
            schema: definition.to_arrow_schema(),
            columns,
        })
    }

    /// The Arrow schema of every record batch this converter produces
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    pub fn convert(&self, batch: &Batch) -> SchemaResult<RecordBatch> {
        let arrays = self
            .columns
            .iter()
            .map(|column| self.convert_column(column, batch))
            .collect::<SchemaResult<Vec<ArrayRef>>>()?;

        let record_batch = RecordBatch::try_new(self.schema(), arrays)?;
        log::debug!(
            "converted batch of {} rows into {} columns",
            record_batch.num_rows(),
            record_batch.num_columns()
        );
        Ok(record_batch)
    }

    fn convert_column(&self, column: &BoundColumn, batch: &Batch) -> SchemaResult<ArrayRef> {
        let spec = &column.spec;
        let mut values = Vec::with_capacity(batch.len());

        for (i, row) in batch.iter().enumerate() {
            let row_number = i + 1;
            let raw = row.get(column.index).ok_or_else(|| {
                SchemaError::conversion(row_number, &spec.name, "row is shorter than the header")
            })?;
            let value = coerce_field(spec, raw).map_err(|message| {
                log::debug!("conversion of {:?} failed at row {}", spec.name, row_number);
                SchemaError::conversion(row_number, &spec.name, message)
            })?;
            values.push(value);
        }

        cell_values_to_arrow_array(values, &spec.field_type.to_arrow())
    }
}

/// Coerce one raw field to the type `spec` declares
fn coerce_field(spec: &FieldSpec, raw: &str) -> Result<CellValue, String> {
    let is_text = matches!(spec.field_type, FieldType::String | FieldType::Bytes);
    let value = if is_text { raw } else { raw.trim() };

    if value.is_empty() {
        if spec.nullable {
            return Ok(CellValue::Null);
        }
        if !is_text {
            return Err(format!(
                "empty value for non-nullable {} field",
                spec.field_type.name()
            ));
        }
    }

    match spec.field_type {
        FieldType::String => Ok(CellValue::String(Arc::from(value))),
        FieldType::Bytes => Ok(CellValue::Bytes(Bytes::copy_from_slice(value.as_bytes()))),
        FieldType::Int32 => value
            .parse::<i32>()
            .map(CellValue::Int32)
            .map_err(|e| format!("invalid int32 {:?}: {}", value, e)),
        FieldType::Int64 => value
            .parse::<i64>()
            .map(CellValue::Int64)
            .map_err(|e| format!("invalid int64 {:?}: {}", value, e)),
        FieldType::Float32 => value
            .parse::<f32>()
            .map(|f| CellValue::Float32(OrderedFloat(f)))
            .map_err(|e| format!("invalid float32 {:?}: {}", value, e)),
        FieldType::Float64 => value
            .parse::<f64>()
            .map(|f| CellValue::Float64(OrderedFloat(f)))
            .map_err(|e| format!("invalid float64 {:?}: {}", value, e)),
        FieldType::Bool => parse_bool(value).map(CellValue::Boolean),
        FieldType::Date => parse_date(value, spec.format.as_deref()).map(CellValue::Date32),
        FieldType::Timestamp => {
            parse_timestamp_micros(value, spec.format.as_deref()).map(CellValue::TimestampMicros)
        }
        FieldType::Decimal { precision, scale } => {
            parse_decimal(value, precision, scale).map(|d| CellValue::Decimal128(d, scale))
        }
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    const TRUE: [&str; 3] = ["true", "1", "yes"];
    const FALSE: [&str; 3] = ["false", "0", "no"];

    if TRUE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Ok(true)
    } else if FALSE.iter().any(|f| s.eq_ignore_ascii_case(f)) {
        Ok(false)
    } else {
        Err(format!("invalid bool {:?}", s))
    }
}

/// Days since 1970-01-01
fn parse_date(s: &str, format: Option<&str>) -> Result<i32, String> {
    let date = match format {
        Some(format) => jiff::fmt::strtime::parse(format, s)
            .and_then(|tm| tm.to_date())
            .map_err(|e| format!("invalid date {:?} for format {:?}: {}", s, format, e))?,
        None => s
            .parse::<Date>()
            .map_err(|e| format!("invalid date {:?}: {}", s, e))?,
    };

    let seconds = date
        .at(0, 0, 0, 0)
        .to_zoned(TimeZone::UTC)
        .map_err(|e| format!("date {:?} out of range: {}", s, e))?
        .timestamp()
        .as_second();
    i32::try_from(seconds.div_euclid(SECONDS_PER_DAY))
        .map_err(|_| format!("date {:?} out of range", s))
}

/// Microseconds since the epoch; values without an offset are taken as UTC
fn parse_timestamp_micros(s: &str, format: Option<&str>) -> Result<i64, String> {
    let timestamp = match format {
        Some(format) => {
            let tm = jiff::fmt::strtime::parse(format, s)
                .map_err(|e| format!("invalid timestamp {:?} for format {:?}: {}", s, format, e))?;
            match tm.to_timestamp() {
                Ok(ts) => ts,
                Err(_) => tm
                    .to_datetime()
                    .and_then(|dt| dt.to_zoned(TimeZone::UTC))
                    .map(|zoned| zoned.timestamp())
                    .map_err(|e| format!("invalid timestamp {:?}: {}", s, e))?,
            }
        }
        None => match s.parse::<Timestamp>() {
            Ok(ts) => ts,
            Err(_) => s
                .parse::<DateTime>()
                .and_then(|dt| dt.to_zoned(TimeZone::UTC))
                .map(|zoned| zoned.timestamp())
                .map_err(|e| format!("invalid timestamp {:?}: {}", s, e))?,
        },
    };
    Ok(timestamp.as_microsecond())
}

/// Unscaled decimal value; never rounds
fn parse_decimal(s: &str, precision: u8, scale: i8) -> Result<i128, String> {
    let (negative, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return Err(format!("invalid decimal {:?}", s));
    }

    let scale = scale.max(0) as usize;
    if frac_part.len() > scale {
        return Err(format!(
            "decimal {:?} has {} fractional digits, scale is {}",
            s,
            frac_part.len(),
            scale
        ));
    }
    let significant = int_part.trim_start_matches('0').len() + scale;
    if significant > precision as usize {
        return Err(format!(
            "decimal {:?} needs {} digits, precision is {}",
            s, significant, precision
        ));
    }

    let padding = std::iter::repeat(b'0').take(scale - frac_part.len());
    let mut unscaled: i128 = 0;
    for b in int_part.bytes().chain(frac_part.bytes()).chain(padding) {
        unscaled = unscaled
            .checked_mul(10)
            .and_then(|v| v.checked_add(i128::from(b - b'0')))
            .ok_or_else(|| format!("decimal {:?} overflows", s))?;
    }
    Ok(if negative { -unscaled } else { unscaled })
}
