use bytes::Bytes;
use std::sync::Arc;

/// A single field coerced to its declared schema type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    // Numeric types
    Int32(i32),
    Int64(i64),
    Float32(ordered_float::OrderedFloat<f32>),
    Float64(ordered_float::OrderedFloat<f64>),

    // Basic types
    Boolean(bool),
    String(Arc<str>),
    Bytes(Bytes),

    // Days since epoch
    Date32(i32),

    // Microseconds since epoch, UTC
    TimestampMicros(i64),

    // Unscaled value, scale
    Decimal128(i128, i8),

    Null,
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Int32(i) => i.hash(state),
            CellValue::Int64(i) => i.hash(state),
            CellValue::Float32(f) => f.hash(state),
            CellValue::Float64(f) => f.hash(state),
            CellValue::Boolean(b) => b.hash(state),
            CellValue::String(s) => s.hash(state),
            CellValue::Bytes(b) => b.hash(state),
            CellValue::Date32(d) => d.hash(state),
            CellValue::TimestampMicros(ts) => ts.hash(state),
            CellValue::Decimal128(d, scale) => {
                d.hash(state);
                scale.hash(state);
            }
            CellValue::Null => 0_i32.hash(state),
        }
    }
}

impl CellValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Get the type name of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Int32(_) => "Int32",
            CellValue::Int64(_) => "Int64",
            CellValue::Float32(_) => "Float32",
            CellValue::Float64(_) => "Float64",
            CellValue::Boolean(_) => "Boolean",
            CellValue::String(_) => "String",
            CellValue::Bytes(_) => "Bytes",
            CellValue::Date32(_) => "Date32",
            CellValue::TimestampMicros(_) => "TimestampMicros",
            CellValue::Decimal128(_, _) => "Decimal128",
            CellValue::Null => "Null",
        }
    }
}
