//! Schema definitions for typed conversion of string batches
//!
//! A definition lists the fields a caller expects, with a type per field.
//! Definitions are loaded from TOML or JSON and validated up front, so the
//! converter never sees an inconsistent schema.

use crate::error::{ErrorContext, SchemaError, SchemaResult};
use arrow_schema::{DataType, Field, Schema, SchemaRef, TimeUnit, DECIMAL128_MAX_PRECISION};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

pub const MAX_FIELDS: usize = 1024;
pub const MAX_FIELD_NAME_LEN: usize = 255;

/// Column types a schema definition may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    String,
    Date,
    Timestamp,
    Decimal { precision: u8, scale: i8 },
    Bytes,
}

impl FieldType {
    /// Name used in definition files
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Float32 => "float32",
            FieldType::Float64 => "float64",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Date => "date",
            FieldType::Timestamp => "timestamp",
            FieldType::Decimal { .. } => "decimal",
            FieldType::Bytes => "bytes",
        }
    }

    /// Whether a `format` option applies to this type
    pub fn accepts_format(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::Timestamp)
    }

    pub fn to_arrow(&self) -> DataType {
        match self {
            FieldType::Int32 => DataType::Int32,
            FieldType::Int64 => DataType::Int64,
            FieldType::Float32 => DataType::Float32,
            FieldType::Float64 => DataType::Float64,
            FieldType::Bool => DataType::Boolean,
            FieldType::String => DataType::Utf8,
            FieldType::Date => DataType::Date32,
            FieldType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            FieldType::Decimal { precision, scale } => DataType::Decimal128(*precision, *scale),
            FieldType::Bytes => DataType::Binary,
        }
    }
}

/// One validated field of a schema definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
    /// strftime-style pattern for `date` and `timestamp` fields
    pub format: Option<String>,
}

impl FieldSpec {
    pub fn new<S: Into<String>>(name: S, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
            format: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn to_arrow_field(&self) -> Field {
        Field::new(&self.name, self.field_type.to_arrow(), self.nullable)
    }
}

/// A validated, ordered set of fields
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDefinition {
    fields: IndexMap<String, FieldSpec>,
}

impl SchemaDefinition {
    /// Validate `fields` into a definition
    pub fn new(fields: Vec<FieldSpec>) -> SchemaResult<Self> {
        if fields.is_empty() {
            return Err(SchemaError::definition("schema must have at least one field"));
        }
        if fields.len() > MAX_FIELDS {
            return Err(SchemaError::definition(format!(
                "schema has {} fields, the limit is {}",
                fields.len(),
                MAX_FIELDS
            )));
        }

        let mut by_name = IndexMap::with_capacity(fields.len());
        for field in fields {
            validate_field(&field)?;
            if by_name.contains_key(&field.name) {
                return Err(SchemaError::definition(format!(
                    "duplicate field name: {}",
                    field.name
                )));
            }
            by_name.insert(field.name.clone(), field);
        }

        Ok(Self { fields: by_name })
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Parse a TOML definition (`[[fields]]` tables)
    pub fn from_toml_str(s: &str) -> SchemaResult<Self> {
        let raw: RawDefinition = toml::from_str(s)?;
        raw.into_definition()
    }

    /// Parse a JSON definition (`{"fields": [...]}`)
    pub fn from_json_str(s: &str) -> SchemaResult<Self> {
        let raw: RawDefinition = serde_json::from_str(s)?;
        raw.into_definition()
    }

    /// Load a definition file; the extension selects TOML or JSON
    pub fn from_path<P: AsRef<Path>>(path: P) -> SchemaResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Reading schema definition {}", path.display()))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&contents),
            Some("json") => Self::from_json_str(&contents),
            other => Err(SchemaError::unsupported(format!(
                "schema definition extension {:?}",
                other.unwrap_or("")
            ))),
        }
        .with_context(|| format!("Loading schema definition {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Arrow schema with one field per definition field, in order
    pub fn to_arrow_schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self.fields().map(FieldSpec::to_arrow_field).collect();
        Arc::new(Schema::new(fields))
    }
}

/// Builder for creating schema definitions in code
pub struct SchemaBuilder {
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> SchemaResult<SchemaDefinition> {
        SchemaDefinition::new(self.fields)
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_field(field: &FieldSpec) -> SchemaResult<()> {
    if field.name.trim().is_empty() {
        return Err(SchemaError::definition("field name required"));
    }
    if field.name.len() > MAX_FIELD_NAME_LEN {
        return Err(SchemaError::definition(format!(
            "field name is {} bytes long, the limit is {}",
            field.name.len(),
            MAX_FIELD_NAME_LEN
        )));
    }

    if let FieldType::Decimal { precision, scale } = field.field_type {
        if precision == 0 || precision > DECIMAL128_MAX_PRECISION {
            return Err(SchemaError::definition(format!(
                "field {}: decimal precision must be between 1 and {}",
                field.name, DECIMAL128_MAX_PRECISION
            )));
        }
        if scale < 0 || scale as u8 > precision {
            return Err(SchemaError::definition(format!(
                "field {}: decimal scale must be between 0 and the precision ({})",
                field.name, precision
            )));
        }
    }

    if let Some(format) = &field.format {
        if !field.field_type.accepts_format() {
            return Err(SchemaError::definition(format!(
                "field {}: format is not supported for type {}",
                field.name,
                field.field_type.name()
            )));
        }
        validate_format(&field.name, format)?;
    }

    Ok(())
}

fn validate_format(name: &str, format: &str) -> SchemaResult<()> {
    if !format.contains('%') {
        return Err(SchemaError::definition(format!(
            "field {}: format {:?} has no % directive",
            name, format
        )));
    }

    let sample = jiff::civil::date(2000, 1, 2)
        .at(3, 4, 5, 0)
        .to_zoned(jiff::tz::TimeZone::UTC)
        .map_err(|e| SchemaError::definition(e.to_string()))?;
    jiff::fmt::strtime::format(format, &sample).map_err(|e| {
        SchemaError::definition(format!("field {}: invalid format {:?}: {}", name, format, e))
    })?;
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDefinition {
    fields: Vec<RawField>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    name: Option<String>,
    #[serde(rename = "type")]
    field_type: Option<String>,
    nullable: Option<bool>,
    precision: Option<i64>,
    scale: Option<i64>,
    format: Option<String>,
}

impl RawDefinition {
    fn into_definition(self) -> SchemaResult<SchemaDefinition> {
        let fields = self
            .fields
            .into_iter()
            .map(RawField::into_spec)
            .collect::<SchemaResult<Vec<_>>>()?;
        SchemaDefinition::new(fields)
    }
}

impl RawField {
    fn into_spec(self) -> SchemaResult<FieldSpec> {
        let name = self
            .name
            .ok_or_else(|| SchemaError::definition("field name required"))?;
        let type_name = self
            .field_type
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SchemaError::definition(format!("field {}: type required", name)))?;

        let field_type = match type_name.as_str() {
            "int32" => FieldType::Int32,
            "int64" => FieldType::Int64,
            "float32" => FieldType::Float32,
            "float64" => FieldType::Float64,
            "bool" => FieldType::Bool,
            "string" => FieldType::String,
            "date" => FieldType::Date,
            "timestamp" => FieldType::Timestamp,
            "bytes" => FieldType::Bytes,
            "decimal" => decimal_type(&name, self.precision, self.scale)?,
            other => {
                return Err(SchemaError::unsupported(format!(
                    "field {}: type {}",
                    name, other
                )))
            }
        };

        if !matches!(field_type, FieldType::Decimal { .. })
            && (self.precision.is_some() || self.scale.is_some())
        {
            return Err(SchemaError::definition(format!(
                "field {}: precision and scale only apply to decimal fields",
                name
            )));
        }

        Ok(FieldSpec {
            name,
            field_type,
            nullable: self.nullable.unwrap_or(false),
            format: self.format,
        })
    }
}

fn decimal_type(name: &str, precision: Option<i64>, scale: Option<i64>) -> SchemaResult<FieldType> {
    let precision = precision
        .ok_or_else(|| SchemaError::definition(format!("field {}: decimal requires precision", name)))?;
    let scale = scale.unwrap_or(0);

    let precision = u8::try_from(precision).map_err(|_| {
        SchemaError::definition(format!("field {}: invalid decimal precision {}", name, precision))
    })?;
    let scale = i8::try_from(scale).map_err(|_| {
        SchemaError::definition(format!("field {}: invalid decimal scale {}", name, scale))
    })?;
    Ok(FieldType::Decimal { precision, scale })
}
