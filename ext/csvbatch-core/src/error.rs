use thiserror::Error;

/// Failure of the row tokenizer on a single line
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteError {
    /// A quoted field was opened but never closed before the end of the line
    #[error("unterminated quoted field starting at byte {offset}")]
    Unterminated { offset: usize },
}

/// Core error type for batch reading
#[derive(Error, Debug)]
pub enum ReadError {
    /// The call itself was invalid; no I/O was attempted
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Nothing left to read: empty or exhausted source, or only blank lines
    #[error("No data")]
    NoData,

    /// The header split into a single field under the configured delimiter
    #[error("Unsupported separator: header does not split on {delimiter:?}")]
    UnsupportedSeparator { delimiter: String },

    /// A line has unbalanced quoting
    #[error("Malformed row at line {line}: {source}")]
    MalformedRow {
        line: usize,
        #[source]
        source: QuoteError,
    },

    /// A data row has a different field count than the header
    #[error("Shape mismatch at line {line}: expected {expected} fields, found {found}")]
    ShapeMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Fewer rows than requested without a confirmed end of stream
    #[error("Partial batch: {rows} of {capacity} rows read before end of stream was confirmed")]
    PartialBatch { rows: usize, capacity: usize },

    /// A line is not valid UTF-8
    #[error("Invalid UTF-8 at line {line}: {source}")]
    Encoding {
        line: usize,
        #[source]
        source: std::str::Utf8Error,
    },

    /// IO errors from the byte source, passed through unclassified
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fieldless mirror of [`ReadError`] for branching on the failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadErrorKind {
    InvalidRequest,
    NoData,
    UnsupportedSeparator,
    MalformedRow,
    ShapeMismatch,
    PartialBatch,
    Encoding,
    Io,
}

/// Result type alias for batch reading
pub type ReadResult<T> = std::result::Result<T, ReadError>;

impl ReadError {
    /// Create a new invalid request error
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        ReadError::InvalidRequest(msg.into())
    }

    pub fn kind(&self) -> ReadErrorKind {
        match self {
            ReadError::InvalidRequest(_) => ReadErrorKind::InvalidRequest,
            ReadError::NoData => ReadErrorKind::NoData,
            ReadError::UnsupportedSeparator { .. } => ReadErrorKind::UnsupportedSeparator,
            ReadError::MalformedRow { .. } => ReadErrorKind::MalformedRow,
            ReadError::ShapeMismatch { .. } => ReadErrorKind::ShapeMismatch,
            ReadError::PartialBatch { .. } => ReadErrorKind::PartialBatch,
            ReadError::Encoding { .. } => ReadErrorKind::Encoding,
            ReadError::Io(_) => ReadErrorKind::Io,
        }
    }
}

/// Error type for schema definitions and typed conversion
#[derive(Error, Debug)]
pub enum SchemaError {
    /// IO errors while loading a definition
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML syntax or shape errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON syntax or shape errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Arrow errors from array or batch construction
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// The definition parsed but is not a valid schema
    #[error("Invalid schema definition: {0}")]
    Definition(String),

    /// A type or format this crate does not handle
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// A schema field has no matching header column
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A field value could not be coerced to its declared type
    #[error("Conversion error at row {row}, column {column:?}: {message}")]
    Conversion {
        row: usize,
        column: String,
        message: String,
    },

    /// A typed value does not fit the Arrow column it is written to
    #[error("Type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Another error with context attached
    #[error("{0}")]
    Context(String),
}

/// Result type alias for schema operations
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

impl SchemaError {
    /// Create a new definition error
    pub fn definition<S: Into<String>>(msg: S) -> Self {
        SchemaError::Definition(msg.into())
    }

    /// Create a new unsupported error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        SchemaError::Unsupported(msg.into())
    }

    /// Create a new conversion error
    pub fn conversion<C: Into<String>, S: Into<String>>(row: usize, column: C, msg: S) -> Self {
        SchemaError::Conversion {
            row,
            column: column.into(),
            message: msg.into(),
        }
    }
}

/// Extension trait to add context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, ctx: S) -> SchemaResult<T>;

    /// Add context with a closure that's only called on error
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> SchemaResult<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<SchemaError>,
{
    fn context<S: Into<String>>(self, ctx: S) -> SchemaResult<T> {
        self.map_err(|e| {
            let base_error = e.into();
            SchemaError::Context(format!("{}: {}", ctx.into(), base_error))
        })
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, f: F) -> SchemaResult<T> {
        self.map_err(|e| {
            let base_error = e.into();
            SchemaError::Context(format!("{}: {}", f().into(), base_error))
        })
    }
}
