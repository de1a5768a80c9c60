//! Streaming batch reader for delimited text
//!
//! `csvbatch-core` reads a delimited text stream (semicolon-separated by
//! default) from any [`std::io::Read`] source in fixed-size batches of
//! rows, with a header row committed once per stream. It also converts
//! those string batches into typed Arrow record batches.
//!
//! # Key Components
//!
//! - **Tokenizer**: Splits one line into fields
//!   - Quote-aware, with doubled quotes as the escape
//!   - Multi-character delimiters
//!
//! - **Reader**: Pull-based batch reader through [`reader::BatchReader`]
//!   - Byte-order-mark stripping and blank-line tolerance
//!   - `SingleChunk` mode: one `read` per batch
//!   - `Buffered` mode: carries partial lines across calls
//!
//! - **Schema**: Typed field definitions loaded from TOML or JSON
//!   - Validated up front, mapped to an Arrow schema
//!
//! - **Converter**: String batches to Arrow [`arrow_array::RecordBatch`]es
//!   through [`converter::BatchConverter`]
//!
//! # Example Usage
//!
//! ```
//! use csvbatch_core::BatchReader;
//!
//! let data = "id;name\n1;Alice\n2;Bob\n";
//! let mut reader = BatchReader::new(data.as_bytes());
//! let batch = reader.read_batch(2).unwrap();
//!
//! assert_eq!(reader.header().unwrap().names(), ["id", "name"]);
//! assert_eq!(batch[1], ["2", "Bob"]);
//! ```

pub mod arrow_conversion;
pub mod batch;
pub mod converter;
pub mod dialect;
pub mod error;
pub mod reader;
pub mod schema;
pub mod tokenizer;
pub mod value;

#[cfg(test)]
pub mod test_utils;

pub use batch::{Batch, Header, Row};
pub use converter::BatchConverter;
pub use dialect::{Delimiter, Dialect, DialectError};
pub use error::{
    ErrorContext, QuoteError, ReadError, ReadErrorKind, ReadResult, SchemaError, SchemaResult,
};
pub use reader::{BatchReader, BatchReaderBuilder, Batches, ReadMode, ReaderOptions};
pub use schema::{FieldSpec, FieldType, SchemaBuilder, SchemaDefinition};
pub use tokenizer::{tokenize, RowTokenizer};
pub use value::CellValue;
