//! Splitting one logical line into fields
//!
//! The tokenizer is a single left-to-right scan over the line's bytes with
//! one in-quotes flag. Quote characters toggle the flag, a doubled quote
//! inside a quoted section is a literal quote, and the delimiter only ends
//! a field outside quotes. Quotes spanning several physical lines are not
//! supported: the reader splits on line feeds before tokenizing.

use crate::dialect::{Dialect, DEFAULT_QUOTE};
use crate::error::QuoteError;

/// Row tokenizer bound to a dialect
#[derive(Debug, Clone, Default)]
pub struct RowTokenizer {
    dialect: Dialect,
}

impl RowTokenizer {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Split `line` into its fields
    pub fn tokenize(&self, line: &str) -> Result<Vec<String>, QuoteError> {
        split_fields(line, self.dialect.delimiter().as_str(), self.dialect.quote())
    }
}

/// Split `line` on `delimiter` using the default `"` quote character
///
/// An empty delimiter never matches, so the whole line becomes one field.
pub fn tokenize(line: &str, delimiter: &str) -> Result<Vec<String>, QuoteError> {
    split_fields(line, delimiter, DEFAULT_QUOTE as u8)
}

// `quote` is ASCII and the delimiter is a complete UTF-8 string, so every
// index where a segment starts or ends falls on a char boundary.
fn split_fields(line: &str, delimiter: &str, quote: u8) -> Result<Vec<String>, QuoteError> {
    let bytes = line.as_bytes();
    let delimiter = delimiter.as_bytes();

    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quote_start = 0;
    let mut segment_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == quote {
            field.push_str(&line[segment_start..i]);
            if in_quotes && bytes.get(i + 1) == Some(&quote) {
                field.push(quote as char);
                i += 2;
            } else {
                in_quotes = !in_quotes;
                if in_quotes {
                    quote_start = i;
                }
                i += 1;
            }
            segment_start = i;
        } else if !in_quotes && !delimiter.is_empty() && bytes[i..].starts_with(delimiter) {
            field.push_str(&line[segment_start..i]);
            fields.push(std::mem::take(&mut field));
            i += delimiter.len();
            segment_start = i;
        } else {
            i += 1;
        }
    }

    if in_quotes {
        return Err(QuoteError::Unterminated {
            offset: quote_start,
        });
    }

    field.push_str(&line[segment_start..]);
    fields.push(field);
    Ok(fields)
}
