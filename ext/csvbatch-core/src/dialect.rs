//! Delimiter and quote configuration shared by the tokenizer and reader

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_QUOTE: char = '"';

/// Reasons a delimiter or dialect is rejected at construction time
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialectError {
    #[error("delimiter must not be empty")]
    EmptyDelimiter,

    #[error("delimiter {0:?} must not contain a line break")]
    LineBreakInDelimiter(String),

    #[error("delimiter {delimiter:?} must not contain the quote character {quote:?}")]
    QuoteInDelimiter { delimiter: String, quote: char },

    #[error("quote character {0:?} must be ASCII and not a line break")]
    InvalidQuote(char),
}

/// Field-separating string; may be longer than one character
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Delimiter(String);

impl Delimiter {
    pub fn new<S: Into<String>>(delimiter: S) -> Result<Self, DialectError> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(DialectError::EmptyDelimiter);
        }
        if delimiter.contains(['\n', '\r']) {
            return Err(DialectError::LineBreakInDelimiter(delimiter));
        }
        Ok(Self(delimiter))
    }

    pub fn semicolon() -> Self {
        Self(";".to_string())
    }

    pub fn comma() -> Self {
        Self(",".to_string())
    }

    pub fn tab() -> Self {
        Self("\t".to_string())
    }

    pub fn pipe() -> Self {
        Self("|".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::semicolon()
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Delimiter {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Delimiter {
    type Error = DialectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Delimiter> for String {
    fn from(value: Delimiter) -> Self {
        value.0
    }
}

/// A validated delimiter/quote pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    delimiter: Delimiter,
    quote: u8,
}

impl Dialect {
    pub fn new(delimiter: Delimiter, quote: char) -> Result<Self, DialectError> {
        if !quote.is_ascii() || quote == '\n' || quote == '\r' {
            return Err(DialectError::InvalidQuote(quote));
        }
        if delimiter.as_str().contains(quote) {
            return Err(DialectError::QuoteInDelimiter {
                delimiter: delimiter.0,
                quote,
            });
        }
        Ok(Self {
            delimiter,
            quote: quote as u8,
        })
    }

    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }

    /// The quote character as its single ASCII byte
    pub fn quote(&self) -> u8 {
        self.quote
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::default(),
            quote: DEFAULT_QUOTE as u8,
        }
    }
}
