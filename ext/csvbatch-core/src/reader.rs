//! Core batch reading functionality
//!
//! A [`BatchReader`] pulls bytes from any [`std::io::Read`] source, splits
//! them into lines, commits the first non-blank line as the [`Header`] and
//! assembles the following lines into fixed-capacity [`Batch`]es. Every
//! failure is terminal for the call that hit it; a bad row invalidates the
//! whole batch instead of being skipped.

use crate::batch::{Batch, Header, Row};
use crate::dialect::{Delimiter, Dialect, DEFAULT_QUOTE};
use crate::error::{ReadError, ReadResult};
use crate::tokenizer::RowTokenizer;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::io::Read;

// Default configuration constants
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
const BYTE_ORDER_MARK: &str = "\u{FEFF}";

/// How many chunks a single `read_batch` call may pull
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// Exactly one read per call; nothing is carried over between calls.
    /// A short batch is always `PartialBatch`, since a read that produced
    /// bytes never confirms end of stream.
    #[default]
    SingleChunk,
    /// Unconsumed bytes are kept between calls and chunks are pulled until
    /// the batch is full or the source reports end of stream. A short batch
    /// at end of stream is returned as a normal final batch.
    Buffered,
}

/// Reader settings, loadable from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderOptions {
    pub delimiter: Delimiter,
    pub quote: char,
    pub chunk_size: usize,
    pub mode: ReadMode,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::default(),
            quote: DEFAULT_QUOTE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            mode: ReadMode::default(),
        }
    }
}

impl ReaderOptions {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

/// Builder for creating a configured BatchReader
#[derive(Debug, Clone, Default)]
pub struct BatchReaderBuilder {
    options: ReaderOptions,
}

impl BatchReaderBuilder {
    /// Create a new BatchReaderBuilder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all settings at once
    pub fn with_options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.options.delimiter = delimiter;
        self
    }

    /// Set the quote character
    pub fn with_quote(mut self, quote: char) -> Self {
        self.options.quote = quote;
        self
    }

    /// Set the number of bytes requested from the source per read
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.options.chunk_size = size;
        self
    }

    /// Choose between single-chunk and buffered reads
    pub fn with_mode(mut self, mode: ReadMode) -> Self {
        self.options.mode = mode;
        self
    }

    /// Build a BatchReader over `source` with the configured settings
    pub fn build<R: Read>(self, source: R) -> ReadResult<BatchReader<R>> {
        let ReaderOptions {
            delimiter,
            quote,
            chunk_size,
            mode,
        } = self.options;

        if chunk_size == 0 {
            return Err(ReadError::invalid_request("chunk size must be positive"));
        }
        let dialect = Dialect::new(delimiter, quote)
            .map_err(|e| ReadError::invalid_request(e.to_string()))?;

        Ok(BatchReader {
            source: Some(source),
            tokenizer: RowTokenizer::new(dialect),
            header: None,
            chunk_size,
            mode,
            pending: BytesMut::new(),
            end_of_stream: false,
            lines_consumed: 0,
            rows_read: 0,
        })
    }
}

/// Streaming reader turning delimited text into batches of string rows
///
/// The reader never closes its source. Pass a borrowed handle (`&mut File`,
/// `&[u8]`) or take it back with [`BatchReader::release`]. An instance must
/// not be shared between callers; use one reader per source.
pub struct BatchReader<R> {
    source: Option<R>,
    tokenizer: RowTokenizer,
    header: Option<Header>,
    chunk_size: usize,
    mode: ReadMode,
    // Only used in `ReadMode::Buffered`
    pending: BytesMut,
    end_of_stream: bool,
    lines_consumed: usize,
    rows_read: usize,
}

impl<R: Read> BatchReader<R> {
    /// Create a new reader with default settings (`;` delimiter, single-chunk reads)
    pub fn new(source: R) -> Self {
        Self {
            source: Some(source),
            tokenizer: RowTokenizer::default(),
            header: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            mode: ReadMode::default(),
            pending: BytesMut::new(),
            end_of_stream: false,
            lines_consumed: 0,
            rows_read: 0,
        }
    }

    /// The committed header, once the first non-blank line has been read
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Delimiter and quote character in use
    pub fn dialect(&self) -> &Dialect {
        self.tokenizer.dialect()
    }

    /// How the reader pulls bytes from its source
    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// Rows returned in successful batches so far
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Hand the source back to the caller
    ///
    /// Later reads fail with `InvalidRequest`. Bytes still buffered in
    /// `Buffered` mode are dropped.
    pub fn release(&mut self) -> Option<R> {
        self.pending.clear();
        self.source.take()
    }

    /// Read the next batch of at most `capacity` rows
    pub fn read_batch(&mut self, capacity: usize) -> ReadResult<Batch> {
        if capacity == 0 {
            return Err(ReadError::invalid_request("batch capacity must be positive"));
        }
        if self.source.is_none() {
            return Err(ReadError::invalid_request("source handle absent"));
        }

        let result = match self.mode {
            ReadMode::SingleChunk => self.read_single_chunk(capacity),
            ReadMode::Buffered => self.read_buffered(capacity),
        };

        match &result {
            Ok(batch) => {
                self.rows_read += batch.len();
                log::debug!("emitted batch of {} rows (capacity {})", batch.len(), capacity);
            }
            Err(e) => log::debug!("batch read failed: {}", e),
        }
        result
    }

    /// Iterate over batches of `capacity` rows until the source runs dry
    ///
    /// `NoData` ends the iteration; any other error is yielded once and
    /// then the iterator is exhausted.
    pub fn batches(&mut self, capacity: usize) -> Batches<'_, R> {
        Batches {
            reader: self,
            capacity,
            finished: false,
        }
    }

    fn read_single_chunk(&mut self, capacity: usize) -> ReadResult<Batch> {
        let mut chunk = vec![0u8; self.chunk_size];
        let n = self.read_source(&mut chunk)?;
        log::trace!("read chunk of {} bytes (end of stream: {})", n, n == 0);
        if n == 0 {
            return Err(ReadError::NoData);
        }
        chunk.truncate(n);

        let first_line = self.lines_consumed;
        let complete_lines = chunk.iter().filter(|&&b| b == b'\n').count();
        self.lines_consumed += complete_lines;

        let mut rows = Vec::with_capacity(capacity);
        for (idx, line) in chunk.split(|&b| b == b'\n').enumerate() {
            // The chunk may end inside a character; that tail is cut-off data.
            if idx == complete_lines && is_truncated_utf8(line) {
                break;
            }
            self.process_line(line, first_line + idx + 1, &mut rows)?;
            if rows.len() == capacity {
                break;
            }
        }

        // A read that produced bytes says nothing about what follows it.
        self.finish_batch(rows, capacity, false)
    }

    fn read_buffered(&mut self, capacity: usize) -> ReadResult<Batch> {
        let mut rows = Vec::with_capacity(capacity);

        while rows.len() < capacity {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let line = self.pending.split_to(pos + 1);
                self.lines_consumed += 1;
                self.process_line(&line[..pos], self.lines_consumed, &mut rows)?;
                continue;
            }

            if self.end_of_stream {
                if !self.pending.is_empty() {
                    let line = self.pending.split();
                    self.lines_consumed += 1;
                    self.process_line(&line, self.lines_consumed, &mut rows)?;
                }
                break;
            }

            self.fill_pending()?;
        }

        self.finish_batch(rows, capacity, self.end_of_stream)
    }

    /// Append one chunk from the source to the carry-over buffer
    fn fill_pending(&mut self) -> ReadResult<()> {
        let mut chunk = BytesMut::zeroed(self.chunk_size);
        let n = self.read_source(&mut chunk)?;
        self.pending.extend_from_slice(&chunk[..n]);

        log::trace!("read chunk of {} bytes (end of stream: {})", n, n == 0);
        if n == 0 {
            self.end_of_stream = true;
        }
        Ok(())
    }

    fn read_source(&mut self, buf: &mut [u8]) -> ReadResult<usize> {
        let source = self
            .source
            .as_mut()
            .ok_or_else(|| ReadError::invalid_request("source handle absent"))?;
        Ok(source.read(buf)?)
    }

    /// Handle one physical line: skip it, commit it as the header, or add it as a row
    fn process_line(&mut self, raw: &[u8], line: usize, rows: &mut Vec<Row>) -> ReadResult<()> {
        let text = std::str::from_utf8(raw).map_err(|source| ReadError::Encoding { line, source })?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        match &self.header {
            None => {
                let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
                let names = self
                    .tokenizer
                    .tokenize(text)
                    .map_err(|source| ReadError::MalformedRow { line, source })?;
                if names.len() == 1 {
                    return Err(ReadError::UnsupportedSeparator {
                        delimiter: self.tokenizer.dialect().delimiter().to_string(),
                    });
                }
                log::debug!("committed header with {} columns at line {}", names.len(), line);
                self.header = Some(Header::new(names));
            }
            Some(header) => {
                let fields = self
                    .tokenizer
                    .tokenize(text)
                    .map_err(|source| ReadError::MalformedRow { line, source })?;
                if fields.len() != header.len() {
                    return Err(ReadError::ShapeMismatch {
                        line,
                        expected: header.len(),
                        found: fields.len(),
                    });
                }
                rows.push(fields);
            }
        }
        Ok(())
    }

    fn finish_batch(
        &self,
        rows: Vec<Row>,
        capacity: usize,
        end_of_stream: bool,
    ) -> ReadResult<Batch> {
        if self.header.is_none() || rows.is_empty() {
            return Err(ReadError::NoData);
        }
        if rows.len() < capacity && !end_of_stream {
            return Err(ReadError::PartialBatch {
                rows: rows.len(),
                capacity,
            });
        }
        Ok(Batch::new(rows))
    }
}

/// True when `bytes` is valid UTF-8 apart from an incomplete final character
fn is_truncated_utf8(bytes: &[u8]) -> bool {
    matches!(std::str::from_utf8(bytes), Err(e) if e.error_len().is_none())
}

/// Iterator over the batches of a [`BatchReader`]
pub struct Batches<'a, R> {
    reader: &'a mut BatchReader<R>,
    capacity: usize,
    finished: bool,
}

impl<R: Read> Iterator for Batches<'_, R> {
    type Item = ReadResult<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.reader.read_batch(self.capacity) {
            Ok(batch) => Some(Ok(batch)),
            Err(ReadError::NoData) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for Batches<'_, R> {}
