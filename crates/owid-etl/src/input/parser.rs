//! CSV parser with delimiter detection and transparent gzip handling.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::source::{DataTable, SourceMetadata};
use crate::error::{EtlError, Result};
use crate::names::normalize_name;

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b',', b'\t', b';', b'|'];

/// Leading bytes of a gzip stream.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Rewrite headers through [`normalize_name`].
    pub normalize_headers: bool,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            normalize_headers: false,
            quote: b'"',
        }
    }
}

impl ParserConfig {
    /// Configuration that normalizes headers on load.
    pub fn normalized() -> Self {
        Self {
            normalize_headers: true,
            ..Self::default()
        }
    }
}

/// Parses delimited tabular files.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the data table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();
        let raw = fs::read(path).map_err(|e| EtlError::io(path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(&raw);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let compressed = is_gzip(&raw);
        let table = self.parse_bytes(&raw)?;
        debug!(
            file = %path.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            compressed,
            "parsed table"
        );

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            raw.len() as u64,
            compressed,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, metadata))
    }

    /// Parse raw bytes, decompressing first if they are gzip.
    pub fn parse_bytes(&self, raw: &[u8]) -> Result<DataTable> {
        if is_gzip(raw) {
            let mut decoded = Vec::new();
            GzDecoder::new(raw)
                .read_to_end(&mut decoded)
                .map_err(|e| EtlError::io("<gzip stream>", e))?;
            self.parse_plain(&decoded)
        } else {
            self.parse_plain(raw)
        }
    }

    fn parse_plain(&self, bytes: &[u8]) -> Result<DataTable> {
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(bytes)?,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| {
                let h = h.trim();
                if self.config.normalize_headers {
                    normalize_name(h)
                } else {
                    h.to_string()
                }
            })
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(EtlError::EmptyData("No columns found".to_string()));
        }

        let expected_cols = headers.len();
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            // Short rows are padded so every row indexes like the header.
            row.resize(expected_cols, String::new());
            rows.push(row);
        }

        Ok(DataTable::new(headers, rows))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true if the bytes start with the gzip magic number.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[..2] == GZIP_MAGIC
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(EtlError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        // Consistent counts across lines beat a high count on one line.
        let consistent = counts.iter().all(|&c| c == first_count);
        let score = if consistent {
            first_count * 1000
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}
