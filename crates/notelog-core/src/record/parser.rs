//! Index line parser.
//!
//! Parses the space-separated index format into [`Record`]s:
//!
//! ```text
//! <offset> <size>[:<sizeInFile>] <timestampMs> <kind>[ <meta>]
//! ```
//!
//! - Blank/whitespace-only lines are skipped by [`parse_index`].
//! - The meta field is the remainder of the line after the kind and may
//!   contain spaces.
//! - Kind tokens unknown to this build parse as [`RecordKind::Unknown`];
//!   rejecting them is left to the validator and the merge engine.
//! - `sizeInFile < size` is accepted here and reported by the validator.

use std::fmt;

use super::{Record, RecordKind};
use crate::error::ErrorCode;

/// Errors that can occur while parsing a single index line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Fewer than the four mandatory space-separated fields.
    FieldCount {
        /// Number of fields found.
        found: usize,
    },
    /// The offset field is not a valid u64.
    InvalidOffset(String),
    /// The size field (before any `:`) is not a valid u64.
    InvalidSize(String),
    /// The capacity after `size:` is not a valid u64.
    InvalidSizeInFile(String),
    /// The timestamp field is not a valid i64.
    InvalidTimestamp(String),
    /// The kind field is empty or malformed.
    InvalidKind(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldCount { found } => {
                write!(f, "expected at least 4 space-separated fields, found {found}")
            }
            Self::InvalidOffset(raw) => write!(f, "invalid offset (not u64): '{raw}'"),
            Self::InvalidSize(raw) => write!(f, "invalid size (not u64): '{raw}'"),
            Self::InvalidSizeInFile(raw) => write!(f, "invalid sizeInFile (not u64): '{raw}'"),
            Self::InvalidTimestamp(raw) => write!(f, "invalid timestamp (not i64): '{raw}'"),
            Self::InvalidKind(raw) => write!(f, "invalid kind: '{raw}'"),
        }
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::MalformedIndex
    }
}

/// A [`ParseError`] located in a multi-line index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("index line {line_num}: {source} (line: '{line}')")]
pub struct IndexError {
    /// 1-based line number.
    pub line_num: usize,
    /// The offending line, truncated to 256 bytes.
    pub line: String,
    #[source]
    pub source: ParseError,
}

impl IndexError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::MalformedIndex
    }
}

/// Parse the size field: `<size>` or `<size>:<sizeInFile>`.
fn parse_size_field(raw: &str) -> Result<(u64, Option<u64>), ParseError> {
    match raw.split_once(':') {
        Some((size, cap)) => {
            let size = size
                .parse()
                .map_err(|_| ParseError::InvalidSize(raw.to_string()))?;
            let cap = cap
                .parse()
                .map_err(|_| ParseError::InvalidSizeInFile(raw.to_string()))?;
            Ok((size, Some(cap)))
        }
        None => {
            let size = raw
                .parse()
                .map_err(|_| ParseError::InvalidSize(raw.to_string()))?;
            Ok((size, None))
        }
    }
}

/// Parse one index line into a [`Record`].
///
/// A trailing `\n` / `\r\n` is tolerated. The returned record always has
/// `overwritten == false`; see [`super::mark_overwritten`].
///
/// # Errors
///
/// Returns [`ParseError`] naming the first malformed field.
pub fn parse_index_line(line: &str) -> Result<Record, ParseError> {
    let trimmed = line.trim_end_matches('\n').trim_end_matches('\r');
    let fields: Vec<&str> = trimmed.splitn(5, ' ').collect();
    if fields.len() < 4 {
        return Err(ParseError::FieldCount {
            found: fields.len(),
        });
    }

    let offset: u64 = fields[0]
        .parse()
        .map_err(|_| ParseError::InvalidOffset(fields[0].to_string()))?;
    let (size, size_in_file) = parse_size_field(fields[1])?;
    let timestamp_ms: i64 = fields[2]
        .parse()
        .map_err(|_| ParseError::InvalidTimestamp(fields[2].to_string()))?;
    let kind: RecordKind = fields[3]
        .parse()
        .map_err(|_| ParseError::InvalidKind(fields[3].to_string()))?;
    let meta = fields.get(4).copied().unwrap_or_default();

    Ok(Record {
        offset,
        size,
        size_in_file,
        timestamp_ms,
        kind,
        meta: meta.to_string(),
        overwritten: false,
    })
}

fn truncate_line(line: &str) -> String {
    const MAX: usize = 256;
    if line.len() <= MAX {
        return line.to_string();
    }
    let mut end = MAX;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &line[..end])
}

/// Parse a whole index text, skipping blank lines.
///
/// # Errors
///
/// Returns [`IndexError`] for the first malformed line.
pub fn parse_index(text: &str) -> Result<Vec<Record>, IndexError> {
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let rec = parse_index_line(line).map_err(|source| IndexError {
            line_num: idx + 1,
            line: truncate_line(line),
            source,
        })?;
        records.push(rec);
    }
    Ok(records)
}
