//! Index line writer.
//!
//! The inverse of [`super::parser`]. Guarantees:
//!
//! - One line per record; the meta never contains a newline.
//! - `sizeInFile` is written as `size:sizeInFile` only when present.
//! - A record without meta is written without the trailing meta field.
//! - `overwritten` is never written; it is derived on load.

use super::Record;

/// Errors that can occur while writing an index line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    #[error("meta contains a newline; one-line invariant violated: '{0}'")]
    NewlineInMeta(String),

    #[error("kind token '{0}' is empty or contains whitespace")]
    InvalidKind(String),
}

/// Check that `kind` and `meta` can be encoded on a single index line.
///
/// # Errors
///
/// Returns [`WriteError`] on a newline in `meta` or a malformed kind token.
pub fn check_kind_and_meta(kind: &str, meta: &str) -> Result<(), WriteError> {
    if kind.is_empty() || kind.chars().any(char::is_whitespace) {
        return Err(WriteError::InvalidKind(kind.to_string()));
    }
    if meta.contains('\n') || meta.contains('\r') {
        return Err(WriteError::NewlineInMeta(meta.to_string()));
    }
    Ok(())
}

/// Serialize a record to one index line, without the trailing newline.
///
/// # Errors
///
/// See [`check_kind_and_meta`].
pub fn format_index_line(rec: &Record) -> Result<String, WriteError> {
    check_kind_and_meta(rec.kind.as_str(), &rec.meta)?;

    let size = match rec.size_in_file {
        Some(cap) => format!("{}:{cap}", rec.size),
        None => rec.size.to_string(),
    };
    let mut line = format!("{} {size} {} {}", rec.offset, rec.timestamp_ms, rec.kind);
    if !rec.meta.is_empty() {
        line.push(' ');
        line.push_str(&rec.meta);
    }
    Ok(line)
}

/// Serialize a record list to index text, one newline-terminated line each.
///
/// # Errors
///
/// Returns the first [`WriteError`] encountered.
pub fn write_index(records: &[Record]) -> Result<String, WriteError> {
    let mut out = String::new();
    for rec in records {
        out.push_str(&format_index_line(rec)?);
        out.push('\n');
    }
    Ok(out)
}
