//! Record model for the notelog append-only log.
//!
//! A [`Record`] is one immutable line of the index file plus the byte range
//! of its content in the data file. Records are never edited after they are
//! written; the single exception is the `overwritten` flag of `write-file`
//! records, which is derived from the log rather than stored in it.
//!
//! # Index line format
//!
//! ```text
//! <offset> <size>[:<sizeInFile>] <timestampMs> <kind>[ <meta>]
//! ```
//!
//! Parsing and writing index lines live in [`parser`] and [`writer`].

pub mod kind;
pub mod meta;
pub mod parser;
pub mod writer;

pub use kind::{InvalidKindToken, RecordKind};
pub use meta::{
    ContentMeta, CreateMeta, MetaError, NoteMeta, WriteFileMeta, new_note_id, new_version_id,
    note_id_from_version_id, rename_note_meta,
};
pub use parser::{IndexError, ParseError, parse_index, parse_index_line};
pub use writer::{WriteError, check_kind_and_meta, format_index_line, write_index};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One immutable entry of the record log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Byte offset of the content in the data file (0 when there is none).
    pub offset: u64,
    /// Content length in bytes.
    pub size: u64,
    /// Allocated capacity for overwritable records. Always `>= size`.
    pub size_in_file: Option<u64>,
    /// Event time in epoch milliseconds. Preserved verbatim across merges.
    pub timestamp_ms: i64,
    pub kind: RecordKind,
    /// Kind-dependent payload; empty when the line has no meta.
    pub meta: String,
    /// Set when a later `write-file` record with the same meta superseded
    /// this one. Derived on load, never written to the index.
    #[serde(default)]
    pub overwritten: bool,
}

impl Record {
    /// A record with no content bytes.
    #[must_use]
    pub fn new(kind: RecordKind, meta: impl Into<String>, timestamp_ms: i64) -> Self {
        Self {
            offset: 0,
            size: 0,
            size_in_file: None,
            timestamp_ms,
            kind,
            meta: meta.into(),
            overwritten: false,
        }
    }

    /// Bytes reserved in the data file for this record.
    #[must_use]
    pub fn effective_size(&self) -> u64 {
        self.size_in_file.unwrap_or(self.size)
    }

    /// End of the reserved data range, or `None` on `u64` overflow.
    #[must_use]
    pub fn reserved_end(&self) -> Option<u64> {
        self.offset.checked_add(self.effective_size())
    }

    /// End of the content range, or `None` on `u64` overflow.
    #[must_use]
    pub fn content_end(&self) -> Option<u64> {
        self.offset.checked_add(self.size)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset={} size={}", self.offset, self.size)?;
        if let Some(cap) = self.size_in_file {
            write!(f, " sizeInFile={cap}")?;
        }
        write!(f, " ts={} kind={} meta='{}'", self.timestamp_ms, self.kind, self.meta)?;
        if self.overwritten {
            f.write_str(" (overwritten)")?;
        }
        Ok(())
    }
}

/// Recompute the `overwritten` flag over a full record list.
///
/// A `write-file` record is overwritten iff a later `write-file` record
/// carries the same meta. Flags on other kinds are left untouched so that a
/// corrupted list still reaches the validator as-is.
pub fn mark_overwritten(records: &mut [Record]) {
    let mut latest: HashMap<String, usize> = HashMap::new();
    for (idx, rec) in records.iter().enumerate() {
        if rec.kind == RecordKind::WriteFile {
            latest.insert(rec.meta.clone(), idx);
        }
    }
    for (idx, rec) in records.iter_mut().enumerate() {
        if rec.kind == RecordKind::WriteFile {
            rec.overwritten = latest.get(&rec.meta).is_some_and(|&last| last != idx);
        }
    }
}
