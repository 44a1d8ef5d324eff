//! Structural validation of a stored record log.
//!
//! The validator is independent of the projector: it re-derives the
//! invariants a stored log must satisfy without building note state, so it
//! also catches storage-layer corruption the projector never looks at.
//!
//! Checked for every record, in storage order:
//!
//! 1. `sizeInFile >= size` when `sizeInFile` is present.
//! 2. `offset + effectiveSize <= dataSize` (no `u64` overflow either).
//! 3. `overwritten` only on `write-file` records.
//! 4. Per kind:
//!    - `note-create`: id never created before in this log.
//!    - `note-meta`, `note-delete`, `put`, `put-encrypted`: id created
//!      and not yet deleted.
//!    - `write-file`: no note checks.
//!    - unknown kind: always a violation.
//!
//! The first violation is returned together with the rendering of the
//! offending record.

use std::collections::HashSet;
use std::fmt;

use crate::error::ErrorCode;
use crate::record::{ContentMeta, CreateMeta, MetaError, NoteMeta, Record, RecordKind};
use crate::store::RecordStore;

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// `sizeInFile < size`.
    CapacityBelowSize,
    /// The reserved byte range extends past the end of the data file.
    OutOfBounds,
    /// `overwritten` set on a kind other than `write-file`.
    IllegalOverwrite,
    /// Second `note-create` for an id.
    DuplicateCreate,
    /// Mutation of a note that was never created or is already deleted.
    MissingNote,
    /// The meta string does not decode for the record's kind.
    InvalidMeta,
    /// Kind token unknown to this build.
    UnknownKind,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CapacityBelowSize => "capacity_below_size",
            Self::OutOfBounds => "out_of_bounds",
            Self::IllegalOverwrite => "illegal_overwrite",
            Self::DuplicateCreate => "duplicate_create",
            Self::MissingNote => "missing_note",
            Self::InvalidMeta => "invalid_meta",
            Self::UnknownKind => "unknown_kind",
        };
        f.write_str(s)
    }
}

/// A structural violation found by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("record {index} ({kind}): {message} [{record}]")]
pub struct ValidationError {
    /// 0-based position in the log.
    pub index: usize,
    pub kind: ValidationErrorKind,
    pub message: String,
    /// Human-readable rendering of the offending record.
    pub record: String,
}

impl ValidationError {
    fn new(index: usize, rec: &Record, kind: ValidationErrorKind, message: String) -> Self {
        Self {
            index,
            kind,
            message,
            record: rec.to_string(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self.kind {
            ValidationErrorKind::UnknownKind => ErrorCode::UnknownRecordKind,
            ValidationErrorKind::InvalidMeta => ErrorCode::InvalidMeta,
            _ => ErrorCode::InconsistentLog,
        }
    }
}

/// Validate every record of `store`.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate<S: RecordStore + ?Sized>(store: &S) -> Result<(), ValidationError> {
    validate_records(store.records(), store.data_size())
}

/// Validate `records` against a data file of `data_size` bytes.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_records(records: &[Record], data_size: u64) -> Result<(), ValidationError> {
    let mut notes = NoteIds::default();

    for (index, rec) in records.iter().enumerate() {
        let fail = |kind, message| Err(ValidationError::new(index, rec, kind, message));

        if let Some(cap) = rec.size_in_file.filter(|&cap| cap < rec.size) {
            return fail(
                ValidationErrorKind::CapacityBelowSize,
                format!("sizeInFile {cap} is smaller than size {}", rec.size),
            );
        }
        match rec.reserved_end() {
            Some(end) if end <= data_size => {}
            Some(end) => {
                return fail(
                    ValidationErrorKind::OutOfBounds,
                    format!("data range ends at {end}, data file has {data_size} bytes"),
                );
            }
            None => {
                return fail(
                    ValidationErrorKind::OutOfBounds,
                    "offset + size overflows u64".to_string(),
                );
            }
        }
        if rec.overwritten && rec.kind != RecordKind::WriteFile {
            return fail(
                ValidationErrorKind::IllegalOverwrite,
                format!("kind {} cannot be overwritten", rec.kind),
            );
        }

        let invalid_meta = |err: MetaError| {
            ValidationError::new(index, rec, ValidationErrorKind::InvalidMeta, err.to_string())
        };
        let target = match &rec.kind {
            RecordKind::CreateNote => {
                let id = CreateMeta::parse(&rec.meta).map_err(invalid_meta)?.id;
                if !notes.create(&id) {
                    return fail(
                        ValidationErrorKind::DuplicateCreate,
                        format!("duplicate note id '{id}'"),
                    );
                }
                continue;
            }
            RecordKind::DeleteNote => rec.meta.trim().to_string(),
            RecordKind::SetMeta => NoteMeta::parse(&rec.meta).map_err(invalid_meta)?.id,
            RecordKind::PutContent | RecordKind::PutContentEncrypted => {
                ContentMeta::parse(&rec.meta)
                    .map_err(invalid_meta)?
                    .note_id
            }
            RecordKind::WriteFile => continue,
            RecordKind::Unknown(token) => {
                return fail(
                    ValidationErrorKind::UnknownKind,
                    format!("unknown record kind '{token}'"),
                );
            }
        };

        if let Some(state) = notes.missing_state(&target) {
            return fail(
                ValidationErrorKind::MissingNote,
                format!("{} references {state} note '{target}'", rec.kind),
            );
        }
        if rec.kind == RecordKind::DeleteNote {
            notes.delete(&target);
        }
    }
    Ok(())
}

/// Note ids seen so far in a validation pass.
#[derive(Default)]
struct NoteIds {
    created: HashSet<String>,
    live: HashSet<String>,
}

impl NoteIds {
    /// Returns false if `id` was created before.
    fn create(&mut self, id: &str) -> bool {
        if !self.created.insert(id.to_string()) {
            return false;
        }
        self.live.insert(id.to_string());
        true
    }

    fn delete(&mut self, id: &str) {
        self.live.remove(id);
    }

    /// Why `id` cannot be mutated, or `None` if it is live.
    fn missing_state(&self, id: &str) -> Option<&'static str> {
        if self.live.contains(id) {
            None
        } else if self.created.contains(id) {
            Some("deleted")
        } else {
            Some("non-existing")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    fn rec(kind: RecordKind, meta: &str) -> Record {
        Record::new(kind, meta, 1_700_000_000_000)
    }

    fn err_kind(records: &[Record], data_size: u64) -> ValidationErrorKind {
        validate_records(records, data_size)
            .expect_err("must fail")
            .kind
    }

    #[test]
    fn accepts_well_formed_log() {
        let mut store = MemStore::new();
        store
            .append_record(RecordKind::CreateNote, "n1:scratch", &[])
            .expect("create");
        store
            .append_record(RecordKind::PutContent, "n1:aaaaaa", b"hello")
            .expect("put");
        store
            .append_record(RecordKind::SetMeta, r#"{"id":"n1","name":"x"}"#, &[])
            .expect("meta");
        store
            .overwrite_record(RecordKind::WriteFile, r#"{"name":"f"}"#, b"1")
            .expect("file");
        store
            .overwrite_record(RecordKind::WriteFile, r#"{"name":"f"}"#, b"2")
            .expect("file again");
        store
            .append_record(RecordKind::DeleteNote, "n1", &[])
            .expect("delete");
        validate(&store).expect("valid");
    }

    #[test]
    fn overwritten_put_is_rejected_but_write_file_passes() {
        let mut put = rec(RecordKind::PutContent, "n1:v1");
        put.overwritten = true;
        let log = vec![rec(RecordKind::CreateNote, "n1:a"), put];
        let err = validate_records(&log, 0).expect_err("must fail");
        assert_eq!(err.kind, ValidationErrorKind::IllegalOverwrite);
        assert_eq!(err.index, 1);
        assert!(err.record.contains("kind=put"));

        let mut file = rec(RecordKind::WriteFile, r#"{"name":"f"}"#);
        file.overwritten = true;
        validate_records(&[file], 0).expect("write-file may be overwritten");
    }

    #[test]
    fn capacity_below_size() {
        let mut r = rec(RecordKind::WriteFile, r#"{"name":"f"}"#);
        r.size = 10;
        r.size_in_file = Some(4);
        assert_eq!(err_kind(&[r], 100), ValidationErrorKind::CapacityBelowSize);
    }

    #[test]
    fn range_past_data_end_and_overflow() {
        let mut r = rec(RecordKind::WriteFile, r#"{"name":"f"}"#);
        r.offset = 8;
        r.size = 2;
        r.size_in_file = Some(4);
        assert_eq!(err_kind(&[r.clone()], 11), ValidationErrorKind::OutOfBounds);
        validate_records(&[r.clone()], 12).expect("fits exactly");

        r.offset = u64::MAX;
        assert_eq!(err_kind(&[r], u64::MAX), ValidationErrorKind::OutOfBounds);
    }

    #[test]
    fn duplicate_create_even_after_delete() {
        let log = vec![
            rec(RecordKind::CreateNote, "n1:a"),
            rec(RecordKind::DeleteNote, "n1"),
            rec(RecordKind::CreateNote, "n1:b"),
        ];
        assert_eq!(err_kind(&log, 0), ValidationErrorKind::DuplicateCreate);
    }

    #[test]
    fn delete_of_unknown_or_deleted_note() {
        assert_eq!(
            err_kind(&[rec(RecordKind::DeleteNote, "n1")], 0),
            ValidationErrorKind::MissingNote
        );
        let log = vec![
            rec(RecordKind::CreateNote, "n1:a"),
            rec(RecordKind::DeleteNote, "n1"),
            rec(RecordKind::DeleteNote, "n1"),
        ];
        let err = validate_records(&log, 0).expect_err("must fail");
        assert!(err.message.contains("deleted note"));
    }

    #[test]
    fn set_meta_requires_existing_note() {
        let log = vec![rec(RecordKind::SetMeta, r#"{"id":"n9","name":"x"}"#)];
        assert_eq!(err_kind(&log, 0), ValidationErrorKind::MissingNote);
    }

    #[test]
    fn put_requires_existing_note() {
        let log = vec![rec(RecordKind::PutContentEncrypted, "n9:v1")];
        assert_eq!(err_kind(&log, 0), ValidationErrorKind::MissingNote);
    }

    #[test]
    fn unknown_kind_always_fails() {
        let log = vec![rec(RecordKind::Unknown("note-pin".into()), "n1")];
        let err = validate_records(&log, 0).expect_err("must fail");
        assert_eq!(err.kind, ValidationErrorKind::UnknownKind);
        assert_eq!(err.code(), ErrorCode::UnknownRecordKind);
    }

    #[test]
    fn malformed_meta_is_reported() {
        let log = vec![rec(RecordKind::CreateNote, "no-separator")];
        assert_eq!(err_kind(&log, 0), ValidationErrorKind::InvalidMeta);
    }
}
