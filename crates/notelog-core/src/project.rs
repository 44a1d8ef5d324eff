//! Projection: replay an ordered record sequence into current note state.
//!
//! Note state is never stored directly. It is a left fold over the log:
//!
//! ```text
//! project(records, mode) = records.try_fold(NoteMap::new(), apply_record)
//! ```
//!
//! [`apply_record`] is the pure per-record transition. It consumes the
//! accumulator and returns the next one, so callers that need incremental
//! state (the merge engine tracks a running projection while replaying)
//! can drive the same transition one record at a time.
//!
//! # Modes
//!
//! - [`ProjectionMode::Strict`]: a record that references an unknown or
//!   deleted note is an [`ProjectError::InconsistentLog`].
//! - [`ProjectionMode::Tolerant`]: such records are dropped. Used for
//!   partial logs (sync bundles) that may omit a creation event the full
//!   log already holds.
//!
//! A duplicate `note-create` for an id already in the map fails in both
//! modes. Deleted notes stay in the map with `is_deleted` set so that a
//! later create for the same id is still caught.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::ErrorCode;
use crate::record::{ContentMeta, CreateMeta, MetaError, NoteMeta, Record, RecordKind};

/// Current state of one note, derived from the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub modified_at: i64,
    pub is_starred: bool,
    pub is_archived: bool,
    pub alt_shortcut: String,
    /// Content version ids, oldest first. The last one is current.
    pub version_ids: Vec<String>,
    pub is_deleted: bool,
}

impl Note {
    /// The current content version, if any content was ever written.
    #[must_use]
    pub fn current_version(&self) -> Option<&str> {
        self.version_ids.last().map(String::as_str)
    }
}

/// Note id → note. Ordered so that listings are deterministic.
pub type NoteMap = BTreeMap<String, Note>;

/// How the projector treats records that reference missing notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    #[default]
    Strict,
    Tolerant,
}

impl ProjectionMode {
    #[must_use]
    pub const fn from_tolerant(tolerant: bool) -> Self {
        if tolerant { Self::Tolerant } else { Self::Strict }
    }

    #[must_use]
    pub const fn is_tolerant(self) -> bool {
        matches!(self, Self::Tolerant)
    }
}

/// Errors raised while projecting a record sequence.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("record {index} [{record}]: {reason}")]
    InconsistentLog {
        index: usize,
        reason: String,
        record: String,
    },

    #[error("record {index} [{record}]: note '{id}' is already created")]
    DuplicateCreate {
        index: usize,
        id: String,
        record: String,
    },

    #[error("record {index} [{record}]: {source}")]
    Meta {
        index: usize,
        record: String,
        #[source]
        source: MetaError,
    },
}

impl ProjectError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InconsistentLog { .. } | Self::DuplicateCreate { .. } => {
                ErrorCode::InconsistentLog
            }
            Self::Meta { .. } => ErrorCode::InvalidMeta,
        }
    }
}

/// Project `records` into a note map.
///
/// # Errors
///
/// Returns the first [`ProjectError`] produced by [`apply_record`].
pub fn project(records: &[Record], mode: ProjectionMode) -> Result<NoteMap, ProjectError> {
    records
        .iter()
        .enumerate()
        .try_fold(NoteMap::new(), |notes, (index, rec)| {
            apply_record(notes, index, rec, mode)
        })
}

/// Apply one record to the accumulated note map.
///
/// `index` is the record's position in its log and is only used for
/// diagnostics.
///
/// # Errors
///
/// - [`ProjectError::Meta`] when the meta string does not decode.
/// - [`ProjectError::DuplicateCreate`] on a second create for one id.
/// - [`ProjectError::InconsistentLog`] in strict mode when the record
///   targets an unknown or deleted note.
pub fn apply_record(
    mut notes: NoteMap,
    index: usize,
    rec: &Record,
    mode: ProjectionMode,
) -> Result<NoteMap, ProjectError> {
    let meta_err = |source| ProjectError::Meta {
        index,
        record: rec.to_string(),
        source,
    };

    match &rec.kind {
        RecordKind::CreateNote => {
            let meta = CreateMeta::parse(&rec.meta).map_err(meta_err)?;
            if notes.contains_key(&meta.id) {
                return Err(ProjectError::DuplicateCreate {
                    index,
                    id: meta.id,
                    record: rec.to_string(),
                });
            }
            let note = Note {
                id: meta.id.clone(),
                name: meta.name,
                created_at: rec.timestamp_ms,
                modified_at: rec.timestamp_ms,
                ..Note::default()
            };
            notes.insert(meta.id, note);
        }
        RecordKind::SetMeta => {
            let meta = NoteMeta::parse(&rec.meta).map_err(meta_err)?;
            if !is_live(&notes, &meta.id) {
                return missing(notes, index, rec, &meta.id, mode);
            }
            if !meta.alt_shortcut.is_empty() {
                for other in notes.values_mut().filter(|n| n.id != meta.id) {
                    if other.alt_shortcut == meta.alt_shortcut {
                        other.alt_shortcut.clear();
                    }
                }
            }
            if let Some(note) = notes.get_mut(&meta.id) {
                note.name = meta.name;
                note.is_archived = meta.is_archived;
                note.is_starred = meta.is_starred;
                note.alt_shortcut = meta.alt_shortcut;
                note.modified_at = rec.timestamp_ms;
            }
        }
        RecordKind::DeleteNote => {
            let id = rec.meta.trim();
            if !is_live(&notes, id) {
                return missing(notes, index, rec, id, mode);
            }
            if let Some(note) = notes.get_mut(id) {
                note.is_deleted = true;
                note.modified_at = rec.timestamp_ms;
            }
        }
        RecordKind::PutContent | RecordKind::PutContentEncrypted => {
            let meta = ContentMeta::parse(&rec.meta).map_err(meta_err)?;
            if !is_live(&notes, &meta.note_id) {
                return missing(notes, index, rec, &meta.note_id, mode);
            }
            if let Some(note) = notes.get_mut(&meta.note_id) {
                note.version_ids.push(meta.version_id);
                note.modified_at = rec.timestamp_ms;
            }
        }
        RecordKind::WriteFile => {}
        RecordKind::Unknown(token) => {
            debug!(index, kind = %token, "projector ignoring unknown record kind");
        }
    }
    Ok(notes)
}

fn is_live(notes: &NoteMap, id: &str) -> bool {
    notes.get(id).is_some_and(|n| !n.is_deleted)
}

/// Strict: error. Tolerant: drop the record and keep the map unchanged.
fn missing(
    notes: NoteMap,
    index: usize,
    rec: &Record,
    id: &str,
    mode: ProjectionMode,
) -> Result<NoteMap, ProjectError> {
    let state = if notes.contains_key(id) {
        "deleted"
    } else {
        "unknown"
    };
    if mode.is_tolerant() {
        trace!(index, id, state, kind = %rec.kind, "tolerant projection dropped record");
        return Ok(notes);
    }
    Err(ProjectError::InconsistentLog {
        index,
        reason: format!("{} references {state} note '{id}'", rec.kind),
        record: rec.to_string(),
    })
}

/// Notes that have not been deleted.
pub fn live_notes(notes: &NoteMap) -> impl Iterator<Item = &Note> {
    notes.values().filter(|n| !n.is_deleted)
}

/// Index live notes by name. When several live notes share a name the one
/// with the smallest id wins.
#[must_use]
pub fn notes_by_name(notes: &NoteMap) -> HashMap<&str, &Note> {
    let mut by_name = HashMap::new();
    for note in live_notes(notes) {
        by_name.entry(note.name.as_str()).or_insert(note);
    }
    by_name
}

/// The last content record in `records` carrying `version_id`.
#[must_use]
pub fn last_version_record<'a>(records: &'a [Record], version_id: &str) -> Option<&'a Record> {
    records
        .iter()
        .rev()
        .find(|r| r.kind.is_content() && r.meta == version_id)
}
