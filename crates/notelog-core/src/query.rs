//! Reads and single-record mutations over a tenant's log.
//!
//! Every mutation projects the log strictly first and refuses to append a
//! record the projector would reject, so a log written only through this
//! module always projects cleanly.

use std::io::{Cursor, Write};

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ErrorCode;
use crate::project::{
    Note, NoteMap, ProjectError, ProjectionMode, apply_record, last_version_record, live_notes,
    notes_by_name, project,
};
use crate::record::{
    CreateMeta, MetaError, NoteMeta, Record, RecordKind, WriteFileMeta, new_note_id,
    new_version_id, note_id_from_version_id,
};
use crate::store::{RecordStore, StoreError};

/// Compact-note flag bits.
pub const FLAG_STARRED: u32 = 0x01;
pub const FLAG_ARCHIVED: u32 = 0x02;

/// Errors returned by query and mutation operations.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("note '{0}' not found")]
    NoteNotFound(String),

    #[error("content version '{0}' not found")]
    VersionNotFound(String),

    #[error("a note named '{0}' already exists")]
    DuplicateNote(String),

    #[error("file '{0}' not found")]
    FileNotFound(String),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Meta(#[from] MetaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cannot build content archive: {0}")]
    Zip(#[from] ZipError),

    #[error("cannot build content archive: {0}")]
    Io(#[from] std::io::Error),
}

impl QueryError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NoteNotFound(_) | Self::FileNotFound(_) => ErrorCode::NoteNotFound,
            Self::VersionNotFound(_) => ErrorCode::VersionNotFound,
            Self::DuplicateNote(_) => ErrorCode::DuplicateNote,
            Self::Project(err) => err.code(),
            Self::Meta(err) => err.code(),
            Self::Store(err) => err.code(),
            Self::Zip(_) | Self::Io(_) => ErrorCode::InternalUnexpected,
        }
    }
}

/// Response body of a note listing.
///
/// Field names match the existing client wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotesResponse {
    #[serde(rename = "Ver")]
    pub ver: String,
    /// Number of records in the log; pass back as `since` next time.
    #[serde(rename = "LastChangeID")]
    pub last_change_id: usize,
    /// `[id, name, flags, altShortcut, createdAt, modifiedAt, versionIds...]`
    #[serde(rename = "NotesCompact")]
    pub notes_compact: Vec<Vec<Value>>,
}

/// Encode a note in the compact array form.
#[must_use]
pub fn compact_note(note: &Note) -> Vec<Value> {
    let mut flags = 0;
    if note.is_starred {
        flags |= FLAG_STARRED;
    }
    if note.is_archived {
        flags |= FLAG_ARCHIVED;
    }
    let mut out = vec![
        json!(note.id),
        json!(note.name),
        json!(flags),
        json!(note.alt_shortcut),
        json!(note.created_at),
        json!(note.modified_at),
    ];
    out.extend(note.version_ids.iter().map(|v| json!(v)));
    out
}

fn current_notes<S: RecordStore + ?Sized>(store: &S) -> Result<NoteMap, QueryError> {
    Ok(project(store.records(), ProjectionMode::Strict)?)
}

fn live_note<'a>(notes: &'a NoteMap, id: &str) -> Result<&'a Note, QueryError> {
    notes
        .get(id)
        .filter(|n| !n.is_deleted)
        .ok_or_else(|| QueryError::NoteNotFound(id.to_string()))
}

/// Append `kind`/`meta`/`content` and return the note it touched.
fn append_and_project<S: RecordStore + ?Sized>(
    store: &mut S,
    notes: NoteMap,
    kind: RecordKind,
    meta: &str,
    content: &[u8],
    id: &str,
) -> Result<Note, QueryError> {
    let rec = store.append_record(kind, meta, content)?;
    let index = store.change_id() - 1;
    let notes = apply_record(notes, index, &rec, ProjectionMode::Strict)?;
    notes
        .get(id)
        .cloned()
        .ok_or_else(|| QueryError::NoteNotFound(id.to_string()))
}

/// List live notes, or `None` when nothing changed since `since`.
///
/// # Errors
///
/// Returns [`QueryError::Project`] if the log does not project.
pub fn list_notes<S: RecordStore + ?Sized>(
    store: &S,
    since: usize,
) -> Result<Option<NotesResponse>, QueryError> {
    let last_change_id = store.change_id();
    if since >= last_change_id {
        return Ok(None);
    }
    let notes = current_notes(store)?;
    Ok(Some(NotesResponse {
        ver: "1".to_string(),
        last_change_id,
        notes_compact: live_notes(&notes).map(compact_note).collect(),
    }))
}

/// One live note by id.
///
/// # Errors
///
/// Returns [`QueryError::NoteNotFound`] unless `id` is a live note.
pub fn get_note<S: RecordStore + ?Sized>(store: &S, id: &str) -> Result<Note, QueryError> {
    let notes = current_notes(store)?;
    live_note(&notes, id).cloned()
}

/// Content bytes of one version.
///
/// # Errors
///
/// Returns [`QueryError::VersionNotFound`] for an unknown version id.
pub fn get_content<S: RecordStore + ?Sized>(
    store: &S,
    version_id: &str,
) -> Result<Vec<u8>, QueryError> {
    let rec = last_version_record(store.records(), version_id)
        .ok_or_else(|| QueryError::VersionNotFound(version_id.to_string()))?;
    Ok(store.read_record(rec)?)
}

/// Zip of content blobs, one entry per version id, named by the id.
///
/// # Errors
///
/// Returns [`QueryError::VersionNotFound`] if any id is unknown.
pub fn get_contents<S, V>(store: &S, version_ids: &[V]) -> Result<Vec<u8>, QueryError>
where
    S: RecordStore + ?Sized,
    V: AsRef<str>,
{
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for ver in version_ids {
        let ver = ver.as_ref();
        let bytes = get_content(store, ver)?;
        zip.start_file(ver, options)?;
        zip.write_all(&bytes)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// Create a note named `name`.
///
/// # Errors
///
/// Returns [`QueryError::DuplicateNote`] if a live note already has the name.
pub fn create_note<S: RecordStore + ?Sized>(store: &mut S, name: &str) -> Result<Note, QueryError> {
    let notes = current_notes(&*store)?;
    if notes_by_name(&notes).contains_key(name) {
        return Err(QueryError::DuplicateNote(name.to_string()));
    }
    let id = loop {
        let id = new_note_id();
        if !notes.contains_key(&id) {
            break id;
        }
    };
    let meta = CreateMeta {
        id: id.clone(),
        name: name.to_string(),
    }
    .encode();
    let note = append_and_project(store, notes, RecordKind::CreateNote, &meta, &[], &id)?;
    debug!(id = %note.id, name, "created note");
    Ok(note)
}

/// Replace the metadata of an existing note.
///
/// # Errors
///
/// Returns [`QueryError::NoteNotFound`] unless `meta.id` is a live note.
pub fn set_note_meta<S: RecordStore + ?Sized>(
    store: &mut S,
    meta: &NoteMeta,
) -> Result<Note, QueryError> {
    let notes = current_notes(&*store)?;
    live_note(&notes, &meta.id)?;
    let encoded = meta.encode()?;
    append_and_project(store, notes, RecordKind::SetMeta, &encoded, &[], &meta.id)
}

/// Delete a note.
///
/// # Errors
///
/// Returns [`QueryError::NoteNotFound`] unless `id` is a live note.
pub fn delete_note<S: RecordStore + ?Sized>(store: &mut S, id: &str) -> Result<(), QueryError> {
    let notes = current_notes(&*store)?;
    live_note(&notes, id)?;
    append_and_project(store, notes, RecordKind::DeleteNote, id, &[], id)?;
    debug!(id, "deleted note");
    Ok(())
}

/// Store a new content version of a note and return its version id.
///
/// # Errors
///
/// Returns [`QueryError::NoteNotFound`] unless `note_id` is a live note.
pub fn put_content<S: RecordStore + ?Sized>(
    store: &mut S,
    note_id: &str,
    content: &[u8],
    encrypted: bool,
) -> Result<String, QueryError> {
    let notes = current_notes(&*store)?;
    let note = live_note(&notes, note_id)?;
    let version_id = loop {
        let ver = new_version_id(note_id);
        if !note.version_ids.contains(&ver) {
            break ver;
        }
    };
    let kind = if encrypted {
        RecordKind::PutContentEncrypted
    } else {
        RecordKind::PutContent
    };
    append_and_project(store, notes, kind, &version_id, content, note_id)?;
    Ok(version_id)
}

/// Note id a version id belongs to.
///
/// # Errors
///
/// Returns [`QueryError::Meta`] for a version id without `:`.
pub fn note_of_version(version_id: &str) -> Result<&str, QueryError> {
    Ok(note_id_from_version_id(version_id)?)
}

/// Write (or overwrite) an auxiliary file.
///
/// # Errors
///
/// Returns [`QueryError::Store`] if the store rejects the write.
pub fn write_file<S: RecordStore + ?Sized>(
    store: &mut S,
    name: &str,
    content: &[u8],
) -> Result<Record, QueryError> {
    let meta = WriteFileMeta {
        name: name.to_string(),
    }
    .encode()?;
    Ok(store.overwrite_record(RecordKind::WriteFile, &meta, content)?)
}

/// Current bytes of an auxiliary file.
///
/// # Errors
///
/// Returns [`QueryError::FileNotFound`] if no file has that name.
pub fn read_file<S: RecordStore + ?Sized>(store: &S, name: &str) -> Result<Vec<u8>, QueryError> {
    let rec = store
        .records()
        .iter()
        .rev()
        .filter(|r| r.kind == RecordKind::WriteFile && !r.overwritten)
        .find(|r| WriteFileMeta::parse(&r.meta).is_ok_and(|m| m.name == name))
        .ok_or_else(|| QueryError::FileNotFound(name.to_string()))?;
    Ok(store.read_record(rec)?)
}

/// Names of all auxiliary files, sorted.
#[must_use]
pub fn list_files<S: RecordStore + ?Sized>(store: &S) -> Vec<String> {
    let mut names: Vec<String> = store
        .records()
        .iter()
        .filter(|r| r.kind == RecordKind::WriteFile && !r.overwritten)
        .filter_map(|r| WriteFileMeta::parse(&r.meta).ok().map(|m| m.name))
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Create each of `names` that has no live note yet. Returns how many
/// notes were created.
///
/// # Errors
///
/// Propagates the first failing [`create_note`].
pub fn ensure_default_notes<S, N>(store: &mut S, names: &[N]) -> Result<usize, QueryError>
where
    S: RecordStore + ?Sized,
    N: AsRef<str>,
{
    let mut created = 0;
    for name in names {
        let name = name.as_ref();
        let exists = notes_by_name(&current_notes(&*store)?).contains_key(name);
        if !exists {
            create_note(store, name)?;
            created += 1;
        }
    }
    if created > 0 {
        info!(created, "provisioned default notes");
    }
    Ok(created)
}
