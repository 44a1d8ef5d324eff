//! Typed views of the per-kind `meta` string.
//!
//! | kind                         | meta                                  |
//! |------------------------------|---------------------------------------|
//! | `note-create`                | `<noteId>:<name>`                     |
//! | `note-meta`                  | JSON `{id, name?, isArchived?, ...}`  |
//! | `note-delete`                | `<noteId>`                            |
//! | `put` / `put-encrypted`      | `<noteId>:<versionSuffix>`            |
//! | `write-file`                 | JSON `{name}`                         |

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Symbols used for generated note ids and version suffixes.
const ID_SYMBOLS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of a generated note id.
pub const NOTE_ID_LEN: usize = 8;

/// Length of the random suffix of a generated version id.
pub const VERSION_SUFFIX_LEN: usize = 6;

/// Errors produced while decoding a record's meta string.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    #[error("meta '{meta}' is missing the ':' separator")]
    MissingSeparator { meta: String },

    #[error("meta '{meta}' has an empty note id")]
    EmptyId { meta: String },

    #[error("meta '{meta}' is not valid JSON for this kind: {source}")]
    Json {
        meta: String,
        #[source]
        source: serde_json::Error,
    },
}

impl MetaError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidMeta
    }
}

fn split_id(meta: &str) -> Result<(&str, &str), MetaError> {
    let (id, rest) = meta.split_once(':').ok_or_else(|| MetaError::MissingSeparator {
        meta: meta.to_string(),
    })?;
    if id.is_empty() {
        return Err(MetaError::EmptyId {
            meta: meta.to_string(),
        });
    }
    Ok((id, rest))
}

/// Meta of a `note-create` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMeta {
    pub id: String,
    pub name: String,
}

impl CreateMeta {
    /// Parse `<noteId>:<name>`. The name may itself contain `:`.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError`] when the separator or the id is missing.
    pub fn parse(meta: &str) -> Result<Self, MetaError> {
        let (id, name) = split_id(meta)?;
        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}:{}", self.id, self.name)
    }
}

/// Full metadata snapshot carried by a `note-meta` record.
///
/// Omitted fields decode as empty/false; empty/false fields are omitted on
/// encode so the payload stays small in the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMeta {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_archived: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_starred: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alt_shortcut: String,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(v: &bool) -> bool {
    !*v
}

impl NoteMeta {
    /// # Errors
    ///
    /// Returns [`MetaError::Json`] if `meta` is not a note-meta object.
    pub fn parse(meta: &str) -> Result<Self, MetaError> {
        serde_json::from_str(meta).map_err(|source| MetaError::Json {
            meta: meta.to_string(),
            source,
        })
    }

    /// Compact JSON encoding. Never contains a newline.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String, MetaError> {
        serde_json::to_string(self).map_err(|source| MetaError::Json {
            meta: self.id.clone(),
            source,
        })
    }
}

/// Meta of a `put` / `put-encrypted` record. The whole string is the version id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMeta {
    pub note_id: String,
    pub version_id: String,
}

impl ContentMeta {
    /// # Errors
    ///
    /// Returns [`MetaError`] when the separator or the note id is missing.
    pub fn parse(meta: &str) -> Result<Self, MetaError> {
        let (id, _) = split_id(meta)?;
        Ok(Self {
            note_id: id.to_string(),
            version_id: meta.to_string(),
        })
    }
}

/// Return the note id embedded in a version id (`<noteId>:<suffix>`).
///
/// # Errors
///
/// Returns [`MetaError`] when the separator or the note id is missing.
pub fn note_id_from_version_id(version_id: &str) -> Result<&str, MetaError> {
    split_id(version_id).map(|(id, _)| id)
}

/// Meta of a `write-file` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteFileMeta {
    pub name: String,
}

impl WriteFileMeta {
    /// # Errors
    ///
    /// Returns [`MetaError::Json`] if `meta` is not a `{name}` object.
    pub fn parse(meta: &str) -> Result<Self, MetaError> {
        serde_json::from_str(meta).map_err(|source| MetaError::Json {
            meta: meta.to_string(),
            source,
        })
    }

    /// # Errors
    ///
    /// Returns [`MetaError::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String, MetaError> {
        serde_json::to_string(self).map_err(|source| MetaError::Json {
            meta: self.name.clone(),
            source,
        })
    }
}

/// Replace the `name` of a raw `note-meta` payload, keeping every other key
/// (including ones this build does not know) as it was.
///
/// # Errors
///
/// Returns [`MetaError::Json`] if `meta` is not a JSON object.
pub fn rename_note_meta(meta: &str, name: &str) -> Result<String, MetaError> {
    let json_err = |source| MetaError::Json {
        meta: meta.to_string(),
        source,
    };
    let mut value: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(meta).map_err(json_err)?;
    value.insert("name".to_string(), serde_json::Value::String(name.to_string()));
    serde_json::to_string(&value).map_err(json_err)
}

fn random_symbols(n: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| char::from(ID_SYMBOLS[rng.gen_range(0..ID_SYMBOLS.len())]))
        .collect()
}

/// Generate a fresh note id.
#[must_use]
pub fn new_note_id() -> String {
    random_symbols(NOTE_ID_LEN)
}

/// Generate a fresh version id for `note_id`.
#[must_use]
pub fn new_version_id(note_id: &str) -> String {
    format!("{note_id}:{}", random_symbols(VERSION_SUFFIX_LEN))
}
