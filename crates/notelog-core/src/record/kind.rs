//! Record kinds and their index-line tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind tag of a log record, determining how meta and content are read.
///
/// Tokens not known to this build are kept verbatim in [`RecordKind::Unknown`]
/// so a log written by a newer client still loads; the merge engine and the
/// validator refuse to act on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Create a note. Meta: `<noteId>:<name>`.
    CreateNote,
    /// Replace a note's mutable metadata. Meta: JSON snapshot.
    SetMeta,
    /// Delete a note (terminal). Meta: `<noteId>`.
    DeleteNote,
    /// Add a content version. Meta: `<noteId>:<versionSuffix>`.
    PutContent,
    /// Add an encrypted content version; opaque bytes, same meta as `PutContent`.
    PutContentEncrypted,
    /// Write a named auxiliary file. Meta: JSON `{name}`. Overwritable.
    WriteFile,
    /// A kind token this build does not understand.
    Unknown(String),
}

/// Error returned when a kind token is empty or contains whitespace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid record kind token '{raw}': must be non-empty without spaces or newlines")]
pub struct InvalidKindToken {
    /// The rejected input.
    pub raw: String,
}

impl RecordKind {
    /// All kinds understood by this build.
    pub const KNOWN: [Self; 6] = [
        Self::CreateNote,
        Self::SetMeta,
        Self::DeleteNote,
        Self::PutContent,
        Self::PutContentEncrypted,
        Self::WriteFile,
    ];

    /// The token written into index lines.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateNote => "note-create",
            Self::SetMeta => "note-meta",
            Self::DeleteNote => "note-delete",
            Self::PutContent => "put",
            Self::PutContentEncrypted => "put-encrypted",
            Self::WriteFile => "write-file",
            Self::Unknown(raw) => raw,
        }
    }

    /// Content kinds carry a note version in their meta.
    #[must_use]
    pub const fn is_content(&self) -> bool {
        matches!(self, Self::PutContent | Self::PutContentEncrypted)
    }

    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = InvalidKindToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(InvalidKindToken { raw: s.to_string() });
        }
        Ok(match s {
            "note-create" => Self::CreateNote,
            "note-meta" => Self::SetMeta,
            "note-delete" => Self::DeleteNote,
            "put" => Self::PutContent,
            "put-encrypted" => Self::PutContentEncrypted,
            "write-file" => Self::WriteFile,
            other => Self::Unknown(other.to_string()),
        })
    }
}

impl Serialize for RecordKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecordKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
