use std::fmt;

/// Machine-readable error codes shared by every notelog error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    MalformedBundle,
    MalformedIndex,
    InvalidMeta,
    InconsistentLog,
    MergeValidationFailure,
    UnknownRecordKind,
    NoteNotFound,
    VersionNotFound,
    DuplicateNote,
    StoreWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::MalformedBundle => "E2001",
            Self::MalformedIndex => "E2002",
            Self::InvalidMeta => "E2003",
            Self::InconsistentLog => "E3001",
            Self::MergeValidationFailure => "E3002",
            Self::UnknownRecordKind => "E3003",
            Self::NoteNotFound => "E4001",
            Self::VersionNotFound => "E4002",
            Self::DuplicateNote => "E4003",
            Self::StoreWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::MalformedBundle => "Malformed sync bundle",
            Self::MalformedIndex => "Malformed index line",
            Self::InvalidMeta => "Invalid record metadata",
            Self::InconsistentLog => "Inconsistent record log",
            Self::MergeValidationFailure => "Log failed validation after merge",
            Self::UnknownRecordKind => "Unknown record kind",
            Self::NoteNotFound => "Note not found",
            Self::VersionNotFound => "Content version not found",
            Self::DuplicateNote => "Note already exists",
            Self::StoreWriteFailed => "Store write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and clients.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in the notelog config.toml and retry."),
            Self::MalformedBundle => {
                Some("Re-export the bundle; it needs index.txt and data.bin with valid ranges.")
            }
            Self::MalformedIndex => Some("Inspect the index file around the reported line."),
            Self::InvalidMeta => None,
            Self::InconsistentLog => {
                Some("Run `notelog validate` and inspect the offending record.")
            }
            Self::MergeValidationFailure => Some(
                "Records from this merge were already appended; inspect the log before retrying.",
            ),
            Self::UnknownRecordKind => Some("Upgrade notelog to a version that knows this kind."),
            Self::NoteNotFound | Self::VersionNotFound => None,
            Self::DuplicateNote => Some("Pick a different note id or name."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other writer releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
