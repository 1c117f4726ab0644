//! Error taxonomy for the core.
//!
//! Three classes, mirroring how callers must react:
//! - [`Error::Validation`] — out-of-policy input, surfaced as a 400-class
//!   failure, never retried
//! - [`Error::NotFound`] — a referenced task, tag, or user does not exist
//! - [`Error::Storage`] — SQLite failure; the enclosing transaction is
//!   rolled back and nothing is partially applied

use std::fmt;

use crate::model::ParseEnumError;

/// Machine-readable kind for a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    BlankField,
    DueDateNotInFuture,
    DuplicateUsername,
    InvalidEnumValue,
    MalformedTimestamp,
}

impl ValidationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BlankField => "blank field",
            Self::DueDateNotInFuture => "due date not in future",
            Self::DuplicateUsername => "duplicate username",
            Self::InvalidEnumValue => "invalid enumeration value",
            Self::MalformedTimestamp => "malformed timestamp",
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input failed validation before any mutation was attempted.
    #[error("{kind}: {message}")]
    Validation {
        kind: ValidationKind,
        message: String,
    },

    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Underlying persistence failure.
    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Error {
    pub(crate) fn validation(kind: ValidationKind, message: impl Into<String>) -> Self {
        Self::Validation {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<ParseEnumError> for Error {
    fn from(err: ParseEnumError) -> Self {
        Self::validation(ValidationKind::InvalidEnumValue, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
