//! Error types for document inspection

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Why a path could not be walked to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The mapping has no entry for the field.
    MissingField,
    /// The sequence is shorter than the requested index.
    IndexOutOfRange { len: usize },
    /// The segment needs a mapping but the value is something else.
    ExpectedObject,
    /// The segment needs a sequence but the value is something else.
    ExpectedArray,
}

impl std::fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFoundReason::MissingField => write!(f, "no such field"),
            NotFoundReason::IndexOutOfRange { len } => {
                write!(f, "index out of range for sequence of length {len}")
            }
            NotFoundReason::ExpectedObject => write!(f, "value is not an object"),
            NotFoundReason::ExpectedArray => write!(f, "value is not an array"),
        }
    }
}

/// Inspector errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Path not found: {path} (at segment `{segment}`: {reason})")]
    PathNotFound {
        path: String,
        segment: String,
        reason: NotFoundReason,
    },

    #[error("Invalid path `{path}`: {message}")]
    InvalidPath { path: String, message: String },

    #[error("Unsupported value kind: {0}")]
    UnsupportedValueKind(String),
}

impl Error {
    /// Returns true for the recoverable "nothing at this path" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::PathNotFound { .. })
    }
}
