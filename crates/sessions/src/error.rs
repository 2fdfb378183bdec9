//! Error types for the session store.

use std::path::PathBuf;

use thiserror::Error;

use crate::kind::{DocumentKind, Shape};

/// Session store errors.
///
/// `Io` and `SessionNotFound` cover the filesystem. Every other variant is a
/// data error: the bytes on disk (or the value handed in) are not what the
/// store expects.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize {kind}: {source}")]
    Serialize {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} must be a JSON {expected}, found {found}")]
    Shape {
        kind: DocumentKind,
        expected: Shape,
        found: &'static str,
    },

    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),

    #[error("{0} is an object document and cannot be appended to")]
    NotAppendable(DocumentKind),

    #[error("unknown document kind: {0:?}")]
    UnknownKind(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by bad data rather than the filesystem.
    pub fn is_data_error(&self) -> bool {
        !matches!(self, Self::Io { .. } | Self::SessionNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
