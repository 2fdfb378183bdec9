use {psytech_sessions::DocumentKind, thiserror::Error};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Store(#[from] psytech_sessions::StoreError),

    /// A record in an array document is missing fields or has the wrong types.
    #[error("malformed {kind} record #{index}: {source}")]
    Record {
        kind: DocumentKind,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed {kind} document: {source}")]
    Document {
        kind: DocumentKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {kind} record: {source}")]
    Encode {
        kind: DocumentKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} belongs to user {owner}, not {user_id}")]
    UserMismatch {
        kind: DocumentKind,
        owner: String,
        user_id: String,
    },

    #[error("score {0} is out of range 0..=100")]
    InvalidScore(u8),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
