use {
    chrono::{DateTime, SecondsFormat, Utc},
    serde::{Deserialize, Serialize},
};

/// File holding a session's bookkeeping, next to its documents.
pub const SESSION_INFO_FILE: &str = "session_info.json";

/// Bookkeeping record stored as `session_info.json` in each session directory.
///
/// Its presence is what marks a directory as a session for
/// [`SessionStore::list_sessions`](crate::SessionStore::list_sessions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl SessionInfo {
    pub fn new(session_id: &str) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.to_string(),
            created_at: now,
            last_updated: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

/// Summary of the store, as reported by
/// [`SessionStore::storage_info`](crate::SessionStore::storage_info).
#[derive(Debug, Clone, Serialize)]
pub struct StorageInfo {
    #[serde(rename = "type")]
    pub backend: &'static str,
    pub base_path: String,
    pub sessions: Vec<String>,
}

/// Current time as an RFC 3339 UTC string, the format used for every
/// timestamp the store and tracker write into documents.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
