//! Child-development tracking on top of the session store.
//!
//! A [`Tracker`] is bound to one session and reads and writes the session's
//! documents: the user profile, completed activities, feedback, per-skill
//! progress and the feed (articles, tips, bookmarks).

pub mod activities;
pub mod error;
pub mod feed;
pub mod feedback;
pub mod profile;
pub mod progress;
pub mod stats;

use {
    chrono::{DateTime, Utc},
    psytech_sessions::{DocumentKind, SessionStore},
    serde::{Serialize, de::DeserializeOwned},
    serde_json::Value,
    tracing::info,
};

pub use {
    activities::ActivityCompletion,
    error::{Result, TrackerError},
    feed::{Bookmark, FeedItem},
    feedback::FeedbackEntry,
    progress::{ScoreChange, SkillProgress},
    stats::{SkillScore, UserStatistics},
};

/// Session-scoped view of the tracking documents.
#[derive(Debug, Clone, Copy)]
pub struct Tracker<'a> {
    store: &'a SessionStore,
    session_id: &'a str,
}

impl<'a> Tracker<'a> {
    pub fn new(store: &'a SessionStore, session_id: &'a str) -> Self {
        Self { store, session_id }
    }

    pub fn session_id(&self) -> &str {
        self.session_id
    }

    pub fn store(&self) -> &SessionStore {
        self.store
    }

    /// Deserialize every record of an array document.
    fn records<T: DeserializeOwned>(&self, kind: DocumentKind) -> Result<Vec<T>> {
        let Value::Array(items) = self.store.read(self.session_id, kind)? else {
            return Ok(Vec::new());
        };
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item).map_err(|source| TrackerError::Record {
                    kind,
                    index,
                    source,
                })
            })
            .collect()
    }

    fn push<T: Serialize>(&self, kind: DocumentKind, record: &T) -> Result<usize> {
        let value =
            serde_json::to_value(record).map_err(|source| TrackerError::Encode { kind, source })?;
        Ok(self.store.append(self.session_id, kind, value)?)
    }
}

/// The session the application should work in: the most recently created
/// one, or a new session if the store is empty.
pub fn current_session(store: &SessionStore) -> Result<String> {
    if let Some(latest) = store.list_sessions()?.pop() {
        return Ok(latest);
    }
    let session_id = store.create_session()?;
    info!(session_id = %session_id, "no existing session, created one");
    Ok(session_id)
}

/// Parse a stored timestamp. Unparseable or missing values sort as the
/// oldest possible time instead of failing.
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
        })
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_session_reuses_latest() {
        let (_dir, store) = test_support::store();
        let first = current_session(&store).unwrap();
        assert_eq!(current_session(&store).unwrap(), first);

        std::thread::sleep(std::time::Duration::from_millis(2));
        let newer = store.create_session().unwrap();
        assert_eq!(current_session(&store).unwrap(), newer);
    }

    #[test]
    fn parses_naive_and_offset_timestamps() {
        let naive = parse_timestamp("2024-05-01T12:30:00.123456");
        let offset = parse_timestamp("2024-05-01T12:30:00.123456+00:00");
        assert_eq!(naive, offset);
        assert_eq!(parse_timestamp("yesterday"), DateTime::<Utc>::MIN_UTC);
    }
}
