use {
    psytech_sessions::{DocumentKind, now_rfc3339},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tracing::debug,
};

use crate::{Result, Tracker, parse_timestamp};

/// One completed (or attempted) activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityCompletion {
    pub user_id: String,
    pub activity_name: String,
    pub completion_status: String,
    /// 1 to 5; `None` (or 0 in older records) means unrated.
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub duration_minutes: u32,
    pub completion_date: String,
    /// The activity as it was recommended (description, skills, materials).
    #[serde(default)]
    pub data: Value,
}

impl ActivityCompletion {
    pub fn new(user_id: impl Into<String>, activity_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            activity_name: activity_name.into(),
            completion_status: "Completed successfully".into(),
            rating: None,
            comments: String::new(),
            duration_minutes: 0,
            completion_date: now_rfc3339(),
            data: Value::Null,
        }
    }

    pub(crate) fn effective_rating(&self) -> Option<u8> {
        self.rating.filter(|r| *r > 0)
    }
}

impl Tracker<'_> {
    /// Append an activity completion and return how many are now recorded.
    pub fn record_activity(&self, completion: &ActivityCompletion) -> Result<usize> {
        let count = self.push(DocumentKind::Activities, completion)?;
        debug!(
            session_id = self.session_id,
            activity = %completion.activity_name,
            count,
            "recorded activity"
        );
        Ok(count)
    }

    /// All of the user's completions, in insertion order.
    pub fn activities(&self, user_id: &str) -> Result<Vec<ActivityCompletion>> {
        let mut all: Vec<ActivityCompletion> = self.records(DocumentKind::Activities)?;
        all.retain(|a| a.user_id == user_id);
        Ok(all)
    }

    /// The user's completions, newest first.
    pub fn activity_history(&self, user_id: &str) -> Result<Vec<ActivityCompletion>> {
        let mut history = self.activities(user_id)?;
        history.sort_by_key(|a| std::cmp::Reverse(parse_timestamp(&a.completion_date)));
        Ok(history)
    }
}
