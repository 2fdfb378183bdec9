use {
    psytech_sessions::{DocumentKind, now_rfc3339},
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use crate::{Result, Tracker};

/// Feedback on an activity, either a quick rating or the detailed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub user_id: String,
    pub activity_name: String,
    /// e.g. `detailed_feedback`, `quick_rating`.
    pub feedback_type: String,
    #[serde(default)]
    pub feedback_data: Value,
    pub submitted_at: String,
}

impl Tracker<'_> {
    pub fn record_feedback(
        &self,
        user_id: &str,
        activity_name: &str,
        feedback_type: &str,
        feedback_data: Value,
    ) -> Result<usize> {
        let entry = FeedbackEntry {
            user_id: user_id.to_string(),
            activity_name: activity_name.to_string(),
            feedback_type: feedback_type.to_string(),
            feedback_data,
            submitted_at: now_rfc3339(),
        };
        self.push(DocumentKind::Feedback, &entry)
    }

    /// The user's feedback entries in the order they were submitted.
    pub fn feedback(&self, user_id: &str) -> Result<Vec<FeedbackEntry>> {
        let mut entries: Vec<FeedbackEntry> = self.records(DocumentKind::Feedback)?;
        entries.retain(|e| e.user_id == user_id);
        Ok(entries)
    }
}
