use std::collections::BTreeMap;

use {
    psytech_sessions::{DocumentKind, now_rfc3339},
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    tracing::debug,
};

use crate::{Result, Tracker, TrackerError};

/// A change of score, kept in the skill's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreChange {
    pub previous_score: u8,
    pub new_score: u8,
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProgress {
    /// 0 to 100.
    pub score: u8,
    #[serde(default)]
    pub history: Vec<ScoreChange>,
    pub created_at: String,
    pub last_updated: String,
    /// Fields written by other callers, kept as-is on update.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// On-disk shape of the `progress` document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(default)]
    skills: BTreeMap<String, SkillProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Tracker<'_> {
    /// Set the score for one skill.
    ///
    /// The first score creates the skill. Later scores push the previous
    /// value onto the skill's history before replacing it.
    pub fn update_progress(
        &self,
        user_id: &str,
        skill: &str,
        score: u8,
        notes: Option<&str>,
    ) -> Result<()> {
        if score > 100 {
            return Err(TrackerError::InvalidScore(score));
        }

        let mut doc = self.progress_document()?;
        match doc.user_id.as_deref() {
            Some(owner) if owner != user_id => {
                return Err(TrackerError::UserMismatch {
                    kind: DocumentKind::Progress,
                    owner: owner.to_string(),
                    user_id: user_id.to_string(),
                });
            },
            Some(_) => {},
            None => doc.user_id = Some(user_id.to_string()),
        }

        let now = now_rfc3339();
        doc.created_at.get_or_insert_with(|| now.clone());
        doc.updated_at = Some(now.clone());

        doc.skills
            .entry(skill.to_string())
            .and_modify(|entry| {
                entry.history.push(ScoreChange {
                    previous_score: entry.score,
                    new_score: score,
                    date: now.clone(),
                    notes: notes.map(str::to_string),
                });
                entry.score = score;
                entry.last_updated = now.clone();
            })
            .or_insert_with(|| SkillProgress {
                score,
                history: Vec::new(),
                created_at: now.clone(),
                last_updated: now.clone(),
                extra: Map::new(),
            });

        let value = serde_json::to_value(&doc).map_err(|source| TrackerError::Encode {
            kind: DocumentKind::Progress,
            source,
        })?;
        self.store.write(self.session_id, DocumentKind::Progress, &value)?;
        debug!(session_id = self.session_id, skill, score, "updated progress");
        Ok(())
    }

    /// Per-skill progress for `user_id`; empty when the document is absent
    /// or belongs to someone else.
    pub fn progress(&self, user_id: &str) -> Result<BTreeMap<String, SkillProgress>> {
        let doc = self.progress_document()?;
        if doc.user_id.as_deref() != Some(user_id) {
            return Ok(BTreeMap::new());
        }
        Ok(doc.skills)
    }

    fn progress_document(&self) -> Result<ProgressDocument> {
        let raw: Value = self.store.read(self.session_id, DocumentKind::Progress)?;
        serde_json::from_value(raw).map_err(|source| TrackerError::Document {
            kind: DocumentKind::Progress,
            source,
        })
    }
}
