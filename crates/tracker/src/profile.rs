use {
    psytech_sessions::{DocumentKind, now_rfc3339},
    serde_json::{Map, Value},
    tracing::info,
};

use crate::{Result, Tracker};

/// Free-form profile fields (name, age, interests, challenges, ...).
pub type Profile = Map<String, Value>;

impl Tracker<'_> {
    /// Save the session's profile and return its user id.
    ///
    /// A `user_id` is generated when the profile has none. `created_at` is
    /// carried over from the stored profile of the same user, so re-saving
    /// only moves `updated_at`.
    pub fn save_profile(&self, mut profile: Profile) -> Result<String> {
        let user_id = match profile.get("user_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };
        self.store_profile(&user_id, &mut profile)?;
        info!(session_id = self.session_id, user_id = %user_id, "saved user profile");
        Ok(user_id)
    }

    /// Replace the profile for `user_id`, forcing the id onto the record.
    pub fn update_profile(&self, user_id: &str, mut profile: Profile) -> Result<()> {
        self.store_profile(user_id, &mut profile)
    }

    /// The stored profile, if there is one and it belongs to `user_id`
    /// (any owner when `user_id` is `None`).
    pub fn profile(&self, user_id: Option<&str>) -> Result<Option<Profile>> {
        let Value::Object(profile) = self.store.read(self.session_id, DocumentKind::UserProfile)?
        else {
            return Ok(None);
        };
        if profile.is_empty() {
            return Ok(None);
        }
        if let Some(user_id) = user_id
            && owner(&profile) != Some(user_id)
        {
            return Ok(None);
        }
        Ok(Some(profile))
    }

    fn store_profile(&self, user_id: &str, profile: &mut Profile) -> Result<()> {
        let now = now_rfc3339();
        let created_at = self
            .profile(Some(user_id))?
            .and_then(|existing| existing.get("created_at").cloned())
            .or_else(|| profile.get("created_at").cloned())
            .unwrap_or_else(|| Value::String(now.clone()));

        profile.insert("user_id".into(), Value::String(user_id.to_string()));
        profile.insert("created_at".into(), created_at);
        profile.insert("updated_at".into(), Value::String(now));

        self.store.write(
            self.session_id,
            DocumentKind::UserProfile,
            &Value::Object(profile.clone()),
        )?;
        Ok(())
    }
}

fn owner(doc: &Map<String, Value>) -> Option<&str> {
    doc.get("user_id").and_then(Value::as_str)
}
