use {
    chrono::{DateTime, Duration, Utc},
    serde::Serialize,
};

use crate::{Result, Tracker, parse_timestamp};

/// How many skills [`UserStatistics::top_skills`] keeps.
pub const TOP_SKILLS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillScore {
    pub skill: String,
    pub score: u8,
}

/// Dashboard numbers derived from the activity and progress documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserStatistics {
    pub total_activities: usize,
    /// Mean over rated activities only; 0 when nothing is rated.
    pub average_rating: f64,
    pub total_hours: f64,
    /// Completions in the seven days up to `now`.
    pub activities_this_week: usize,
    pub top_skills: Vec<SkillScore>,
}

impl Tracker<'_> {
    pub fn statistics(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserStatistics> {
        let activities = self.activities(user_id)?;

        let ratings: Vec<u8> = activities
            .iter()
            .filter_map(|a| a.effective_rating())
            .collect();
        let average_rating = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64
        };

        let minutes: u64 = activities
            .iter()
            .map(|a| u64::from(a.duration_minutes))
            .sum();

        let week_ago = now - Duration::days(7);
        let activities_this_week = activities
            .iter()
            .filter(|a| parse_timestamp(&a.completion_date) >= week_ago)
            .count();

        let mut top_skills: Vec<SkillScore> = self
            .progress(user_id)?
            .into_iter()
            .map(|(skill, progress)| SkillScore {
                skill,
                score: progress.score,
            })
            .collect();
        // Stable sort keeps skill-name order among equal scores.
        top_skills.sort_by(|a, b| b.score.cmp(&a.score));
        top_skills.truncate(TOP_SKILLS);

        Ok(UserStatistics {
            total_activities: activities.len(),
            average_rating,
            total_hours: minutes as f64 / 60.0,
            activities_this_week,
            top_skills,
        })
    }
}
