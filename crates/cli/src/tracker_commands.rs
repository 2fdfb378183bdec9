use {
    anyhow::Result,
    clap::Subcommand,
    psytech_tracker::Tracker,
};

use crate::{Context, print_json};

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Set a skill score (0-100) for a user.
    Set {
        #[arg(long)]
        user: String,
        #[arg(long)]
        skill: String,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        score: u8,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Print per-skill progress for a user.
    Show {
        #[arg(long)]
        user: String,
    },
}

pub fn handle_progress(ctx: &Context, action: ProgressAction) -> Result<()> {
    let session_id = ctx.session_id()?;
    let tracker = Tracker::new(&ctx.store, &session_id);
    match action {
        ProgressAction::Set {
            user,
            skill,
            score,
            notes,
        } => {
            tracker.update_progress(&user, &skill, score, notes.as_deref())?;
            Ok(())
        },
        ProgressAction::Show { user } => print_json(&tracker.progress(&user)?),
    }
}

pub fn stats(ctx: &Context, user: &str) -> Result<()> {
    let session_id = ctx.session_id()?;
    let stats = Tracker::new(&ctx.store, &session_id).statistics(user, chrono::Utc::now())?;
    print_json(&stats)
}

pub fn history(ctx: &Context, user: &str) -> Result<()> {
    let session_id = ctx.session_id()?;
    print_json(&Tracker::new(&ctx.store, &session_id).activity_history(user)?)
}
