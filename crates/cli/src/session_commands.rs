use {anyhow::Result, clap::Subcommand};

use crate::{Context, print_json};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Create a new session and print its id.
    New,
    /// List session ids, oldest first.
    List,
    /// Show a session's creation and last-update times.
    Info,
    /// List the documents a session holds.
    Kinds,
}

pub fn handle_session(ctx: &Context, action: SessionAction) -> Result<()> {
    match action {
        SessionAction::New => {
            println!("{}", ctx.store.create_session()?);
            Ok(())
        },
        SessionAction::List => {
            for id in ctx.store.list_sessions()? {
                println!("{id}");
            }
            Ok(())
        },
        SessionAction::Info => print_json(&ctx.store.session_info(&ctx.session_id()?)?),
        SessionAction::Kinds => {
            for kind in ctx.store.data_kinds(&ctx.session_id()?)? {
                println!("{kind}");
            }
            Ok(())
        },
    }
}
