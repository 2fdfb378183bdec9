use std::io::Read;

use {
    anyhow::{Context as _, Result},
    clap::Subcommand,
    psytech_sessions::DocumentKind,
    serde_json::Value,
};

use crate::{Context, print_json};

#[derive(Subcommand)]
pub enum DocAction {
    /// Print a document (its empty default if never written).
    Get {
        /// userprofile, activities, progress, feedback or feed.
        kind: DocumentKind,
    },
    /// Replace a document with the given JSON.
    Put {
        kind: DocumentKind,
        /// JSON text; read from stdin when omitted or `-`.
        json: Option<String>,
    },
    /// Append a record to an array document.
    Append {
        kind: DocumentKind,
        /// JSON text; read from stdin when omitted or `-`.
        json: Option<String>,
    },
}

pub fn handle_doc(ctx: &Context, action: DocAction) -> Result<()> {
    let session_id = ctx.session_id()?;
    match action {
        DocAction::Get { kind } => print_json(&ctx.store.read(&session_id, kind)?),
        DocAction::Put { kind, json } => {
            let value = parse_json_arg(json, std::io::stdin())?;
            ctx.store.write(&session_id, kind, &value)?;
            Ok(())
        },
        DocAction::Append { kind, json } => {
            let value = parse_json_arg(json, std::io::stdin())?;
            let len = ctx.store.append(&session_id, kind, value)?;
            println!("{len}");
            Ok(())
        },
    }
}

fn parse_json_arg(arg: Option<String>, mut stdin: impl Read) -> Result<Value> {
    let text = match arg {
        Some(text) if text != "-" => text,
        _ => {
            let mut buf = String::new();
            stdin
                .read_to_string(&mut buf)
                .context("reading JSON from stdin")?;
            buf
        },
    };
    serde_json::from_str(&text).context("argument is not valid JSON")
}
