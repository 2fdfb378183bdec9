mod doc_commands;
mod session_commands;
mod tracker_commands;

use std::path::PathBuf;

use {
    anyhow::{Context as _, Result},
    clap::{Parser, Subcommand},
    psytech_sessions::SessionStore,
    serde::Serialize,
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "psytech", about = "PsyTech: session-scoped activity tracking store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Session directory root (overrides config and PSYTECH_DATA_DIR).
    #[arg(long, global = true, env = "PSYTECH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Session to operate on. Defaults to the most recent session.
    #[arg(long, short, global = true)]
    session: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Session management.
    Session {
        #[command(subcommand)]
        action: session_commands::SessionAction,
    },
    /// Raw document access.
    Doc {
        #[command(subcommand)]
        action: doc_commands::DocAction,
    },
    /// Skill progress.
    Progress {
        #[command(subcommand)]
        action: tracker_commands::ProgressAction,
    },
    /// Activity statistics for a user.
    Stats {
        #[arg(long)]
        user: String,
    },
    /// Activity history for a user, newest first.
    History {
        #[arg(long)]
        user: String,
    },
    /// Storage backend summary.
    Info,
    /// Configuration inspection.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Print the path of the config file in use, if any.
    Path,
}

/// What every command needs: the opened store and the session selector.
pub(crate) struct Context {
    store: SessionStore,
    session: Option<String>,
}

impl Context {
    /// The explicitly requested session, or the most recent one (created if
    /// the store is empty).
    pub(crate) fn session_id(&self) -> Result<String> {
        match &self.session {
            Some(id) => Ok(id.clone()),
            None => Ok(psytech_tracker::current_session(&self.store)?),
        }
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "psytech starting");

    let config = psytech_config::discover_and_load();
    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigAction::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            },
            ConfigAction::Path => {
                match psytech_config::find_config_file() {
                    Some(path) => println!("{}", path.display()),
                    None => println!("(none, using defaults)"),
                }
                Ok(())
            },
        };
    }

    let base_path = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| psytech_config::resolve_base_path(&config));
    let store = SessionStore::open(&base_path)
        .with_context(|| format!("opening session store at {}", base_path.display()))?
        .with_pretty(config.storage.pretty);
    debug!(base_path = %base_path.display(), "session store ready");

    let ctx = Context {
        store,
        session: cli.session,
    };

    match cli.command {
        Commands::Session { action } => session_commands::handle_session(&ctx, action),
        Commands::Doc { action } => doc_commands::handle_doc(&ctx, action),
        Commands::Progress { action } => tracker_commands::handle_progress(&ctx, action),
        Commands::Stats { user } => tracker_commands::stats(&ctx, &user),
        Commands::History { user } => tracker_commands::history(&ctx, &user),
        Commands::Info => print_json(&ctx.store.storage_info()?),
        Commands::Config { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use {clap::CommandFactory, super::*};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "psytech",
            "doc",
            "get",
            "userprofile",
            "--session",
            "s1",
            "--data-dir",
            "/tmp/x",
        ])
        .unwrap();
        assert_eq!(cli.session.as_deref(), Some("s1"));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn explicit_session_wins() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            store: SessionStore::open(dir.path()).unwrap(),
            session: Some("chosen".into()),
        };
        assert_eq!(ctx.session_id().unwrap(), "chosen");
        assert!(ctx.store.list_sessions().unwrap().is_empty());
    }

    #[test]
    fn implicit_session_is_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            store: SessionStore::open(dir.path()).unwrap(),
            session: None,
        };
        let first = ctx.session_id().unwrap();
        assert_eq!(ctx.session_id().unwrap(), first);
        assert_eq!(ctx.store.list_sessions().unwrap(), vec![first]);
    }
}
