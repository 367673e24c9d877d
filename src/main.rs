//! # Research Harness CLI (`research`)
//!
//! ## Usage
//!
//! ```bash
//! research --config ./config/research.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `research init` | Create the SQLite database and run schema migrations |
//! | `research run "<topic>"` | Plan, collect, and synthesize a cited report |
//! | `research ask <session> "<question>"` | Answer a follow-up question over a stored session |
//! | `research sessions` | List stored sessions |
//! | `research delete <session>` | Delete a session's indexed chunks |
//!
//! `run` and `ask` need `OPENAI_API_KEY`; `run` also needs `TAVILY_API_KEY`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use research_harness::progress::ProgressMode;
use research_harness::{config, db, logging, migrate, research, sessions};

/// Research Harness CLI: autonomous web research with cited reports
/// and follow-up Q&A.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/research.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "research",
    about = "Research Harness: plan, collect, and synthesize cited research reports",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/research.toml`.
    #[arg(long, global = true, default_value = "./config/research.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Research a topic and print the report.
    Run {
        /// The research topic.
        topic: String,

        /// Print the outcome as JSON instead of text.
        #[arg(long)]
        json: bool,

        /// Also write the report as Markdown to this file.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Progress on stderr: `off`, `human`, or `json`.
        /// Defaults to `human` when stderr is a terminal, else `off`.
        #[arg(long)]
        progress: Option<String>,
    },

    /// Ask a follow-up question about a completed research session.
    Ask {
        /// Session id printed by `research run`.
        session_id: String,

        /// The question.
        question: String,
    },

    /// List stored research sessions.
    Sessions,

    /// Delete a stored research session.
    Delete {
        /// Session id to delete.
        session_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging);

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Run {
            topic,
            json,
            output,
            progress,
        } => {
            let mode = match progress {
                Some(p) => ProgressMode::parse(&p)?,
                None => ProgressMode::default_for_tty(),
            };
            research::run_research(&cfg, &topic, json, output.as_deref(), mode).await?;
        }
        Commands::Ask {
            session_id,
            question,
        } => {
            research::run_ask(&cfg, &session_id, &question).await?;
        }
        Commands::Sessions => {
            sessions::run_sessions(&cfg).await?;
        }
        Commands::Delete { session_id } => {
            sessions::run_delete(&cfg, &session_id).await?;
        }
    }

    Ok(())
}
