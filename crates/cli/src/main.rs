//! aicode CLI: the main entry point.
//!
//! Commands:
//! - `init`: Write a default config file
//! - `run`: Drive the agent loop against a scripted (replay) model
//! - `sessions`: List stored sessions
//! - `history`: Show a session's conversation
//! - `clear`: Delete a session's log
//! - `parse`: Decode a model turn read from stdin
//! - `skills`: List available skills

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "aicode",
    about = "aicode: a ReAct coding agent with durable sessions",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.aicode/config.toml)
    #[arg(short, long, global = true, env = "AICODE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Run the agent on an instruction, replaying model turns from a script
    Run {
        /// The instruction for the agent
        instruction: String,

        /// Script of model turns, separated by lines containing only `---`
        #[arg(short, long)]
        script: PathBuf,

        /// Resume this session instead of starting a new one
        #[arg(long)]
        session: Option<String>,
    },

    /// List stored sessions, newest first
    Sessions,

    /// Show the conversation of a session
    History {
        /// Session id
        id: String,

        /// Show the full log instead of the model's context window
        #[arg(long)]
        full: bool,
    },

    /// Delete a session's log
    Clear {
        /// Session id
        id: String,
    },

    /// Parse a model turn from stdin and print the result as JSON
    Parse,

    /// List available skills
    Skills,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config;
    match cli.command {
        Commands::Init { force } => commands::init::run(config_path, force).await?,
        Commands::Run {
            instruction,
            script,
            session,
        } => commands::run::run(config_path, instruction, script, session).await?,
        Commands::Sessions => commands::sessions::list(config_path).await?,
        Commands::History { id, full } => commands::sessions::history(config_path, id, full).await?,
        Commands::Clear { id } => commands::sessions::clear(config_path, id).await?,
        Commands::Parse => commands::parse::run().await?,
        Commands::Skills => commands::skills::run(config_path).await?,
    }

    Ok(())
}
