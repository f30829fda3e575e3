//! msgview CLI - Read chats and messages from a messenger database copy

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use msgview::config::{self, ViewerConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "msgview")]
#[command(version)]
#[command(about = "Read-only viewer for forensic copies of a mobile messenger database")]
#[command(long_about = r#"
msgview reads a copy of a messenger's SQLite database without modifying it:
  • Validates that the database comes from a supported app version
  • Lists chats with last activity and sent/received counts
  • Prints a chat's messages with media, locations, links and quotes

Example usage:
  msgview validate --database msgstore.db
  msgview chats --database msgstore.db --filter "@g.us"
  msgview messages --database msgstore.db --chat "4915112345678@s.whatsapp.net"
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file (defaults to ./msgview.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Check that a database can be read and print its fingerprint
    Validate {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// List chats, most recently active first
    Chats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Only show chats whose key, subject or display name matches this regex
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Print the messages of one chat
    Messages {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Raw identity key of the chat
        #[arg(long)]
        chat: String,

        /// Stop reading after this many seconds and show what was read so far
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Show at most this many messages
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

/// Print a JSON success envelope
pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if output_mode.is_human() {
        return Ok(());
    }
    let envelope = serde_json::json!({
        "ok": true,
        "command": command,
        "data": data,
    });
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };

    if let Some(path) = &cli.config {
        if !path.exists() && !matches!(cli.command, Commands::Init { .. }) {
            anyhow::bail!("config file not found: {}", path.display());
        }
    }
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    let loaded = match cli.command {
        Commands::Init { .. } => ViewerConfig::default(),
        _ => ViewerConfig::load(&config_path)?.unwrap_or_default(),
    };

    let result = match cli.command {
        Commands::Init { force } => commands::run_init(output_mode, &config_path, force),
        Commands::Validate { database } => {
            commands::run_validate(output_mode, &loaded, database.as_deref())
        }
        Commands::Chats { database, filter } => {
            commands::run_chats(output_mode, &loaded, database.as_deref(), filter.as_deref())
        }
        Commands::Messages { database, chat, timeout, limit } => {
            commands::run_messages(output_mode, &loaded, database.as_deref(), &chat, timeout, limit)
        }
    };

    if let Err(err) = &result {
        if output_mode.is_human() {
            msgview::ui::error(&err.to_string());
            std::process::exit(1);
        }
    }
    result
}
