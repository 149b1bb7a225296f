//! postsync CLI
//!
//! Command-line interface and terminal UI for postsync.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use postsync_core::{Config, HttpTransport, SyncCoordinator};

mod commands;
mod output;
mod tui;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "postsync")]
#[command(about = "postsync - browse and add posts on a REST collection")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI interface
    Tui,
    /// Fetch and print posts
    #[command(alias = "ls")]
    List {
        /// Maximum number of posts (defaults to default_limit)
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Create a new post
    #[command(alias = "add")]
    Create {
        /// Post title
        #[arg(short = 'T', long, default_value = "")]
        title: String,
        /// Post body
        #[arg(short, long, default_value = "")]
        body: String,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (base_url, default_limit, refresh_limit, request_timeout_secs, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands don't need a coordinator
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    // Handle TUI (default when no command given)
    let command = match cli.command {
        None | Some(Commands::Tui) => return tui::run(config).await,
        Some(command) => command,
    };

    init_cli_logging();

    let coordinator = SyncCoordinator::new(Arc::new(HttpTransport::from_config(&config)?));

    match command {
        Commands::List { limit } => {
            let limit = limit.unwrap_or(config.default_limit);
            commands::posts::list(&coordinator, limit, &output).await
        }
        Commands::Create { title, body } => {
            commands::posts::create(&coordinator, title, body, &output).await
        }
        Commands::Tui | Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Log to stderr when POSTSYNC_LOG is set
fn init_cli_logging() {
    let Ok(log_level) = std::env::var("POSTSYNC_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "postsync_core={},postsync_cli={}",
        log_level, log_level
    ));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
