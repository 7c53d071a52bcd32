//! discord-assist CLI — the main entry point.
//!
//! Commands:
//! - `chat`    — Interactive or single-message chat in the terminal
//! - `reply`   — Answer the latest message in a Discord channel
//! - `tools`   — List the tools offered to the model
//! - `config`  — Show, locate, validate or initialise the config file
//! - `doctor`  — Diagnose configuration and connectivity

use std::path::PathBuf;

use assist_config::AppConfig;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

mod commands;
mod logging;

#[derive(Parser)]
#[command(
    name = "discord-assist",
    about = "discord-assist — a tool-using Discord assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.discord-assist/config.toml
    #[arg(short, long, global = true, env = "DISCORD_ASSIST_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant in the terminal
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Reply to the most recent message in a Discord channel
    Reply {
        /// Discord channel id
        #[arg(short, long)]
        channel: String,
    },

    /// List available tools
    Tools {
        /// Print the schemas sent to the model as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose configuration and connectivity
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the config file location
    Path,
    /// Check the configuration for errors
    Validate,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = AppConfig::resolve_path(cli.config.as_deref());

    // Loaded once; a broken config still gets default logging and is
    // reported by the commands that need it
    let config = AppConfig::load_with(Some(&config_path));
    let log_settings = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    logging::init(&log_settings, cli.verbose);

    match &config {
        Ok(config) => {
            if config_path.exists() {
                info!(path = %config_path.display(), "Loaded config file");
            } else {
                info!(path = %config_path.display(), "No config file found, using defaults");
            }
            config.logging.warn_unrecognized();
        }
        Err(e) => debug!(path = %config_path.display(), error = %e, "Config failed to load"),
    }

    match cli.command {
        Commands::Chat { message } => commands::chat::run(config, message).await?,
        Commands::Reply { channel } => commands::reply::run(config, channel).await?,
        Commands::Tools { json } => commands::tools::run(json)?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config)?,
            ConfigAction::Path => commands::config_cmd::path(&config_path),
            ConfigAction::Validate => commands::config_cmd::validate(config)?,
            ConfigAction::Init { force } => commands::config_cmd::init(&config_path, force)?,
        },
        Commands::Doctor => commands::doctor::run(&config_path, config).await?,
    }

    Ok(())
}
