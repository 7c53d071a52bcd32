pub mod chat;
pub mod config_cmd;
pub mod doctor;
pub mod reply;
pub mod tools;

use std::sync::Arc;

use assist_agent::AgentLoop;
use assist_config::{AppConfig, ConfigError};
use assist_core::event::EventBus;
use assist_providers::AnthropicProvider;

/// The config a command needs, or an error saying it failed to load.
pub(crate) fn require_config(
    config: Result<AppConfig, ConfigError>,
) -> Result<AppConfig, Box<dyn std::error::Error>> {
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

/// Build the conversation loop shared by `chat` and `reply`.
pub(crate) fn build_agent(
    config: &AppConfig,
    event_bus: Arc<EventBus>,
) -> Result<AgentLoop, Box<dyn std::error::Error>> {
    let provider = Arc::new(AnthropicProvider::from_config(config)?);
    let tools = Arc::new(assist_tools::default_registry());
    Ok(AgentLoop::from_config(config, provider, tools, event_bus))
}

/// Explain how to provide a missing secret.
pub(crate) fn print_secret_help(env: &str, section: &str, key: &str) {
    eprintln!();
    eprintln!("  ERROR: {env} is not set!");
    eprintln!();
    eprintln!("  Set the environment variable:");
    eprintln!("    export {env}=...");
    eprintln!();
    eprintln!("  Or add it to your config file under [{section}] as `{key}`:");
    eprintln!("    {}", AppConfig::config_path().display());
    eprintln!();
}
