//! `discord-assist reply` — Answer the latest message in a Discord channel.

use std::sync::Arc;

use assist_agent::Responder;
use assist_channels::DiscordChannel;
use assist_config::{AppConfig, ConfigError};
use assist_core::channel::ChatId;
use assist_core::event::EventBus;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn run(
    config: Result<AppConfig, ConfigError>,
    channel_id: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::require_config(config)?;

    if let Err(e) = config.require_anthropic_key() {
        super::print_secret_help("ANTHROPIC_API_KEY", "anthropic", "api_key");
        return Err(e.into());
    }
    if let Err(e) = config.require_discord_token() {
        super::print_secret_help("DISCORD_TOKEN", "discord", "token");
        return Err(e.into());
    }

    let agent = super::build_agent(&config, Arc::new(EventBus::default()))?;
    let discord = Arc::new(DiscordChannel::from_config(&config)?);
    let responder = Responder::new(discord, agent).configured(&config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let chat_id = ChatId::from(channel_id);
    info!(chat_id = %chat_id, "Replying to Discord channel");

    match responder.handle_chat(&chat_id, &cancel).await? {
        Some(summary) => println!(
            "  ✅ Replied in {chat_id} ({} model call(s), {} tool call(s), {} message(s) sent)",
            summary.rounds, summary.tool_invocations, summary.deliveries
        ),
        None => println!("  💤 Nothing to answer in {chat_id}: no user message is waiting"),
    }

    Ok(())
}
