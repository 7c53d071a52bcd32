//! `discord-assist doctor` — Diagnose configuration and connectivity.

use std::path::Path;

use assist_channels::DiscordChannel;
use assist_config::{AppConfig, ConfigError};
use assist_core::channel::Channel;
use assist_core::provider::Provider;
use assist_providers::AnthropicProvider;

pub async fn run(
    path: &Path,
    config: Result<AppConfig, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 discord-assist Doctor — System Diagnostics");
    println!("============================================\n");

    let mut issues = 0;

    if path.exists() {
        println!("  ✅ Config file found at {}", path.display());
    } else {
        println!("  ⚠️  No config file at {} — using defaults", path.display());
    }

    let config = match config {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!();
            println!("  ⚠️  1 issue found. Fix the config and run doctor again.");
            return Ok(());
        }
    };

    let tools = assist_tools::default_registry();
    println!("  ✅ {} tools registered", tools.len());

    // Anthropic
    match AnthropicProvider::from_config(&config) {
        Ok(provider) => match provider.health_check().await {
            Ok(true) => println!("  ✅ Anthropic API reachable ({})", config.anthropic.model),
            Ok(false) => {
                println!("  ⚠️  Anthropic API answered but reported unhealthy");
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Anthropic API check failed: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Anthropic provider not configured: {e}");
            issues += 1;
        }
    }

    // Discord
    match DiscordChannel::from_config(&config) {
        Ok(discord) => match discord.health_check().await {
            Ok(_) => match discord.bot_user_id().await {
                Ok(id) => println!("  ✅ Discord token valid (bot user {id})"),
                Err(e) => {
                    println!("  ❌ Discord check failed: {e}");
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  ❌ Discord check failed: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ⚠️  Discord not configured: {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
