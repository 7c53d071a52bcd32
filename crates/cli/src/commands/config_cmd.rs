//! `discord-assist config` — Configuration management commands.

use std::path::Path;

use assist_config::{AppConfig, ConfigError};

const REDACTED: &str = "***";

pub fn validate(config: Result<AppConfig, ConfigError>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match config {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings: Vec<String> = config
                .logging
                .unrecognized()
                .into_iter()
                .map(|(key, value, used)| format!("Unknown {key} '{value}', using '{used}'"))
                .collect();

            if config.anthropic.api_key.is_none() {
                warnings.push("No Anthropic API key set (set ANTHROPIC_API_KEY)".into());
            }

            if config.discord.token.is_none() {
                warnings.push(
                    "No Discord token set (set DISCORD_TOKEN); `reply` will not work".into(),
                );
            }

            if config.agent.max_rounds.is_none() && config.agent.conversation_timeout_secs.is_none()
            {
                warnings.push("Neither agent.max_rounds nor agent.conversation_timeout_secs is set; tool loops are unbounded".into());
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Model:        {}", config.anthropic.model);
            println!("   Max tokens:   {}", config.anthropic.max_tokens);
            println!("   Temperature:  {}", config.anthropic.temperature);
            println!("   History:      {} messages", config.discord.history_limit);
            println!(
                "   Logging:      {} ({})",
                config.logging.level_or_default(),
                config.logging.format_or_default()
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub fn show(config: Result<AppConfig, ConfigError>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::require_config(config)?;

    if config.anthropic.api_key.is_some() {
        config.anthropic.api_key = Some(REDACTED.into());
    }
    if config.discord.token.is_some() {
        config.discord.token = Some(REDACTED.into());
    }

    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn path(path: &Path) {
    println!("{}", path.display());
}

pub fn init(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    println!("✅ Wrote default config to {}", path.display());
    println!("   Set ANTHROPIC_API_KEY and DISCORD_TOKEN, or add them to the file.");
    Ok(())
}
