//! Configuration loading, validation, and management for discord-assist.
//!
//! Loads configuration from `~/.discord-assist/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Highest `limit` Discord accepts on the channel messages endpoint.
pub const MAX_HISTORY_LIMIT: usize = 100;

/// The root configuration structure.
///
/// Maps directly to `~/.discord-assist/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model backend settings
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Discord REST settings
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Conversation loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Override the API endpoint (proxies, test servers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    "claude-3-5-sonnet-latest".into()
}
fn default_max_tokens() -> u32 {
    500
}
fn default_temperature() -> f32 {
    0.7
}
fn default_request_timeout() -> u64 {
    60
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// The bot's own user id. Resolved via `/users/@me` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_user_id: Option<String>,

    /// How many recent messages to feed the model
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    20
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            bot_user_id: None,
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Replaces the built-in assistant persona
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,

    /// Upper bound on model calls per conversation. Unset = unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rounds: Option<u32>,

    /// Whole-conversation deadline. Unset = none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_timeout_secs: Option<u64>,

    /// Prefix user turns with "User <name> says:"
    #[serde(default)]
    pub attribute_authors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// debug | info | warn | error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// json | text
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "json".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

const LOG_LEVELS: &[&str] = &["debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["json", "text"];

fn recognized(known: &[&'static str], value: &str) -> Option<&'static str> {
    known
        .iter()
        .copied()
        .find(|k| k.eq_ignore_ascii_case(value.trim()))
}

impl LoggingConfig {
    /// The configured level, or `info` when it is not a known level.
    pub fn level_or_default(&self) -> &'static str {
        recognized(LOG_LEVELS, &self.level).unwrap_or("info")
    }

    /// The configured format, or `json` when it is not a known format.
    pub fn format_or_default(&self) -> &'static str {
        recognized(LOG_FORMATS, &self.format).unwrap_or("json")
    }

    /// Settings that will be replaced by their defaults, as
    /// `(key, configured value, value used)`.
    pub fn unrecognized(&self) -> Vec<(&'static str, &str, &'static str)> {
        let mut out = Vec::new();
        if recognized(LOG_LEVELS, &self.level).is_none() {
            out.push(("logging.level", self.level.as_str(), self.level_or_default()));
        }
        if recognized(LOG_FORMATS, &self.format).is_none() {
            out.push(("logging.format", self.format.as_str(), self.format_or_default()));
        }
        out
    }

    /// Log a warning for every setting that fell back to its default.
    ///
    /// Call once the subscriber is installed.
    pub fn warn_unrecognized(&self) {
        for (key, value, used) in self.unrecognized() {
            tracing::warn!(
                setting = key,
                value = %value,
                using = used,
                "Unrecognized log setting, using default"
            );
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &redact(&self.token))
            .field("bot_user_id", &self.bot_user_id)
            .field("history_limit", &self.history_limit)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.discord-assist/config.toml).
    ///
    /// Environment variables override file values:
    /// - `ANTHROPIC_API_KEY`, `ANTHROPIC_MODEL`, `ANTHROPIC_BASE_URL`
    /// - `DISCORD_TOKEN`
    /// - `LOG_LEVEL`, `LOG_FORMAT`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Load from an explicit path when given, else the default path, then
    /// apply environment overrides and validate.
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = Self::resolve_path(path);
        Self::load_layered(&path, |key| {
            std::env::var(key).ok().filter(|v| !v.is_empty())
        })
    }

    /// File, then overrides from `lookup`, then a single validation of the
    /// merged result.
    pub fn load_layered<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::load_from(path)?;
        config.apply_env(lookup);
        config.validate()?;
        Ok(config)
    }

    /// The explicit path when given, else the default path.
    pub fn resolve_path(path: Option<&Path>) -> PathBuf {
        path.map(Path::to_path_buf).unwrap_or_else(Self::config_path)
    }

    /// Parse a config file without validating it. A missing file yields
    /// the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            self.anthropic.api_key = Some(key);
        }
        if let Some(model) = lookup("ANTHROPIC_MODEL") {
            self.anthropic.model = model;
        }
        if let Some(url) = lookup("ANTHROPIC_BASE_URL") {
            self.anthropic.base_url = Some(url);
        }
        if let Some(token) = lookup("DISCORD_TOKEN") {
            self.discord.token = Some(token);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".discord-assist")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    ///
    /// Unknown log settings are not errors; see
    /// [`LoggingConfig::unrecognized`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.anthropic.temperature;
        if !(0.0..=1.0).contains(&t) {
            return Err(ConfigError::ValidationError(format!(
                "anthropic.temperature must be between 0.0 and 1.0, got {t}"
            )));
        }

        if self.anthropic.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "anthropic.max_tokens must be > 0".into(),
            ));
        }

        if self.anthropic.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "anthropic.request_timeout_secs must be > 0".into(),
            ));
        }

        let limit = self.discord.history_limit;
        if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
            return Err(ConfigError::ValidationError(format!(
                "discord.history_limit must be between 1 and {MAX_HISTORY_LIMIT}, got {limit}"
            )));
        }

        if self.agent.max_rounds == Some(0) {
            return Err(ConfigError::ValidationError(
                "agent.max_rounds must be > 0 when set".into(),
            ));
        }

        Ok(())
    }

    /// The Anthropic API key, or an error naming where to set it.
    pub fn require_anthropic_key(&self) -> Result<&str, ConfigError> {
        self.anthropic
            .api_key
            .as_deref()
            .ok_or(ConfigError::MissingSecret {
                name: "anthropic.api_key",
                env: "ANTHROPIC_API_KEY",
            })
    }

    /// The Discord bot token, or an error naming where to set it.
    pub fn require_discord_token(&self) -> Result<&str, ConfigError> {
        self.discord
            .token
            .as_deref()
            .ok_or(ConfigError::MissingSecret {
                name: "discord.token",
                env: "DISCORD_TOKEN",
            })
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("{name} is not set (set it in the config file or via {env})")]
    MissingSecret {
        name: &'static str,
        env: &'static str,
    },
}
