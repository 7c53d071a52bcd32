//! Discord channel over the REST API.
//!
//! Fetches recent channel history and posts replies. There is no gateway
//! (WebSocket) connection: something else decides when to reply, this
//! channel only reads and writes messages.

use std::time::Duration;

use assist_config::AppConfig;
use assist_core::channel::{Channel, ChannelMessage, ChatId, History, HistoryOrder};
use assist_core::error::ChannelError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Discord rejects messages longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Discord's upper bound for `limit` on the channel messages endpoint.
const MAX_FETCH_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
struct DiscordMessage {
    id: String,
    #[serde(default)]
    content: String,
    author: DiscordUser,
    channel_id: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct DiscordUser {
    id: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    global_name: Option<String>,
    #[serde(default)]
    bot: Option<bool>,
}

#[derive(Debug, Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    #[serde(default)]
    retry_after: f64,
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Fetch,
    Send,
}

/// Discord channel using the REST API for history and replies.
pub struct DiscordChannel {
    token: String,
    base_url: String,
    client: reqwest::Client,
    bot_user_id: OnceCell<String>,
    /// Pause between the chunks of a split message
    chunk_delay: Duration,
}

impl std::fmt::Debug for DiscordChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordChannel")
            .field("token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("bot_user_id", &self.bot_user_id.get())
            .finish()
    }
}

impl DiscordChannel {
    pub fn new(token: impl Into<String>) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ChannelError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            token: token.into(),
            base_url: DISCORD_API_BASE.into(),
            client,
            bot_user_id: OnceCell::new(),
            chunk_delay: Duration::from_millis(500),
        })
    }

    /// Build from the `[discord]` section of the app config.
    pub fn from_config(config: &AppConfig) -> Result<Self, ChannelError> {
        let token = config
            .require_discord_token()
            .map_err(|e| ChannelError::NotConfigured(e.to_string()))?;

        let channel = Self::new(token)?;
        Ok(match &config.discord.bot_user_id {
            Some(id) => channel.with_bot_user_id(id.as_str()),
            None => channel,
        })
    }

    /// Create with a custom API base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Skip the `/users/@me` lookup by supplying the bot's user id.
    pub fn with_bot_user_id(self, id: impl Into<String>) -> Self {
        // A fresh cell cannot already be set
        let _ = self.bot_user_id.set(id.into());
        self
    }

    /// The bot's own user id, resolved once via `/users/@me`.
    pub async fn bot_user_id(&self) -> Result<&str, ChannelError> {
        self.bot_user_id
            .get_or_try_init(|| async {
                let url = format!("{}/users/@me", self.base_url);
                let response = self
                    .client
                    .get(&url)
                    .header("Authorization", self.auth_header())
                    .send()
                    .await
                    .map_err(|e| fetch_failed(e.to_string()))?;
                let response = check_status(response, Op::Fetch).await?;
                let me: DiscordUser = response
                    .json()
                    .await
                    .map_err(|e| ChannelError::InvalidPayload(e.to_string()))?;
                info!(bot_user_id = %me.id, "Resolved Discord bot user");
                Ok::<_, ChannelError>(me.id)
            })
            .await
            .map(String::as_str)
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    async fn send(&self, chat_id: &ChatId, content: &str) -> Result<(), ChannelError> {
        let url = format!("{}/channels/{}/messages", self.base_url, chat_id);
        let chunks = split_message(content, MAX_MESSAGE_CHARS);

        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.chunk_delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("Authorization", self.auth_header())
                .json(&CreateMessage { content: chunk })
                .send()
                .await
                .map_err(|e| delivery_failed(e.to_string()))?;
            check_status(response, Op::Send).await?;
        }

        debug!(chat_id = %chat_id, chunks = chunks.len(), "Discord message sent");
        Ok(())
    }

    async fn recent_messages(
        &self,
        chat_id: &ChatId,
        limit: usize,
    ) -> Result<History, ChannelError> {
        let self_id = self.bot_user_id().await?.to_string();
        let limit = limit.clamp(1, MAX_FETCH_LIMIT);
        let url = format!("{}/channels/{}/messages", self.base_url, chat_id);

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;
        let response = check_status(response, Op::Fetch).await?;

        let raw: Vec<DiscordMessage> = response
            .json()
            .await
            .map_err(|e| ChannelError::InvalidPayload(e.to_string()))?;

        debug!(chat_id = %chat_id, count = raw.len(), "Fetched Discord history");
        Ok(History::new(
            parse_messages(raw, &self_id),
            HistoryOrder::NewestFirst,
        ))
    }

    async fn health_check(&self) -> Result<bool, ChannelError> {
        self.bot_user_id().await.map(|_| true)
    }
}

/// Convert raw API messages, keeping Discord's newest-first order.
fn parse_messages(raw: Vec<DiscordMessage>, self_id: &str) -> Vec<ChannelMessage> {
    raw.into_iter()
        .map(|m| {
            let is_self = m.author.id == self_id;
            ChannelMessage {
                id: m.id,
                chat_id: ChatId(m.channel_id),
                author_name: m
                    .author
                    .global_name
                    .or(m.author.username)
                    .unwrap_or_else(|| m.author.id.clone()),
                author_id: m.author.id,
                content: m.content,
                is_self,
                is_bot: m.author.bot.unwrap_or(false) || is_self,
                timestamp: m.timestamp.unwrap_or_default(),
            }
        })
        .collect()
}

async fn check_status(
    response: reqwest::Response,
    op: Op,
) -> Result<reqwest::Response, ChannelError> {
    let status = response.status().as_u16();
    if (200..300).contains(&status) {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body, op))
}

fn status_error(status: u16, body: &str, op: Op) -> ChannelError {
    match status {
        401 | 403 => ChannelError::Unauthorized("discord".into()),
        429 => {
            let retry = serde_json::from_str::<RateLimitBody>(body)
                .map(|b| b.retry_after.ceil() as u64)
                .unwrap_or(1);
            ChannelError::RateLimited {
                channel: "discord".into(),
                retry_after_secs: retry.max(1),
            }
        }
        _ => {
            warn!(status, body = %body, "Discord API error");
            let reason = format!("HTTP {status}: {body}");
            match op {
                Op::Fetch => fetch_failed(reason),
                Op::Send => delivery_failed(reason),
            }
        }
    }
}

fn fetch_failed(reason: String) -> ChannelError {
    ChannelError::FetchFailed {
        channel: "discord".into(),
        reason,
    }
}

fn delivery_failed(reason: String) -> ChannelError {
    ChannelError::DeliveryFailed {
        channel: "discord".into(),
        reason,
    }
}

/// Split a message into chunks of at most `max_chars` characters,
/// preferring newline boundaries. Empty text yields no chunks. A zero
/// `max_chars` is treated as 1.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let Some((limit, _)) = remaining.char_indices().nth(max_chars) else {
            chunks.push(remaining.to_string());
            break;
        };

        // Try to split at a newline within the limit
        let split_at = remaining[..limit]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(limit);

        chunks.push(remaining[..split_at].to_string());
        remaining = &remaining[split_at..];
    }

    chunks
}
