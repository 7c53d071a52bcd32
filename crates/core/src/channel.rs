//! Channel and OutputSink traits — the abstraction over chat platforms.
//!
//! A Channel knows how to fetch recent history for a chat and post text to
//! it. The conversation loop never sees a Channel directly: it only gets an
//! `OutputSink` to deliver generated text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// Identifier of the chat (Discord channel, DM, CLI session) output goes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub String);

impl ChatId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChatId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ChatId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raw message as the chat platform reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Platform message id
    pub id: String,

    /// The chat this message was posted in
    pub chat_id: ChatId,

    /// Sender identifier (platform-specific user ID)
    pub author_id: String,

    /// Human-readable sender name
    pub author_name: String,

    /// The text content (may be empty, e.g. attachment-only messages)
    pub content: String,

    /// Authored by this bot
    #[serde(default)]
    pub is_self: bool,

    /// Authored by any bot account, including this one
    #[serde(default)]
    pub is_bot: bool,

    pub timestamp: DateTime<Utc>,
}

/// Which end of a history slice is the oldest message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOrder {
    OldestFirst,
    /// Discord's REST API returns channel history newest-first.
    NewestFirst,
}

/// A slice of chat history with its ordering made explicit.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    pub messages: Vec<ChannelMessage>,
    pub order: HistoryOrder,
}

impl History {
    pub fn new(messages: Vec<ChannelMessage>, order: HistoryOrder) -> Self {
        Self { messages, order }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent message, regardless of ordering.
    pub fn latest(&self) -> Option<&ChannelMessage> {
        match self.order {
            HistoryOrder::OldestFirst => self.messages.last(),
            HistoryOrder::NewestFirst => self.messages.first(),
        }
    }

    /// Messages in chronological order.
    pub fn chronological(&self) -> Box<dyn Iterator<Item = &ChannelMessage> + '_> {
        match self.order {
            HistoryOrder::OldestFirst => Box::new(self.messages.iter()),
            HistoryOrder::NewestFirst => Box::new(self.messages.iter().rev()),
        }
    }
}

/// Where the conversation loop delivers generated text.
///
/// Delivery is best-effort: implementations log failures instead of
/// returning them.
#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn deliver(&self, destination: &ChatId, text: &str);
}

/// The core Channel trait.
///
/// Implementations handle platform-specific transport, message formatting,
/// and authentication.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g., "discord", "cli").
    fn name(&self) -> &str;

    /// Post a message to a chat.
    async fn send(&self, chat_id: &ChatId, content: &str) -> Result<(), ChannelError>;

    /// Fetch up to `limit` recent messages from a chat.
    async fn recent_messages(&self, chat_id: &ChatId, limit: usize)
    -> Result<History, ChannelError>;

    /// Is the channel reachable and authorised?
    async fn health_check(&self) -> Result<bool, ChannelError> {
        Ok(true)
    }
}
