//! Message adapter: turns raw chat history into a model conversation.
//!
//! Each non-empty message becomes exactly one single-text Turn. Messages
//! written by this bot become `assistant` Turns, everything else `user`.
//! Output is always oldest-first, whatever order the platform returned.

use assist_core::channel::{ChannelMessage, ChatId, History};
use assist_core::error::AgentError;
use assist_core::message::{ConversationContext, Turn};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct MessageAdapter {
    /// Prefix user turns with "User <name> says: "
    attribute_authors: bool,
}

impl MessageAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_author_attribution(mut self, enabled: bool) -> Self {
        self.attribute_authors = enabled;
        self
    }

    /// Build a context from `history`, whatever order it arrived in.
    ///
    /// The destination is the chat of the first message as supplied.
    pub fn adapt(&self, history: &History) -> Result<ConversationContext, AgentError> {
        let destination: ChatId = history
            .messages
            .first()
            .map(|m| m.chat_id.clone())
            .ok_or(AgentError::EmptyConversation)?;

        let turns: Vec<Turn> = history
            .chronological()
            .filter(|m| !m.content.trim().is_empty())
            .map(|m| self.to_turn(m))
            .collect();

        if turns.is_empty() {
            return Err(AgentError::EmptyConversation);
        }

        debug!(
            chat_id = %destination,
            messages = history.messages.len(),
            turns = turns.len(),
            "Adapted chat history"
        );
        Ok(ConversationContext::new(destination, turns))
    }

    fn to_turn(&self, msg: &ChannelMessage) -> Turn {
        if msg.is_self {
            Turn::assistant(msg.content.clone())
        } else if self.attribute_authors {
            Turn::user(format!("User {} says: {}", msg.author_name, msg.content))
        } else {
            Turn::user(msg.content.clone())
        }
    }
}
