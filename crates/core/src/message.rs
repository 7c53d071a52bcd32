//! Turn, Segment, and ConversationContext domain types.
//!
//! These are the value objects the conversation loop works on:
//! Channel history → adapter builds Turns → loop appends Turns → provider reads them.

use serde::{Deserialize, Serialize};

use crate::channel::ChatId;

/// The role of a Turn in the model conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A human in the chat, or tool results handed back to the model
    User,
    /// The bot itself
    Assistant,
}

/// One piece of content within a Turn.
///
/// The serialized shape matches the Anthropic content-block format, so a
/// Turn can be sent to the backend verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// The text, if this is a text segment.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    /// The tool invocation request, if this is one.
    pub fn as_tool_use(&self) -> Option<ToolUse> {
        match self {
            Self::ToolUse { id, name, input } => Some(ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            }),
            _ => None,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUse {
    /// Unique invocation id (matches the model's `tool_use.id`)
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Raw input payload, validated by the registry
    pub input: serde_json::Value,
}

/// One role-tagged unit of conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    #[serde(rename = "content")]
    pub segments: Vec<Segment>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            segments: vec![Segment::text(text)],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            segments: vec![Segment::text(text)],
        }
    }

    /// A user Turn carrying tool results, in the given order.
    pub fn tool_results(results: Vec<Segment>) -> Self {
        Self {
            role: Role::User,
            segments: results,
        }
    }

    /// Concatenated text of all text segments, joined by newlines.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .filter_map(Segment::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All tool invocation requests in this Turn, in order.
    pub fn tool_uses(&self) -> Vec<ToolUse> {
        self.segments.iter().filter_map(Segment::as_tool_use).collect()
    }
}

/// The loop-owned state for one end-to-end exchange.
///
/// Turns can only be appended; existing Turns are never exposed mutably.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationContext {
    destination: ChatId,
    turns: Vec<Turn>,
}

impl ConversationContext {
    pub fn new(destination: ChatId, turns: Vec<Turn>) -> Self {
        Self { destination, turns }
    }

    /// Where output for this conversation is delivered.
    pub fn destination(&self) -> &ChatId {
        &self.destination
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a Turn.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Whether every tool invocation is answered by exactly one result in the
    /// Turn immediately after it, and no result references an unknown id.
    pub fn is_balanced(&self) -> bool {
        let mut pending: Vec<String> = Vec::new();
        for turn in &self.turns {
            let results: Vec<&str> = turn
                .segments
                .iter()
                .filter_map(|s| match s {
                    Segment::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
                    _ => None,
                })
                .collect();

            if !pending.is_empty() || !results.is_empty() {
                let mut expected: Vec<&str> = pending.iter().map(String::as_str).collect();
                let mut answered = results.clone();
                expected.sort_unstable();
                answered.sort_unstable();
                if expected != answered {
                    return false;
                }
            }

            pending = turn.tool_uses().into_iter().map(|t| t.id).collect();
        }
        pending.is_empty()
    }
}
