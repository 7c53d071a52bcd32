//! Provider trait — the abstraction over LLM backends.
//!
//! A Provider takes the full Turn sequence plus the system prompt and the
//! advertised tools, and returns one complete response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{Segment, ToolUse, Turn};

/// One request to the model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "claude-3-5-sonnet-latest")
    pub model: String,

    /// System instruction text
    pub system: String,

    /// The conversation so far, oldest first
    pub turns: Vec<Turn>,

    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub input_schema: serde_json::Value,
}

/// Why the backend stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::EndTurn => "end_turn",
            Self::ToolUse => "tool_use",
            Self::MaxTokens => "max_tokens",
            Self::StopSequence => "stop_sequence",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Backend message id
    pub id: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Content segments, in the order the model produced them
    pub content: Vec<Segment>,

    pub stop_reason: StopReason,

    /// Token usage statistics
    pub usage: Option<Usage>,
}

impl ProviderResponse {
    /// Non-empty text segments, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(Segment::as_text)
            .filter(|t| !t.trim().is_empty())
            .collect()
    }

    /// Tool invocation requests, in order.
    pub fn tool_uses(&self) -> Vec<ToolUse> {
        self.content.iter().filter_map(Segment::as_tool_use).collect()
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// The core Provider trait.
///
/// The conversation loop calls `complete()` without knowing which backend
/// is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// Can we reach the provider?
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_reason_parses_known_and_unknown() {
        let r: StopReason = serde_json::from_str("\"tool_use\"").unwrap();
        assert_eq!(r, StopReason::ToolUse);
        let r: StopReason = serde_json::from_str("\"pause_turn\"").unwrap();
        assert_eq!(r, StopReason::Other);
        assert_eq!(StopReason::EndTurn.to_string(), "end_turn");
    }

    #[test]
    fn response_partitions_content() {
        let resp = ProviderResponse {
            id: "msg_1".into(),
            model: "mock".into(),
            content: vec![
                Segment::text("Let me check."),
                Segment::ToolUse {
                    id: "toolu_1".into(),
                    name: "get_weather".into(),
                    input: serde_json::json!({"location": "Lima"}),
                },
                Segment::text("   "),
            ],
            stop_reason: StopReason::ToolUse,
            usage: None,
        };
        assert_eq!(resp.texts(), vec!["Let me check."]);
        assert_eq!(resp.tool_uses()[0].name, "get_weather");
    }

    #[test]
    fn usage_total_saturates() {
        let usage = Usage {
            input_tokens: u32::MAX,
            output_tokens: 10,
        };
        assert_eq!(usage.total(), u32::MAX);
        let usage = Usage {
            input_tokens: 10,
            output_tokens: 5,
        };
        assert_eq!(usage.total(), 15);
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "search_web".into(),
            description: "Search the web".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "The search query" }
                },
                "required": ["query"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("search_web"));
        assert!(json.contains("input_schema"));
    }
}
