//! Error types for the discord-assist domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `AgentError` is what the
//! conversation loop hands back to its caller.

use thiserror::Error;

use crate::provider::StopReason;

/// Generic apology sent by callers when the model backend fails.
pub const GENERIC_APOLOGY: &str =
    "I'm sorry, I'm having trouble processing your message right now. 😅";

/// The single apology the conversation loop delivers itself, when a tool fails.
pub const TOOL_ERROR_APOLOGY: &str =
    "I'm sorry, something went wrong while I was using one of my tools, so I couldn't finish that request. 😅";

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider returned no content")]
    EmptyResponse,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Fetching history from {channel} failed: {reason}")]
    FetchFailed { channel: String, reason: String },

    #[error("Authentication with {0} failed")]
    Unauthorized(String),

    #[error("Rate limited by {channel}, retry after {retry_after_secs}s")]
    RateLimited { channel: String, retry_after_secs: u64 },

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// Registry-level failures. All three end the conversation loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid input for {tool_name}: {reason}")]
    InvalidInput { tool_name: String, reason: String },

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

impl ToolError {
    pub fn invalid_input(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            tool_name: tool_name.into(),
            reason: reason.into(),
        }
    }

    pub fn execution(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool_name: tool_name.into(),
            reason: reason.into(),
        }
    }

    /// Name of the tool involved.
    pub fn tool_name(&self) -> &str {
        match self {
            Self::UnknownTool(name) => name,
            Self::InvalidInput { tool_name, .. } | Self::ExecutionFailed { tool_name, .. } => {
                tool_name
            }
        }
    }
}

/// Terminal failure of one conversation loop execution.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Conversation has no usable messages")]
    EmptyConversation,

    #[error("Model call failed: {0}")]
    ModelCall(#[from] ProviderError),

    #[error("Model returned neither text nor tool calls (stop reason: {stop_reason})")]
    NoResponseContent { stop_reason: StopReason },

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Conversation was cancelled")]
    Cancelled,

    #[error("Conversation deadline exceeded")]
    DeadlineExceeded,

    #[error("Gave up after {rounds} model rounds")]
    MaxRoundsExceeded { rounds: u32 },
}

impl AgentError {
    /// Text to show the end user for this failure, if any.
    ///
    /// Empty conversations and cancellations are not answered.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::Tool(_) => Some(TOOL_ERROR_APOLOGY),
            Self::EmptyConversation | Self::Cancelled => None,
            Self::ModelCall(_)
            | Self::NoResponseContent { .. }
            | Self::DeadlineExceeded
            | Self::MaxRoundsExceeded { .. } => Some(GENERIC_APOLOGY),
        }
    }

    /// Whether the loop already delivered `user_message()` to the sink.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Tool(_))
    }
}
