//! # discord-assist core
//!
//! Domain types, traits, and error definitions for the discord-assist
//! tool-using chat assistant. This crate has **no framework dependencies**:
//! it defines the model every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Each external collaborator (model backend, chat platform, output sink,
//! tool) is a trait here. Implementations live in their own crates, which
//! keeps the conversation loop testable with scripted mocks.

pub mod channel;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use channel::{Channel, ChannelMessage, ChatId, History, HistoryOrder, OutputSink};
pub use error::{AgentError, ChannelError, ProviderError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{ConversationContext, Role, Segment, ToolUse, Turn};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StopReason, ToolDefinition, Usage};
pub use tool::{ParamKind, ParameterSpec, Tool, ToolParams, ToolRegistry};
