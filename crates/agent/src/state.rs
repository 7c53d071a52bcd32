//! States of the conversation loop.

use assist_core::error::AgentError;
use assist_core::message::ToolUse;

/// One conversation moves `AwaitingModel` ⇄ `HandlingToolCalls` until it
/// lands in `Done` or `Failed`. Both are terminal.
#[derive(Debug)]
pub enum LoopState {
    /// Next step is a model call with the full Turn sequence.
    AwaitingModel,
    /// The model asked for these tools, in this order.
    HandlingToolCalls(Vec<ToolUse>),
    Done,
    Failed(AgentError),
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AwaitingModel => "awaiting_model",
            Self::HandlingToolCalls(_) => "handling_tool_calls",
            Self::Done => "done",
            Self::Failed(_) => "failed",
        }
    }
}
