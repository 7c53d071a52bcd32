//! The conversation loop, the heart of discord-assist.
//!
//! One exchange runs as:
//!
//! 1. **Fetch** recent chat history (from any channel)
//! 2. **Adapt** it into role-tagged Turns, oldest first
//! 3. **Send to the model** with the system prompt and tool schemas
//! 4. **Deliver** any text the model produced
//! 5. **If tool calls**: run them in order, append results, loop back to step 3
//!
//! The loop ends when the model answers without tool calls, or fails.

pub mod adapter;
pub mod loop_runner;
pub mod prompt;
pub mod responder;
pub mod state;

#[cfg(test)]
mod test_helpers;

pub use adapter::MessageAdapter;
pub use loop_runner::{AgentLoop, RunSummary};
pub use prompt::SYSTEM_PROMPT;
pub use responder::{Responder, ResponderError};
pub use state::LoopState;
