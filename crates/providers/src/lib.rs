//! Model backend implementations for discord-assist.
//!
//! All providers implement the `assist_core::Provider` trait.

pub mod anthropic;

pub use anthropic::AnthropicProvider;
