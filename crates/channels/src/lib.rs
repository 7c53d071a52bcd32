//! Chat channel implementations for discord-assist.
//!
//! Each channel fetches recent history for a chat and posts text back to
//! it. Channels are trait-based and platform-agnostic.
//!
//! Available channels:
//! - **Discord** — Discord REST API (history fetch + message send)
//! - **CLI** — Interactive terminal chat (stdin/stdout) with a local transcript
//!
//! `ChannelSink` adapts any channel into the `OutputSink` the conversation
//! loop delivers to.

pub mod cli;
pub mod discord;
pub mod sink;

pub use cli::CliChannel;
pub use discord::DiscordChannel;
pub use sink::ChannelSink;
