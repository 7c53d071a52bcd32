//! Adapts a `Channel` into the `OutputSink` the conversation loop uses.

use std::sync::Arc;

use assist_core::channel::{Channel, ChatId, OutputSink};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Best-effort delivery through a channel: send failures are logged, not
/// returned.
pub struct ChannelSink {
    channel: Arc<dyn Channel>,
}

impl ChannelSink {
    pub fn new(channel: Arc<dyn Channel>) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl OutputSink for ChannelSink {
    async fn deliver(&self, destination: &ChatId, text: &str) {
        match self.channel.send(destination, text).await {
            Ok(()) => debug!(
                channel = self.channel.name(),
                chat_id = %destination,
                len = text.len(),
                "Delivered reply"
            ),
            Err(e) => warn!(
                channel = self.channel.name(),
                chat_id = %destination,
                error = %e,
                "Failed to deliver reply"
            ),
        }
    }
}
