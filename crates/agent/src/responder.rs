//! Reacts to an incoming chat message with a full exchange.
//!
//! Fetches recent history for the chat, adapts it, runs the conversation
//! loop with the channel as output sink, and phrases any failure the loop
//! did not already report.

use std::sync::Arc;

use assist_channels::ChannelSink;
use assist_config::AppConfig;
use assist_core::channel::{Channel, ChannelMessage, ChatId};
use assist_core::error::{AgentError, ChannelError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapter::MessageAdapter;
use crate::loop_runner::{AgentLoop, RunSummary};

const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    #[error("Failed to fetch chat history: {0}")]
    History(#[from] ChannelError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

pub struct Responder {
    channel: Arc<dyn Channel>,
    agent: AgentLoop,
    adapter: MessageAdapter,
    history_limit: usize,
}

impl Responder {
    pub fn new(channel: Arc<dyn Channel>, agent: AgentLoop) -> Self {
        Self {
            channel,
            agent,
            adapter: MessageAdapter::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Apply `[discord].history_limit` and `[agent].attribute_authors`.
    pub fn configured(mut self, config: &AppConfig) -> Self {
        self.history_limit = config.discord.history_limit;
        self.adapter = self
            .adapter
            .with_author_attribution(config.agent.attribute_authors);
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Respond to `trigger`. Messages written by bots (including this one)
    /// are ignored and yield `Ok(None)`.
    pub async fn handle(
        &self,
        trigger: &ChannelMessage,
        cancel: &CancellationToken,
    ) -> Result<Option<RunSummary>, ResponderError> {
        if trigger.is_bot {
            debug!(chat_id = %trigger.chat_id, author = %trigger.author_id, "Ignoring bot message");
            return Ok(None);
        }
        self.handle_chat(&trigger.chat_id, cancel).await
    }

    /// Respond to whatever is most recent in `chat_id`.
    ///
    /// Nothing is done when the newest message was written by a bot, so the
    /// assistant never answers itself.
    pub async fn handle_chat(
        &self,
        chat_id: &ChatId,
        cancel: &CancellationToken,
    ) -> Result<Option<RunSummary>, ResponderError> {
        let history = self
            .channel
            .recent_messages(chat_id, self.history_limit)
            .await?;

        match history.latest() {
            None => {
                debug!(chat_id = %chat_id, "No history, nothing to answer");
                return Ok(None);
            }
            Some(latest) if latest.is_bot => {
                debug!(chat_id = %chat_id, "Latest message is from a bot, skipping");
                return Ok(None);
            }
            Some(_) => {}
        }

        let mut context = match self.adapter.adapt(&history) {
            Ok(context) => context,
            Err(AgentError::EmptyConversation) => {
                debug!(chat_id = %chat_id, "History has no text, nothing to answer");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let sink = ChannelSink::new(self.channel.clone());
        match self.agent.run(&mut context, &sink, cancel).await {
            Ok(summary) => {
                info!(
                    chat_id = %chat_id,
                    rounds = summary.rounds,
                    replies = summary.deliveries,
                    "Replied"
                );
                Ok(Some(summary))
            }
            Err(e) => {
                if !e.is_delivered()
                    && let Some(text) = e.user_message()
                    && let Err(send_err) = self.channel.send(chat_id, text).await
                {
                    warn!(chat_id = %chat_id, error = %send_err, "Failed to send apology");
                }
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use assist_core::error::{GENERIC_APOLOGY, ProviderError, TOOL_ERROR_APOLOGY};
    use assist_core::event::EventBus;

    fn responder(channel: Arc<MockChannel>, provider: Arc<ScriptedProvider>) -> Responder {
        let agent = AgentLoop::new(
            provider,
            "mock-model",
            Arc::new(test_registry()),
            Arc::new(EventBus::default()),
        );
        Responder::new(channel, agent)
    }

    #[tokio::test]
    async fn replies_to_latest_user_message() {
        let channel = Arc::new(MockChannel::new(vec![
            chat_message("1", "hi", false),
            chat_message("2", "hello!", true),
            chat_message("3", "how are you?", false),
        ]));
        let provider = Arc::new(ScriptedProvider::new(vec![text_response("Great, thanks!")]));
        let trigger = chat_message("3", "how are you?", false);

        let summary = responder(channel.clone(), provider.clone())
            .handle(&trigger, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.map(|s| s.rounds), Some(1));
        assert_eq!(channel.sent(), vec!["Great, thanks!"]);

        // History reached the model oldest-first
        let turns = &provider.requests()[0].turns;
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].text(), "hi");
        assert_eq!(turns[2].text(), "how are you?");
    }

    #[tokio::test]
    async fn ignores_bot_authors() {
        let channel = Arc::new(MockChannel::new(vec![chat_message("1", "hi", false)]));
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let mut trigger = chat_message("2", "beep", false);
        trigger.is_bot = true;

        let result = responder(channel.clone(), provider.clone())
            .handle(&trigger, &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(provider.call_count(), 0);
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn skips_when_bot_spoke_last() {
        let channel = Arc::new(MockChannel::new(vec![
            chat_message("1", "hi", false),
            chat_message("2", "hello!", true),
        ]));
        let provider = Arc::new(ScriptedProvider::new(vec![]));

        let result = responder(channel, provider.clone())
            .handle_chat(&ChatId::from("general"), &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn history_limit_is_applied() {
        let channel = Arc::new(MockChannel::new(vec![
            chat_message("1", "old", false),
            chat_message("2", "older reply", true),
            chat_message("3", "newest", false),
        ]));
        let provider = Arc::new(ScriptedProvider::new(vec![text_response("ok")]));

        responder(channel, provider.clone())
            .with_history_limit(1)
            .handle_chat(&ChatId::from("general"), &CancellationToken::new())
            .await
            .unwrap();

        let turns = &provider.requests()[0].turns;
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].text(), "newest");
    }

    #[tokio::test]
    async fn backend_failure_sends_generic_apology() {
        let channel = Arc::new(MockChannel::new(vec![chat_message("1", "hi", false)]));
        let provider = Arc::new(ScriptedProvider::with_results(vec![Err(
            ProviderError::AuthenticationFailed("bad key".into()),
        )]));

        let err = responder(channel.clone(), provider)
            .handle_chat(&ChatId::from("general"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ResponderError::Agent(AgentError::ModelCall(_))));
        assert_eq!(channel.sent(), vec![GENERIC_APOLOGY]);
    }

    #[tokio::test]
    async fn tool_failure_apologises_once() {
        let channel = Arc::new(MockChannel::new(vec![chat_message("1", "do it", false)]));
        let provider = Arc::new(ScriptedProvider::new(vec![tool_response(
            "",
            vec![tool_use("t1", "nonexistent-tool", serde_json::json!({}))],
        )]));

        let err = responder(channel.clone(), provider)
            .handle_chat(&ChatId::from("general"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ResponderError::Agent(AgentError::Tool(_))));
        assert_eq!(channel.sent(), vec![TOOL_ERROR_APOLOGY]);
    }

    #[tokio::test]
    async fn cancellation_is_silent() {
        let channel = Arc::new(MockChannel::new(vec![chat_message("1", "hi", false)]));
        let provider = Arc::new(ScriptedProvider::new(vec![text_response("never")]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = responder(channel.clone(), provider)
            .handle_chat(&ChatId::from("general"), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ResponderError::Agent(AgentError::Cancelled)));
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn history_failure_is_reported() {
        let channel = Arc::new(MockChannel::failing());
        let provider = Arc::new(ScriptedProvider::new(vec![]));

        let err = responder(channel.clone(), provider)
            .handle_chat(&ChatId::from("general"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ResponderError::History(_)));
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn configured_applies_settings() {
        let mut config = AppConfig::default();
        config.discord.history_limit = 7;
        config.agent.attribute_authors = true;

        let channel = Arc::new(MockChannel::new(vec![chat_message("1", "hi", false)]));
        let provider = Arc::new(ScriptedProvider::new(vec![text_response("hey")]));

        let r = responder(channel, provider.clone()).configured(&config);
        assert_eq!(r.history_limit, 7);

        r.handle_chat(&ChatId::from("general"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(provider.requests()[0].turns[0].text(), "User alice says: hi");
    }
}
