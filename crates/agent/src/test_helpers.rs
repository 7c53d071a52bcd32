//! Shared test doubles for loop and responder tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use assist_core::channel::{
    Channel, ChannelMessage, ChatId, History, HistoryOrder, OutputSink,
};
use assist_core::error::{ChannelError, ProviderError, ToolError};
use assist_core::message::Segment;
use assist_core::provider::{Provider, ProviderRequest, ProviderResponse, StopReason, Usage};
use assist_core::tool::{ParameterSpec, Tool, ToolParams, ToolRegistry};
use async_trait::async_trait;
use chrono::Utc;

/// A mock provider that plays back scripted results in order and records
/// every request it receives.
///
/// Panics if more calls are made than results provided.
pub struct ScriptedProvider {
    results: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        let next = self
            .results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no result for call #{call}"));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        next
    }
}

/// Build a response from raw segments.
pub fn response(content: Vec<Segment>, stop_reason: StopReason) -> ProviderResponse {
    ProviderResponse {
        id: "msg_test".into(),
        model: "mock-model".into(),
        content,
        stop_reason,
        usage: Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
        }),
    }
}

/// A plain final answer.
pub fn text_response(text: &str) -> ProviderResponse {
    response(vec![Segment::text(text)], StopReason::EndTurn)
}

/// A tool-use response, optionally preceded by text.
pub fn tool_response(text: &str, calls: Vec<Segment>) -> ProviderResponse {
    let mut content = Vec::new();
    if !text.is_empty() {
        content.push(Segment::text(text));
    }
    content.extend(calls);
    response(content, StopReason::ToolUse)
}

pub fn tool_use(id: &str, name: &str, input: serde_json::Value) -> Segment {
    Segment::ToolUse {
        id: id.into(),
        name: name.into(),
        input,
    }
}

/// Sink that keeps everything delivered to it.
#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<(ChatId, String)>>,
}

impl RecordingSink {
    pub fn texts(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn destinations(&self) -> Vec<ChatId> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(chat_id, _)| chat_id.clone())
            .collect()
    }
}

#[async_trait]
impl OutputSink for RecordingSink {
    async fn deliver(&self, destination: &ChatId, text: &str) {
        self.delivered
            .lock()
            .unwrap()
            .push((destination.clone(), text.to_string()));
    }
}

/// Clock stub with a fixed answer.
struct StubClock;

#[async_trait]
impl Tool for StubClock {
    fn name(&self) -> &str {
        "get_current_time"
    }
    fn description(&self) -> &str {
        "Get the current time"
    }
    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ParameterSpec::string("timezone", "IANA timezone").with_default("UTC")]
    }
    async fn execute(&self, params: ToolParams) -> Result<String, ToolError> {
        let tz = params.str("timezone").unwrap_or("UTC");
        Ok(format!("Current time in {tz}: 12:00"))
    }
}

struct BrokenTool;

#[async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &str {
        "broken"
    }
    fn description(&self) -> &str {
        "Always fails"
    }
    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![]
    }
    async fn execute(&self, _params: ToolParams) -> Result<String, ToolError> {
        Err(ToolError::execution("broken", "backend unavailable"))
    }
}

pub fn test_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(StubClock));
    registry.register(Box::new(BrokenTool));
    registry
}

/// In-memory channel with a fixed, newest-first history.
pub struct MockChannel {
    history: Vec<ChannelMessage>,
    fail_history: bool,
    sent: Mutex<Vec<(ChatId, String)>>,
}

impl MockChannel {
    /// `oldest_first` is reversed so the channel behaves like Discord.
    pub fn new(mut oldest_first: Vec<ChannelMessage>) -> Self {
        oldest_first.reverse();
        Self {
            history: oldest_first,
            fail_history: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_history: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl Channel for MockChannel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, chat_id: &ChatId, content: &str) -> Result<(), ChannelError> {
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.clone(), content.to_string()));
        Ok(())
    }

    async fn recent_messages(
        &self,
        _chat_id: &ChatId,
        limit: usize,
    ) -> Result<History, ChannelError> {
        if self.fail_history {
            return Err(ChannelError::FetchFailed {
                channel: "mock".into(),
                reason: "unreachable".into(),
            });
        }
        let messages = self.history.iter().take(limit).cloned().collect();
        Ok(History::new(messages, HistoryOrder::NewestFirst))
    }
}

pub fn chat_message(id: &str, content: &str, is_self: bool) -> ChannelMessage {
    ChannelMessage {
        id: id.into(),
        chat_id: ChatId::from("general"),
        author_id: if is_self { "bot".into() } else { "42".into() },
        author_name: if is_self { "assist".into() } else { "alice".into() },
        content: content.into(),
        is_self,
        is_bot: is_self,
        timestamp: Utc::now(),
    }
}
