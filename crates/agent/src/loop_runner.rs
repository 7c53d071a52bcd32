//! The conversation loop: model call → deliver text → run tools → repeat.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use assist_config::AppConfig;
use assist_core::channel::OutputSink;
use assist_core::error::{AgentError, ProviderError, TOOL_ERROR_APOLOGY};
use assist_core::event::{DomainEvent, EventBus};
use assist_core::message::{ConversationContext, Role, Segment, ToolUse, Turn};
use assist_core::provider::{Provider, ProviderRequest, StopReason, ToolDefinition};
use assist_core::tool::ToolRegistry;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::prompt::SYSTEM_PROMPT;
use crate::state::LoopState;

const DEFAULT_MAX_TOKENS: u32 = 500;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Counters for one successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Model calls made
    pub rounds: u32,
    /// Tools invoked
    pub tool_invocations: u32,
    /// Texts handed to the sink
    pub deliveries: u32,
}

/// Drives one conversation through the model and tools until it
/// finishes or fails.
///
/// An `AgentLoop` holds no per-conversation state, so one instance can run
/// any number of conversations concurrently.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    system_prompt: String,

    max_tokens: u32,

    temperature: f32,

    /// Tool registry, shared read-only
    tools: Arc<ToolRegistry>,

    /// Event bus for domain events
    event_bus: Arc<EventBus>,

    /// Upper bound on model calls per run. None = unbounded.
    max_rounds: Option<u32>,

    /// Whole-run time limit
    deadline: Option<Duration>,
}

/// Per-run bookkeeping threaded through the state handlers.
struct Run<'a> {
    context: &'a mut ConversationContext,
    sink: &'a dyn OutputSink,
    cancel: &'a CancellationToken,
    deadline: Option<tokio::time::Instant>,
    tools: Vec<ToolDefinition>,
    summary: RunSummary,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            tools,
            event_bus,
            max_rounds: None,
            deadline: None,
        }
    }

    /// Create a loop configured from `[anthropic]` and `[agent]`.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let mut agent = Self::new(provider, &config.anthropic.model, tools, event_bus)
            .with_max_tokens(config.anthropic.max_tokens)
            .with_temperature(config.anthropic.temperature);

        if let Some(prompt) = &config.agent.system_prompt_override {
            agent = agent.with_system_prompt(prompt.as_str());
        }
        if let Some(rounds) = config.agent.max_rounds {
            agent = agent.with_max_rounds(rounds);
        }
        if let Some(secs) = config.agent.conversation_timeout_secs {
            agent = agent.with_deadline(Duration::from_secs(secs));
        }
        agent
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of model calls per run.
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = Some(max);
        self
    }

    /// Fail the run with `DeadlineExceeded` once this much time has passed.
    pub fn with_deadline(mut self, limit: Duration) -> Self {
        self.deadline = Some(limit);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run the conversation to completion.
    ///
    /// Text is delivered to `sink` as the model produces it. Turns the model
    /// and tools add are appended to `context`. The only failure the loop
    /// reports to the sink itself is a tool error.
    pub async fn run(
        &self,
        context: &mut ConversationContext,
        sink: &dyn OutputSink,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, AgentError> {
        if context.is_empty() {
            return Err(AgentError::EmptyConversation);
        }

        let chat_id = context.destination().to_string();
        info!(
            chat_id = %chat_id,
            turns = context.len(),
            model = %self.model,
            "Processing conversation"
        );

        let mut run = Run {
            context,
            sink,
            cancel,
            deadline: self.deadline.map(|d| tokio::time::Instant::now() + d),
            // Fixed for the whole run
            tools: self.tools.schemas().collect(),
            summary: RunSummary::default(),
        };

        let mut state = LoopState::AwaitingModel;
        while !state.is_terminal() {
            debug!(chat_id = %chat_id, state = state.label(), round = run.summary.rounds, "Loop step");
            state = match state {
                LoopState::AwaitingModel => self.await_model(&mut run).await,
                LoopState::HandlingToolCalls(requests) => {
                    self.handle_tool_calls(&mut run, requests).await
                }
                terminal => terminal,
            };
        }

        let summary = run.summary;
        let result = match state {
            LoopState::Failed(e) => Err(e),
            _ => Ok(summary),
        };

        let outcome = match &result {
            Ok(_) => "done".to_string(),
            Err(e) => e.to_string(),
        };
        match &result {
            Ok(s) => info!(
                chat_id = %chat_id,
                rounds = s.rounds,
                tools = s.tool_invocations,
                "Conversation finished"
            ),
            Err(e) => warn!(chat_id = %chat_id, error = %e, "Conversation failed"),
        }
        self.event_bus.publish(DomainEvent::ConversationFinished {
            chat_id,
            rounds: summary.rounds,
            outcome,
            timestamp: Utc::now(),
        });

        result
    }

    async fn await_model(&self, run: &mut Run<'_>) -> LoopState {
        if run.cancel.is_cancelled() {
            return LoopState::Failed(AgentError::Cancelled);
        }
        if let Some(max) = self.max_rounds
            && run.summary.rounds >= max
        {
            return LoopState::Failed(AgentError::MaxRoundsExceeded { rounds: max });
        }

        run.summary.rounds += 1;
        let request = ProviderRequest {
            model: self.model.clone(),
            system: self.system_prompt.clone(),
            turns: run.context.turns().to_vec(),
            tools: run.tools.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = match guarded(self.provider.complete(request), run.cancel, run.deadline).await
        {
            Err(e) => return LoopState::Failed(e),
            Ok(Err(e)) => return LoopState::Failed(AgentError::ModelCall(e)),
            Ok(Ok(response)) => response,
        };

        self.event_bus.publish(DomainEvent::ResponseGenerated {
            chat_id: run.context.destination().to_string(),
            model: response.model.clone(),
            stop_reason: response.stop_reason.to_string(),
            tokens_used: response.usage.map(|u| u.total()).unwrap_or(0),
            timestamp: Utc::now(),
        });

        if response.content.is_empty() {
            return LoopState::Failed(AgentError::ModelCall(ProviderError::EmptyResponse));
        }

        let text = response.texts().join("\n");
        let requests = response.tool_uses();
        debug!(
            stop_reason = %response.stop_reason,
            text_len = text.len(),
            tool_requests = requests.len(),
            "Model responded"
        );

        // Delivered before any tool in this round runs
        if !text.is_empty() {
            run.sink.deliver(run.context.destination(), &text).await;
            run.summary.deliveries += 1;
        }

        if response.stop_reason == StopReason::ToolUse && !requests.is_empty() {
            // Blank text blocks are rejected by the API when sent back
            let segments = response
                .content
                .into_iter()
                .filter(|s| s.as_text().is_none_or(|t| !t.trim().is_empty()))
                .collect();
            run.context.push(Turn {
                role: Role::Assistant,
                segments,
            });
            LoopState::HandlingToolCalls(requests)
        } else if !text.is_empty() {
            run.context.push(Turn::assistant(text));
            LoopState::Done
        } else {
            LoopState::Failed(AgentError::NoResponseContent {
                stop_reason: response.stop_reason,
            })
        }
    }

    async fn handle_tool_calls(&self, run: &mut Run<'_>, requests: Vec<ToolUse>) -> LoopState {
        let mut results = Vec::with_capacity(requests.len());

        for request in requests {
            debug!(tool = %request.name, id = %request.id, "Invoking tool");
            let start = Instant::now();
            let outcome = guarded(
                self.tools.invoke(&request.name, &request.input),
                run.cancel,
                run.deadline,
            )
            .await;
            let duration_ms = start.elapsed().as_millis() as u64;
            run.summary.tool_invocations += 1;

            let output = match outcome {
                Err(e) => return LoopState::Failed(e),
                Ok(result) => {
                    self.event_bus.publish(DomainEvent::ToolExecuted {
                        tool_name: request.name.clone(),
                        success: result.is_ok(),
                        duration_ms,
                        timestamp: Utc::now(),
                    });
                    result
                }
            };

            match output {
                Ok(content) => results.push(Segment::tool_result(request.id, content)),
                Err(e) => {
                    warn!(tool = %request.name, error = %e, "Tool failed, ending conversation");
                    run.sink
                        .deliver(run.context.destination(), TOOL_ERROR_APOLOGY)
                        .await;
                    run.summary.deliveries += 1;
                    return LoopState::Failed(AgentError::Tool(e));
                }
            }
        }

        run.context.push(Turn::tool_results(results));
        LoopState::AwaitingModel
    }
}

/// Race `fut` against cancellation and the run deadline.
async fn guarded<F: Future>(
    fut: F,
    cancel: &CancellationToken,
    deadline: Option<tokio::time::Instant>,
) -> Result<F::Output, AgentError> {
    let expired = async {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AgentError::Cancelled),
        _ = expired => Err(AgentError::DeadlineExceeded),
        out = fut => Ok(out),
    }
}
