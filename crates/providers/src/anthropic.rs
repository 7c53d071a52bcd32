//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly.
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks
//!
//! Turns are sent verbatim: `Turn` and `Segment` already serialize as
//! Anthropic messages and content blocks.

use std::time::Duration;

use assist_config::AppConfig;
use assist_core::error::ProviderError;
use assist_core::message::{Segment, Turn};
use assist_core::provider::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
        })
    }

    /// Build from the `[anthropic]` section of the app config.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let key = config
            .require_anthropic_key()
            .map_err(|e| ProviderError::NotConfigured(e.to_string()))?;

        let mut provider = Self::new(key)?
            .with_timeout(Duration::from_secs(config.anthropic.request_timeout_secs))?;
        if let Some(url) = &config.anthropic.base_url {
            provider = provider.with_base_url(url.as_str());
        }
        Ok(provider)
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the per-request HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ProviderError> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    fn build_body<'a>(request: &'a ProviderRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &request.model,
            system: Some(request.system.as_str()).filter(|s| !s.is_empty()),
            messages: &request.turns,
            tools: &request.tools,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// Map a non-success HTTP status to the provider error taxonomy.
    fn status_error(status: u16, body: String) -> ProviderError {
        match status {
            429 => ProviderError::RateLimited {
                retry_after_secs: 5,
            },
            401 | 403 => ProviderError::AuthenticationFailed("Invalid Anthropic API key".into()),
            _ => {
                warn!(status, body = %body, "Anthropic API error");
                ProviderError::ApiError {
                    status_code: status,
                    message: body,
                }
            }
        }
    }

    /// Convert Anthropic API response to our ProviderResponse.
    ///
    /// Thinking and unrecognised blocks are dropped; text and tool_use keep
    /// their original order.
    fn response_to_provider_response(resp: AnthropicResponse) -> ProviderResponse {
        let content = resp
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(Segment::Text { text }),
                ResponseContentBlock::ToolUse { id, name, input } => {
                    Some(Segment::ToolUse { id, name, input })
                }
                ResponseContentBlock::Thinking { .. } | ResponseContentBlock::Unsupported => {
                    trace!("Dropping non-conversational content block");
                    None
                }
            })
            .collect();

        ProviderResponse {
            id: resp.id,
            model: resp.model,
            content,
            stop_reason: parse_stop_reason(resp.stop_reason.as_deref()),
            usage: resp.usage.map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        }
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))
}

fn parse_stop_reason(raw: Option<&str>) -> StopReason {
    match raw {
        Some("end_turn") => StopReason::EndTurn,
        Some("tool_use") => StopReason::ToolUse,
        Some("max_tokens") => StopReason::MaxTokens,
        Some("stop_sequence") => StopReason::StopSequence,
        _ => StopReason::Other,
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

#[async_trait]
impl assist_core::Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = Self::build_body(&request);

        debug!(
            provider = "anthropic",
            model = %request.model,
            turns = request.turns.len(),
            tools = request.tools.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, error_body));
        }

        let api_resp: AnthropicResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::ApiError {
                    status_code: 200,
                    message: format!("Failed to parse Anthropic response: {e}"),
                })?;

        Ok(Self::response_to_provider_response(api_resp))
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        // Listing models is free and still verifies the key
        let url = format!("{}/v1/models?limit=1", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status().as_u16() {
            401 | 403 => Err(ProviderError::AuthenticationFailed(
                "Invalid Anthropic API key".into(),
            )),
            status => Ok((200..300).contains(&status)),
        }
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [Turn],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
    max_tokens: u32,
    temperature: f32,
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    id: String,
    model: String,
    #[serde(default)]
    content: Vec<ResponseContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "thinking")]
    Thinking {
        #[allow(dead_code)]
        thinking: String,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assist_core::Provider;
    use assist_core::message::Role;

    fn request(turns: Vec<Turn>, tools: Vec<ToolDefinition>) -> ProviderRequest {
        ProviderRequest {
            model: "claude-3-5-sonnet-latest".into(),
            system: "Be brief".into(),
            turns,
            tools,
            max_tokens: 500,
            temperature: 0.7,
        }
    }

    #[test]
    fn constructor() {
        let provider = AnthropicProvider::new("sk-ant-test").unwrap();
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn constructor_with_base_url() {
        let provider = AnthropicProvider::new("sk-ant-test")
            .unwrap()
            .with_base_url("https://custom.proxy.com/");
        assert_eq!(provider.base_url, "https://custom.proxy.com");
    }

    #[test]
    fn from_config_requires_key() {
        let mut config = AppConfig::default();
        assert!(matches!(
            AnthropicProvider::from_config(&config),
            Err(ProviderError::NotConfigured(_))
        ));

        config.anthropic.api_key = Some("sk-ant-test".into());
        config.anthropic.base_url = Some("http://localhost:8080/".into());
        let provider = AnthropicProvider::from_config(&config).unwrap();
        assert_eq!(provider.base_url, "http://localhost:8080");
    }

    #[test]
    fn body_puts_system_top_level_and_turns_verbatim() {
        let turns = vec![
            Turn::user("What time is it?"),
            Turn {
                role: Role::Assistant,
                segments: vec![
                    Segment::text("Checking"),
                    Segment::ToolUse {
                        id: "toolu_1".into(),
                        name: "get_current_time".into(),
                        input: serde_json::json!({"timezone": "UTC"}),
                    },
                ],
            },
            Turn::tool_results(vec![Segment::tool_result("toolu_1", "12:00 UTC")]),
        ];
        let req = request(turns, vec![]);
        let body = serde_json::to_value(AnthropicProvider::build_body(&req)).unwrap();

        assert_eq!(body["system"], "Be brief");
        assert!(body.get("tools").is_none());
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(body["messages"][1]["content"][1]["type"], "tool_use");
        assert_eq!(body["messages"][2]["role"], "user");
        assert_eq!(body["messages"][2]["content"][0]["type"], "tool_result");
        assert_eq!(body["messages"][2]["content"][0]["tool_use_id"], "toolu_1");
    }

    #[test]
    fn body_includes_tools_when_present() {
        let tools = vec![ToolDefinition {
            name: "get_weather".into(),
            description: "Weather".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {"location": {"type": "string"}},
                "required": ["location"]
            }),
        }];
        let mut req = request(vec![Turn::user("hi")], tools);
        req.system = String::new();
        let body = serde_json::to_value(AnthropicProvider::build_body(&req)).unwrap();
        assert!(body.get("system").is_none());
        assert_eq!(body["tools"][0]["name"], "get_weather");
        assert_eq!(body["tools"][0]["input_schema"]["type"], "object");
    }

    #[test]
    fn parse_text_response() {
        let resp: AnthropicResponse = serde_json::from_str(
            r#"{
                "id": "msg_01",
                "model": "claude-3-5-sonnet-20241022",
                "content": [{"type": "text", "text": "Hello!"}],
                "usage": {"input_tokens": 10, "output_tokens": 5},
                "stop_reason": "end_turn"
            }"#,
        )
        .unwrap();

        let pr = AnthropicProvider::response_to_provider_response(resp);
        assert_eq!(pr.texts(), vec!["Hello!"]);
        assert!(pr.tool_uses().is_empty());
        assert_eq!(pr.stop_reason, StopReason::EndTurn);
        assert_eq!(pr.usage.unwrap().total(), 15);
        assert_eq!(pr.model, "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn parse_tool_use_response() {
        let resp: AnthropicResponse = serde_json::from_str(
            r#"{
                "id": "msg_02",
                "model": "claude-3-5-sonnet-20241022",
                "content": [
                    {"type": "text", "text": "Let me check"},
                    {"type": "tool_use", "id": "toolu_abc", "name": "get_weather", "input": {"location": "Paris"}}
                ],
                "usage": {"input_tokens": 20, "output_tokens": 10},
                "stop_reason": "tool_use"
            }"#,
        )
        .unwrap();

        let pr = AnthropicProvider::response_to_provider_response(resp);
        assert_eq!(pr.stop_reason, StopReason::ToolUse);
        assert_eq!(pr.content.len(), 2);
        let calls = pr.tool_uses();
        assert_eq!(calls[0].id, "toolu_abc");
        assert_eq!(calls[0].input["location"], "Paris");
    }

    #[test]
    fn parse_drops_thinking_and_unknown_blocks() {
        let resp: AnthropicResponse = serde_json::from_str(
            r#"{
                "id": "msg_03",
                "model": "claude-3-7-sonnet-latest",
                "content": [
                    {"type": "thinking", "thinking": "I need to consider...", "signature": "abc"},
                    {"type": "redacted_thinking", "data": "xyz"},
                    {"type": "text", "text": "Here's my answer."}
                ],
                "stop_reason": "pause_turn"
            }"#,
        )
        .unwrap();

        let pr = AnthropicProvider::response_to_provider_response(resp);
        assert_eq!(pr.content, vec![Segment::text("Here's my answer.")]);
        assert_eq!(pr.stop_reason, StopReason::Other);
        assert!(pr.usage.is_none());
    }

    #[test]
    fn parse_empty_content() {
        let resp: AnthropicResponse = serde_json::from_str(
            r#"{"id": "msg_04", "model": "m", "content": [], "stop_reason": "end_turn"}"#,
        )
        .unwrap();
        let pr = AnthropicProvider::response_to_provider_response(resp);
        assert!(pr.content.is_empty());
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            AnthropicProvider::status_error(429, String::new()),
            ProviderError::RateLimited { .. }
        ));
        assert!(matches!(
            AnthropicProvider::status_error(401, String::new()),
            ProviderError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            AnthropicProvider::status_error(403, String::new()),
            ProviderError::AuthenticationFailed(_)
        ));
        match AnthropicProvider::status_error(529, "overloaded".into()) {
            ProviderError::ApiError {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 529);
                assert_eq!(message, "overloaded");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
