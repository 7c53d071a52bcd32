//! Web search tool — stub that returns mock search results.
//!
//! In production this would call a real search API (Brave, Google, etc.).
//! The stub returns plausible results so the conversation loop can be
//! tested end-to-end without network access.

use async_trait::async_trait;
use assist_core::error::ToolError;
use assist_core::tool::{ParameterSpec, Tool, ToolParams};

const MAX_RESULTS: u64 = 5;

pub struct WebSearchTool;

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web for current information on a specific topic"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::string("query", "The search query").required(),
            ParameterSpec::integer("num_results", "Number of results to return (1-5)")
                .with_default(3),
        ]
    }

    async fn execute(&self, params: ToolParams) -> Result<String, ToolError> {
        let query = params
            .str("query")
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::invalid_input(self.name(), "query must not be empty"))?;

        let num_results = params.u64("num_results").unwrap_or(3).clamp(1, MAX_RESULTS) as usize;

        // Generate deterministic mock results based on query content.
        let results = generate_mock_results(query, num_results);
        Ok(render(query, &results))
    }
}

#[derive(Clone)]
struct SearchResult {
    title: String,
    url: String,
    snippet: String,
}

impl SearchResult {
    fn new(title: &str, url: &str, snippet: &str) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

fn render(query: &str, results: &[SearchResult]) -> String {
    let mut out = format!(
        "Search results for '{query}': here are the top {}:",
        results.len()
    );
    for (i, r) in results.iter().enumerate() {
        out.push_str(&format!("\n{}. {} ({})\n   {}", i + 1, r.title, r.url, r.snippet));
    }
    out
}

fn generate_mock_results(query: &str, count: usize) -> Vec<SearchResult> {
    let q = query.to_lowercase();

    // Provide context-aware mock results for common topics.
    let templates: Vec<(&str, Vec<SearchResult>)> = vec![
        (
            "rust",
            vec![
                SearchResult::new(
                    "The Rust Programming Language",
                    "https://doc.rust-lang.org/book/",
                    "Rust is a systems programming language focused on safety, speed, and concurrency.",
                ),
                SearchResult::new(
                    "Rust by Example",
                    "https://doc.rust-lang.org/rust-by-example/",
                    "A collection of runnable examples that illustrate Rust concepts and standard library usage.",
                ),
                SearchResult::new(
                    "crates.io: Rust Package Registry",
                    "https://crates.io/",
                    "The Rust community's crate registry for sharing and discovering Rust libraries.",
                ),
            ],
        ),
        (
            "discord",
            vec![
                SearchResult::new(
                    "Discord Developer Portal",
                    "https://discord.com/developers/docs/intro",
                    "Build bots and apps for Discord with the REST API and Gateway.",
                ),
                SearchResult::new(
                    "Discord Support",
                    "https://support.discord.com/",
                    "Help articles for servers, channels, roles, and account settings.",
                ),
            ],
        ),
    ];

    // Find matching template or generate generic results.
    for (keyword, results) in &templates {
        if q.contains(keyword) {
            return results.iter().take(count).cloned().collect();
        }
    }

    // Generic fallback.
    (0..count)
        .map(|i| SearchResult {
            title: format!("Result {} for: {}", i + 1, query),
            url: format!("https://example.com/search?q={}&p={}", urlencode(query), i + 1),
            snippet: format!("A mock search result for the query '{query}'."),
        })
        .collect()
}

fn urlencode(s: &str) -> String {
    s.replace(' ', "+")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(raw: serde_json::Value) -> ToolParams {
        ToolParams::parse(&WebSearchTool.parameters(), &raw).unwrap()
    }

    #[tokio::test]
    async fn search_returns_results() {
        let out = WebSearchTool
            .execute(params(serde_json::json!({"query": "rust programming"})))
            .await
            .unwrap();

        assert!(out.starts_with("Search results for 'rust programming'"));
        assert!(out.contains("The Rust Programming Language"));
    }

    #[tokio::test]
    async fn search_respects_num_results() {
        let out = WebSearchTool
            .execute(params(serde_json::json!({"query": "test", "num_results": 2})))
            .await
            .unwrap();

        assert!(out.contains("top 2"));
        assert!(out.contains("\n2. "));
        assert!(!out.contains("\n3. "));
    }

    #[tokio::test]
    async fn num_results_is_capped() {
        let out = WebSearchTool
            .execute(params(serde_json::json!({"query": "anything", "num_results": 50})))
            .await
            .unwrap();
        assert!(out.contains("\n5. "));
        assert!(!out.contains("\n6. "));
    }

    #[tokio::test]
    async fn blank_query_returns_error() {
        let result = WebSearchTool
            .execute(params(serde_json::json!({"query": ""})))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn tool_definition() {
        let def = WebSearchTool.to_definition();
        assert_eq!(def.name, "search_web");
        assert_eq!(def.input_schema["required"], serde_json::json!(["query"]));
        assert_eq!(def.input_schema["properties"]["num_results"]["type"], "integer");
    }
}
