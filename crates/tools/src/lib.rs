//! Built-in tool implementations for discord-assist.
//!
//! Tools give the assistant the ability to look things up while it
//! chats: the current time in any timezone, the weather, and web search.
//! Weather and search return deterministic mock data.

pub mod current_time;
pub mod weather_lookup;
pub mod web_search;

use assist_core::tool::ToolRegistry;

pub use current_time::CurrentTimeTool;
pub use weather_lookup::WeatherLookupTool;
pub use web_search::WebSearchTool;

/// Create a default tool registry with all built-in tools.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CurrentTimeTool));
    registry.register(Box::new(WeatherLookupTool));
    registry.register(Box::new(WebSearchTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_builtin_tools() {
        let registry = default_registry();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["get_current_time", "get_weather", "search_web"]);
    }

    #[tokio::test]
    async fn default_registry_rejects_missing_location() {
        let registry = default_registry();
        let err = registry
            .invoke("get_weather", &serde_json::json!({"unit": "celsius"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            assist_core::ToolError::InvalidInput { ref tool_name, .. } if tool_name == "get_weather"
        ));
    }
}
