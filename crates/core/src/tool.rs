//! Tool trait and registry — the abstraction over assistant capabilities.
//!
//! Tools give the model access to things outside its own knowledge:
//! the current time, the weather, web search results.
//!
//! Each tool declares its parameters as [`ParameterSpec`]s. The registry
//! validates raw model input against them before a tool ever runs, so
//! tool bodies only see well-typed [`ToolParams`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// JSON type of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// One declared tool parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
    pub default: Option<Value>,
    /// Allowed values for string parameters. Empty = any.
    pub allowed: Vec<String>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
            default: None,
            allowed: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Integer, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = values.into_iter().map(Into::into).collect();
        self
    }

    fn to_json_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".into(), Value::from(self.kind.json_type()));
        prop.insert("description".into(), Value::from(self.description.clone()));
        if !self.allowed.is_empty() {
            prop.insert("enum".into(), Value::from(self.allowed.clone()));
        }
        if let Some(default) = &self.default {
            prop.insert("default".into(), default.clone());
        }
        Value::Object(prop)
    }
}

/// Validated tool input: declared parameters, type-checked, defaults filled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolParams(Map<String, Value>);

impl ToolParams {
    /// Parse a raw model payload against the declared parameters.
    ///
    /// Undeclared keys are passed through untouched.
    pub fn parse(specs: &[ParameterSpec], raw: &Value) -> Result<Self, String> {
        let mut map = match raw {
            Value::Object(map) => map.clone(),
            other => return Err(format!("expected a JSON object, got {}", json_kind(other))),
        };

        for spec in specs {
            match map.get(&spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(format!("missing required parameter '{}'", spec.name));
                    }
                    match &spec.default {
                        Some(default) => {
                            map.insert(spec.name.clone(), default.clone());
                        }
                        None => {
                            map.remove(&spec.name);
                        }
                    }
                }
                Some(value) => {
                    if !spec.kind.accepts(value) {
                        return Err(format!(
                            "parameter '{}' must be {}, got {}",
                            spec.name,
                            spec.kind.json_type(),
                            json_kind(value)
                        ));
                    }
                    if !spec.allowed.is_empty() {
                        let ok = value
                            .as_str()
                            .is_some_and(|v| spec.allowed.iter().any(|a| a == v));
                        if !ok {
                            return Err(format!(
                                "parameter '{}' must be one of [{}]",
                                spec.name,
                                spec.allowed.join(", ")
                            ));
                        }
                    }
                }
            }
        }

        Ok(Self(map))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The core Tool trait.
///
/// Each built-in capability implements this trait. Tools are registered in
/// the ToolRegistry and advertised to the model by the conversation loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "get_weather").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// Declared input parameters.
    fn parameters(&self) -> Vec<ParameterSpec>;

    /// Execute the tool with validated parameters.
    async fn execute(&self, params: ToolParams) -> Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        let params = self.parameters();
        let properties: Map<String, Value> = params
            .iter()
            .map(|p| (p.name.clone(), p.to_json_schema()))
            .collect();
        let required: Vec<Value> = params
            .iter()
            .filter(|p| p.required)
            .map(|p| Value::from(p.name.clone()))
            .collect();

        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

/// A registry of available tools.
///
/// Built once at start-up, then shared read-only (behind an `Arc`) between
/// any number of concurrent conversation loops. The loop uses it to:
/// 1. Advertise tool schemas to the LLM
/// 2. Validate and execute the tool calls the LLM requests
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool, returning the tool it replaced, if any.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Option<Box<dyn Tool>> {
        let name = tool.name().to_string();
        let previous = self.tools.insert(name.clone(), tool);
        if previous.is_some() {
            warn!(tool = %name, "Replaced an already registered tool");
        }
        previous
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool schemas for the LLM, in name order.
    ///
    /// Lazily built from the current contents; call again to restart.
    pub fn schemas(&self) -> impl Iterator<Item = ToolDefinition> + '_ {
        self.tools.values().map(|t| t.to_definition())
    }

    /// List all registered tool names.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.tools.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up, validate input for, and execute a tool.
    pub async fn invoke(&self, name: &str, raw_input: &Value) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let params = ToolParams::parse(&tool.parameters(), raw_input)
            .map_err(|reason| ToolError::invalid_input(name, reason))?;

        debug!(tool = %name, "Invoking tool");
        tool.execute(params).await.map_err(|e| match e {
            ToolError::InvalidInput { reason, .. } => ToolError::invalid_input(name, reason),
            ToolError::ExecutionFailed { reason, .. } => ToolError::execution(name, reason),
            other => ToolError::execution(name, other.to_string()),
        })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
