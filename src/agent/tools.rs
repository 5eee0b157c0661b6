//! Tool abstraction for agents, and sub-agents exposed as tools.

use super::runner::Agent;
use crate::error::{BirdingError, Result};
use crate::llm::ToolDefinition;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Identifies the session and invocation a tool call belongs to.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub session_id: String,
    pub invocation_id: String,
}

impl ToolContext {
    pub fn new(session_id: impl Into<String>, invocation_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            invocation_id: invocation_id.into(),
        }
    }
}

/// A capability an agent may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model calls the tool by.
    fn name(&self) -> &str;

    /// Function definition sent to the model.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool and return its result as text.
    async fn call(&self, arguments: Value, ctx: &ToolContext) -> Result<String>;
}

/// Parse tool arguments from the model's JSON string.
///
/// Empty strings are treated as an empty object.
pub fn parse_arguments(arguments: &str) -> Result<Value> {
    if arguments.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(arguments)
        .map_err(|e| BirdingError::Agent(format!("Invalid tool arguments: {}", e)))
}

/// Exposes an agent as a tool taking a single free-text `request`.
pub struct AgentTool {
    agent: Arc<Agent>,
}

impl AgentTool {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        self.agent.name()
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.agent.name().to_string(),
            description: self.agent.description().to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "request": {
                        "type": "string",
                        "description": "What you need from this agent, with any context it should use"
                    }
                },
                "required": ["request"]
            }),
        }
    }

    async fn call(&self, arguments: Value, ctx: &ToolContext) -> Result<String> {
        let request = match arguments.get("request").and_then(Value::as_str) {
            Some(text) => text.to_string(),
            // Models occasionally invent their own argument names.
            None => arguments.to_string(),
        };

        let response = self.agent.run(&request, ctx).await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_arguments() {
        assert_eq!(parse_arguments("").unwrap(), serde_json::json!({}));
        assert_eq!(
            parse_arguments(r#"{"lat": 47.6}"#).unwrap()["lat"],
            serde_json::json!(47.6)
        );
        assert!(parse_arguments("{not json").is_err());
    }
}
