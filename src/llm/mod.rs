//! Chat model abstraction used by the agents.
//!
//! Agents talk to a [`ChatModel`] in terms of the small message vocabulary
//! below; the OpenAI-compatible implementation translates it to the wire types.

mod openai;

#[cfg(test)]
pub(crate) mod testing;

pub use openai::OpenAIChatModel;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A tool the model may call, described by a JSON schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Call id echoed back with the tool result.
    pub id: String,
    pub name: String,
    /// Raw JSON arguments as produced by the model.
    pub arguments: String,
}

/// One entry of a conversation sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    System(String),
    User(String),
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolInvocation>,
    },
    Tool {
        call_id: String,
        content: String,
    },
}

/// The model's reply for a single turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
}

impl ModelTurn {
    /// A turn with final text and no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A turn requesting the given tool calls.
    pub fn calls(tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }

    /// Whether the model is done (no tool calls requested).
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// Trait for chat completion with tool calling.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion turn.
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelTurn>;
}
