//! Scripted chat model for tests.

use super::{ChatModel, Message, ModelTurn, ToolDefinition, ToolInvocation};
use crate::error::{BirdingError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned turns, chosen by a marker found in the system prompt.
#[derive(Default)]
pub(crate) struct ScriptedModel {
    scripts: Mutex<Vec<(String, VecDeque<ModelTurn>)>>,
    seen: Mutex<Vec<(String, Vec<Message>, Vec<String>)>>,
}

impl ScriptedModel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue turns for the agent whose system prompt contains `marker`.
    pub(crate) fn on(self, marker: &str, turns: Vec<ModelTurn>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .push((marker.to_string(), turns.into()));
        self
    }

    /// Every request seen: (marker, messages, tool names).
    pub(crate) fn requests(&self) -> Vec<(String, Vec<Message>, Vec<String>)> {
        self.seen.lock().unwrap().clone()
    }
}

/// Shorthand for a single tool call turn.
pub(crate) fn call(id: &str, name: &str, arguments: serde_json::Value) -> ModelTurn {
    ModelTurn::calls(vec![ToolInvocation {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }])
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        _model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelTurn> {
        let system = messages
            .iter()
            .find_map(|m| match m {
                Message::System(text) => Some(text.clone()),
                _ => None,
            })
            .unwrap_or_default();

        let mut scripts = self.scripts.lock().unwrap();
        let (marker, queue) = scripts
            .iter_mut()
            .find(|(marker, _)| system.contains(marker.as_str()))
            .ok_or_else(|| BirdingError::OpenAI("no script for this agent".to_string()))?;

        self.seen.lock().unwrap().push((
            marker.clone(),
            messages.to_vec(),
            tools.iter().map(|t| t.name.clone()).collect(),
        ));

        queue
            .pop_front()
            .ok_or_else(|| BirdingError::OpenAI(format!("script for '{}' exhausted", marker)))
    }
}
