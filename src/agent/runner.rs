//! Agent with a tool calling loop.

use super::tools::{parse_arguments, Tool, ToolContext};
use crate::error::{BirdingError, Result};
use crate::llm::{ChatModel, Message, ToolDefinition, ToolInvocation};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Static description of an agent: who it is, what it is told, what it may call.
#[derive(Clone)]
pub struct AgentConfig {
    pub name: String,
    pub description: String,
    pub model: String,
    pub instruction: String,
    pub tools: Vec<Arc<dyn Tool>>,
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("name", &self.name)
            .field("model", &self.model)
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Progress reported while an agent runs.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    ToolCall {
        author: String,
        name: String,
        arguments: String,
    },
    ToolResult {
        author: String,
        name: String,
        result: String,
    },
    /// Text produced alongside tool calls, before the agent is done.
    PartialText { author: String, text: String },
    /// The agent's final answer.
    FinalText { author: String, text: String },
}

/// Agent that answers a task, calling its tools until the model stops asking.
pub struct Agent {
    config: AgentConfig,
    llm: Arc<dyn ChatModel>,
    max_iterations: usize,
}

impl Agent {
    /// Create a new agent from its configuration and a chat model.
    pub fn new(config: AgentConfig, llm: Arc<dyn ChatModel>) -> Self {
        Self {
            config,
            llm,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn description(&self) -> &str {
        &self.config.description
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Names of the tools this agent may call, in declaration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.config.tools.iter().map(|t| t.name()).collect()
    }

    /// Run the agent on a task.
    pub async fn run(&self, task: &str, ctx: &ToolContext) -> Result<AgentResponse> {
        self.run_with_events(task, ctx, None).await
    }

    /// Run the agent on a task, reporting progress on `events`.
    pub async fn run_with_events(
        &self,
        task: &str,
        ctx: &ToolContext,
        events: Option<&UnboundedSender<AgentEvent>>,
    ) -> Result<AgentResponse> {
        let emit = |event: AgentEvent| {
            if let Some(tx) = events {
                let _ = tx.send(event);
            }
        };

        let definitions: Vec<ToolDefinition> =
            self.config.tools.iter().map(|t| t.definition()).collect();

        let mut messages = vec![
            Message::System(self.config.instruction.clone()),
            Message::User(task.to_string()),
        ];

        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(BirdingError::Agent(format!(
                    "Agent '{}' exceeded maximum iterations ({})",
                    self.config.name, self.max_iterations
                )));
            }

            debug!("Agent {} iteration {}", self.config.name, iterations);

            let turn = self
                .llm
                .complete(&self.config.model, &messages, &definitions)
                .await?;

            if turn.is_final() {
                let content = turn.content.unwrap_or_default();
                emit(AgentEvent::FinalText {
                    author: self.config.name.clone(),
                    text: content.clone(),
                });
                return Ok(AgentResponse {
                    content,
                    tool_calls: tool_calls_made,
                    iterations,
                });
            }

            if let Some(text) = turn.content.as_ref().filter(|t| !t.trim().is_empty()) {
                emit(AgentEvent::PartialText {
                    author: self.config.name.clone(),
                    text: text.clone(),
                });
            }

            messages.push(Message::Assistant {
                content: turn.content.clone(),
                tool_calls: turn.tool_calls.clone(),
            });

            for invocation in &turn.tool_calls {
                emit(AgentEvent::ToolCall {
                    author: self.config.name.clone(),
                    name: invocation.name.clone(),
                    arguments: invocation.arguments.clone(),
                });

                let record = self.execute_tool_call(invocation, ctx).await;

                emit(AgentEvent::ToolResult {
                    author: self.config.name.clone(),
                    name: record.name.clone(),
                    result: record.result.clone(),
                });

                messages.push(Message::Tool {
                    call_id: invocation.id.clone(),
                    content: record.result.clone(),
                });
                tool_calls_made.push(record);
            }
        }
    }

    /// Execute a single tool call and return a record of it.
    ///
    /// Failures are reported back to the model as the tool's result.
    async fn execute_tool_call(
        &self,
        invocation: &ToolInvocation,
        ctx: &ToolContext,
    ) -> ToolCallRecord {
        let name = &invocation.name;
        let arguments = &invocation.arguments;

        info!(
            "Agent {} calling tool: {} with args: {}",
            self.config.name, name, arguments
        );

        let result = match self.config.tools.iter().find(|t| t.name() == name.as_str()) {
            Some(tool) => match parse_arguments(arguments) {
                Ok(args) => match tool.call(args, ctx).await {
                    Ok(output) => output,
                    Err(e) => format!("Tool error: {}", e),
                },
                Err(e) => format!("Failed to parse tool call: {}", e),
            },
            None => format!("Unknown tool: {}", name),
        };

        ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result,
        }
    }
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{call, ScriptedModel};
    use crate::llm::ModelTurn;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".to_string(),
                description: "Echo the input".to_string(),
                parameters: json!({"type": "object"}),
            }
        }

        async fn call(&self, arguments: Value, _ctx: &ToolContext) -> Result<String> {
            Ok(format!("echo: {}", arguments["text"].as_str().unwrap_or_default()))
        }
    }

    fn agent(model: ScriptedModel) -> Agent {
        Agent::new(
            AgentConfig {
                name: "tester".to_string(),
                description: "test agent".to_string(),
                model: "test-model".to_string(),
                instruction: "You are the tester.".to_string(),
                tools: vec![Arc::new(EchoTool) as Arc<dyn Tool>],
            },
            Arc::new(model),
        )
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "list_hotspots".to_string(),
            arguments: r#"{"lat": 42.36}"#.to_string(),
            result: "Found hotspots".to_string(),
        };
        assert_eq!(format!("{}", record), r#"list_hotspots({"lat": 42.36})"#);
    }

    #[tokio::test]
    async fn test_tool_loop_feeds_results_back() {
        let model = ScriptedModel::new().on(
            "tester",
            vec![
                call("c1", "echo", json!({"text": "warbler"})),
                ModelTurn::text("Saw a warbler."),
            ],
        );
        let agent = agent(model);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let response = agent
            .run_with_events("What did you see?", &ToolContext::default(), Some(&tx))
            .await
            .unwrap();

        assert_eq!(response.content, "Saw a warbler.");
        assert_eq!(response.iterations, 2);
        assert_eq!(response.tool_calls[0].result, "echo: warbler");

        drop(tx);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert!(matches!(events[0], AgentEvent::ToolCall { ref name, .. } if name == "echo"));
        assert!(matches!(events[1], AgentEvent::ToolResult { ref result, .. } if result == "echo: warbler"));
        assert!(matches!(events[2], AgentEvent::FinalText { ref text, .. } if text == "Saw a warbler."));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_to_model() {
        let model = ScriptedModel::new().on(
            "tester",
            vec![
                call("c1", "google_search", json!({"q": "x"})),
                ModelTurn::text("done"),
            ],
        );
        let response = agent(model)
            .run("task", &ToolContext::default())
            .await
            .unwrap();
        assert_eq!(response.tool_calls[0].result, "Unknown tool: google_search");
    }

    #[tokio::test]
    async fn test_max_iterations_guard() {
        let model = ScriptedModel::new().on(
            "tester",
            vec![
                call("c1", "echo", json!({})),
                call("c2", "echo", json!({})),
                call("c3", "echo", json!({})),
            ],
        );
        let agent = agent(model).with_max_iterations(2);
        match agent.run("loop forever", &ToolContext::default()).await {
            Err(BirdingError::Agent(msg)) => assert!(msg.contains("maximum iterations")),
            other => panic!("expected iteration error, got {:?}", other),
        }
    }
}
