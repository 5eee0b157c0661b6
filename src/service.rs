//! Query service: one fresh session per question, one text answer back.

use crate::birding::AppContext;
use crate::config::{ServiceSettings, Settings};
use crate::error::{BirdingError, Result};
use crate::runner::Runner;
use crate::session::InMemorySessionService;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Result of a query at the service boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Answer(String),
    Failed(String),
}

impl QueryOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, QueryOutcome::Failed(_))
    }

    /// Render as plain text; failures become `Error: <message>`.
    pub fn into_text(self) -> String {
        match self {
            QueryOutcome::Answer(text) => text,
            QueryOutcome::Failed(message) => format!("Error: {}", message),
        }
    }
}

/// Runs user questions through the root agent.
pub struct BirdingService {
    runner: Runner,
    sessions: Arc<InMemorySessionService>,
    user_id: String,
    timeout: Duration,
    context: Arc<AppContext>,
}

impl BirdingService {
    /// Build the application context and the service in one step.
    ///
    /// Fails fast on configuration problems, before any query is attempted.
    pub async fn start(settings: Settings) -> Result<Self> {
        let context = AppContext::initialize(settings).await?;
        Ok(Self::new(Arc::new(context)))
    }

    /// Create a service over an existing application context.
    pub fn new(context: Arc<AppContext>) -> Self {
        let service = context.settings().service.clone();
        Self::with_settings(context, &service)
    }

    fn with_settings(context: Arc<AppContext>, settings: &ServiceSettings) -> Self {
        let sessions = Arc::new(InMemorySessionService::new());
        Self {
            runner: Runner::new(&settings.app_name, context.root_agent(), sessions.clone()),
            sessions,
            user_id: settings.user_id.clone(),
            timeout: Duration::from_secs(settings.query_timeout_secs),
            context,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Answer a question. Never fails; errors come back as `Error: <message>`.
    pub async fn run_query(&self, query: &str) -> String {
        self.query(query).await.into_text()
    }

    /// Answer a question, keeping failures distinguishable from answers.
    pub async fn query(&self, query: &str) -> QueryOutcome {
        self.execute(query).await.1
    }

    /// Run a query, returning the id of the session it used.
    pub(crate) async fn execute(&self, query: &str) -> (Option<String>, QueryOutcome) {
        let session = match self
            .sessions
            .create_session(self.runner.app_name(), &self.user_id, HashMap::new())
            .await
        {
            Ok(session) => session,
            Err(e) => {
                error!("Query failed: {}", e);
                return (None, QueryOutcome::Failed(e.to_string()));
            }
        };
        let guard = SessionGuard::new(self.sessions.clone(), session.id.clone());

        let outcome =
            match tokio::time::timeout(self.timeout, self.collect(&session.id, query)).await {
                Ok(Ok(response)) => {
                    info!("Response: {} chars", response.len());
                    QueryOutcome::Answer(response)
                }
                Ok(Err(e)) => {
                    error!("Query failed: {}", e);
                    QueryOutcome::Failed(e.to_string())
                }
                Err(_) => {
                    let e = BirdingError::Timeout(self.timeout.as_secs());
                    error!("Query failed: {}", e);
                    QueryOutcome::Failed(e.to_string())
                }
            };

        guard.release().await;
        (Some(session.id), outcome)
    }

    /// Concatenate the final-output fragments of one invocation.
    async fn collect(&self, session_id: &str, query: &str) -> Result<String> {
        let mut events = self.runner.run(&self.user_id, session_id, query);
        let mut response = String::new();

        while let Some(event) = events.next().await {
            if let Some(text) = event?.final_text() {
                response.push_str(text);
            }
        }

        Ok(response.trim().to_string())
    }
}

/// Deletes a query's session even when the query future is dropped early.
struct SessionGuard {
    sessions: Arc<InMemorySessionService>,
    session_id: Option<String>,
}

impl SessionGuard {
    fn new(sessions: Arc<InMemorySessionService>, session_id: String) -> Self {
        Self {
            sessions,
            session_id: Some(session_id),
        }
    }

    async fn release(mut self) {
        if let Some(id) = self.session_id.take() {
            self.sessions.delete_session(&id).await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(id) = self.session_id.take() else {
            return;
        };
        debug!("Query cancelled, removing session {}", id);
        let sessions = self.sessions.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                sessions.delete_session(&id).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Tool, ToolContext};
    use crate::birding::{EBIRD_AGENT, RESOLVER_AGENT};
    use crate::config::Prompts;
    use crate::llm::testing::{call, ScriptedModel};
    use crate::llm::{ChatModel, Message, ModelTurn, ToolDefinition};
    use crate::mcp::testing::FakeEbirdServer;
    use crate::mcp::McpToolset;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct StubSearch;

    #[async_trait]
    impl Tool for StubSearch {
        fn name(&self) -> &str {
            "web_search"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "web_search".to_string(),
                description: "search".to_string(),
                parameters: json!({"type": "object"}),
            }
        }

        async fn call(&self, arguments: Value, _ctx: &ToolContext) -> Result<String> {
            Ok(format!(
                "1. **{}**\n   Seattle coordinates: 47.6062 N, 122.3321 W",
                arguments["query"].as_str().unwrap_or_default()
            ))
        }
    }

    // Markers that pick each agent's script out of its instruction text.
    const ROOT: &str = "kind, helpful and professional birding assistant";
    const RESOLVER: &str = "You find latitude/longitude";
    const EBIRD: &str = "You are an eBird specialist";

    fn service_with(
        model: Arc<dyn ChatModel>,
        ebird_tools: Vec<Arc<dyn Tool>>,
    ) -> BirdingService {
        let context = AppContext::from_parts(
            Settings::default(),
            &Prompts::default(),
            model,
            Arc::new(StubSearch),
            ebird_tools,
        );
        BirdingService::new(Arc::new(context))
    }

    #[tokio::test]
    async fn test_hotspot_query_returns_answer() {
        let model = ScriptedModel::new().on(
            ROOT,
            vec![ModelTurn::text(
                "  I asked the resolver for Boston's coordinates, then eBird for hotspots.\n1. Mount Auburn Cemetery\n  ",
            )],
        );
        let service = service_with(Arc::new(model), Vec::new());

        let response = service.run_query("Birding hotspots near Boston").await;
        assert!(!response.is_empty());
        assert!(!response.starts_with("Error:"));
        assert!(response.starts_with("I asked the resolver"));
        assert!(response.contains("Mount Auburn"));
    }

    #[tokio::test]
    async fn test_species_and_location_delegation() {
        let server = FakeEbirdServer::start();
        let toolset = McpToolset::connect(server.transport()).await.unwrap();

        let model = Arc::new(
            ScriptedModel::new()
                .on(
                    ROOT,
                    vec![
                        ModelTurn {
                            content: Some("Resolving Seattle first.".to_string()),
                            ..call("r1", RESOLVER_AGENT, json!({"request": "Bald eagles Seattle"}))
                        },
                        call(
                            "r2",
                            EBIRD_AGENT,
                            json!({"request": "Bald Eagle near 47.6062,-122.3321"}),
                        ),
                        ModelTurn::text(
                            "Bald Eagle sightings near Seattle: Discovery Park (3 reports).",
                        ),
                    ],
                )
                .on(
                    RESOLVER,
                    vec![
                        call("s1", "web_search", json!({"query": "Seattle coordinates"})),
                        ModelTurn::text(
                            "Seattle: 47.6062, -122.3321. Species: Bald Eagle (Haliaeetus leucocephalus).",
                        ),
                    ],
                )
                .on(
                    EBIRD,
                    vec![
                        call(
                            "e1",
                            "search_observations",
                            json!({"lat": 47.6062, "lng": -122.3321, "species": "baleag"}),
                        ),
                        ModelTurn::text("3 Bald Eagle reports at Discovery Park."),
                    ],
                ),
        );
        let service = service_with(model.clone(), toolset.tools());

        let outcome = service.query("Bald eagles Seattle").await;
        assert_eq!(
            outcome,
            QueryOutcome::Answer(
                "Bald Eagle sightings near Seattle: Discovery Park (3 reports).".to_string()
            )
        );

        // The eBird agent saw the remote observation result.
        let requests = model.requests();
        let ebird_followup = requests
            .iter()
            .filter(|(marker, _, _)| marker == EBIRD)
            .last()
            .unwrap();
        assert!(ebird_followup.1.iter().any(|m| matches!(
            m,
            Message::Tool { content, .. } if content.contains("Discovery Park")
        )));
        assert!(ebird_followup.2.contains(&"search_observations".to_string()));
        assert!(server.methods().contains(&"tools/call".to_string()));
    }

    #[tokio::test]
    async fn test_runner_failure_becomes_error_string() {
        // No scripts at all: the very first model call fails.
        let service = service_with(Arc::new(ScriptedModel::new()), Vec::new());

        let response = service.run_query("Paris birds").await;
        assert!(response.starts_with("Error:"), "got: {}", response);

        let empty = service.run_query("").await;
        assert!(empty.starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_empty_query_answered_directly() {
        let model = ScriptedModel::new().on(
            ROOT,
            vec![ModelTurn::text("What would you like to know about birds?")],
        );
        let service = service_with(Arc::new(model), Vec::new());

        let outcome = service.query("").await;
        assert!(!outcome.is_error());
    }

    #[tokio::test]
    async fn test_sessions_are_never_reused() {
        let model = ScriptedModel::new().on(
            ROOT,
            vec![ModelTurn::text("first"), ModelTurn::text("second")],
        );
        let service = service_with(Arc::new(model), Vec::new());

        let (first_id, first) = service.execute("Paris birds").await;
        let (second_id, second) = service.execute("Paris birds").await;

        assert_eq!(first, QueryOutcome::Answer("first".to_string()));
        assert_eq!(second, QueryOutcome::Answer("second".to_string()));
        assert_ne!(first_id.unwrap(), second_id.unwrap());
        assert_eq!(service.sessions.session_count().await, 0);
    }

    struct SlowModel;

    #[async_trait]
    impl ChatModel for SlowModel {
        async fn complete(
            &self,
            _: &str,
            _: &[Message],
            _: &[ToolDefinition],
        ) -> Result<ModelTurn> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ModelTurn::text("too late"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_times_out() {
        let mut settings = ServiceSettings::default();
        settings.query_timeout_secs = 5;
        let context = AppContext::from_parts(
            Settings::default(),
            &Prompts::default(),
            Arc::new(SlowModel),
            Arc::new(StubSearch),
            Vec::new(),
        );
        let service = BirdingService::with_settings(Arc::new(context), &settings);

        let response = service.run_query("Birding hotspots near Boston").await;
        assert_eq!(response, "Error: Query timed out after 5 seconds");
    }

    #[tokio::test]
    async fn test_start_fails_fast_without_server_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.ebird.server_dir = dir.path().join("ebird-mcp-server").display().to_string();
        // Deliberately no API keys: the directory check must come first.
        settings.llm.api_key_env = "BIRDING_TEST_UNSET_LLM_KEY".to_string();
        settings.ebird.api_key_env = "BIRDING_TEST_UNSET_EBIRD_KEY".to_string();

        match BirdingService::start(settings).await {
            Err(BirdingError::Config(msg)) => {
                assert!(msg.contains("eBird MCP server folder not found"))
            }
            Err(other) => panic!("expected config error, got {:?}", other),
            Ok(_) => panic!("expected startup failure"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_queries_leave_no_sessions() {
        let context = AppContext::from_parts(
            Settings::default(),
            &Prompts::default(),
            Arc::new(SlowModel),
            Arc::new(StubSearch),
            Vec::new(),
        );
        let service = Arc::new(BirdingService::new(Arc::new(context)));

        for _ in 0..3 {
            let running = service.clone();
            let task = tokio::spawn(async move { running.run_query("Paris birds").await });
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert_eq!(service.sessions.session_count().await, 1);

            task.abort();
            assert!(task.await.unwrap_err().is_cancelled());
        }

        for _ in 0..10 {
            if service.sessions.session_count().await == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(service.sessions.session_count().await, 0);
    }
}
