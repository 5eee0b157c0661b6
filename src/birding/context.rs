//! Application context: everything built once at startup.

use super::agents::{AgentModel, BirdingAgents};
use crate::agent::{Agent, Tool, WebSearchTool};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::llm::{ChatModel, OpenAIChatModel};
use crate::mcp::{ensure_server_dir, McpToolDefinition, McpToolset};
use std::sync::Arc;
use tracing::info;

/// Read-only state shared by every query.
pub struct AppContext {
    settings: Settings,
    agents: BirdingAgents,
    toolset: Option<Arc<McpToolset>>,
}

impl AppContext {
    /// Validate the environment, launch the eBird server and build the agents.
    ///
    /// The server directory is checked before anything else is constructed.
    pub async fn initialize(settings: Settings) -> Result<Self> {
        ensure_server_dir(&settings.ebird_server_dir())?;

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let llm: Arc<dyn ChatModel> = Arc::new(OpenAIChatModel::new(&settings.llm)?);
        let search: Arc<dyn Tool> = Arc::new(WebSearchTool::new(&settings.search)?);
        let toolset = Arc::new(McpToolset::launch(&settings).await?);

        let mut ctx = Self::from_parts(settings, &prompts, llm, search, toolset.tools());
        ctx.toolset = Some(toolset);
        info!("All 3 agents ready");
        Ok(ctx)
    }

    /// Assemble a context from already-built components.
    pub fn from_parts(
        settings: Settings,
        prompts: &Prompts,
        llm: Arc<dyn ChatModel>,
        search: Arc<dyn Tool>,
        ebird_tools: Vec<Arc<dyn Tool>>,
    ) -> Self {
        let model = AgentModel {
            name: settings.llm.model.clone(),
            max_iterations: settings.llm.max_iterations,
        };
        let agents = BirdingAgents::build(llm, &model, prompts, search, ebird_tools);

        Self {
            settings,
            agents,
            toolset: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn agents(&self) -> &BirdingAgents {
        &self.agents
    }

    pub fn root_agent(&self) -> Arc<Agent> {
        self.agents.root.clone()
    }

    /// Tools advertised by the eBird server, if one was launched.
    pub fn ebird_tools(&self) -> &[McpToolDefinition] {
        self.toolset
            .as_ref()
            .map(|t| t.definitions())
            .unwrap_or_default()
    }
}
