//! Tool adapter: launches the eBird MCP server and exposes its tools to agents.

use super::client::McpClient;
use super::protocol;
use super::transport::{McpTransport, StdioServerParams, StdioTransport};
use crate::agent::{Tool, ToolContext};
use crate::config::Settings;
use crate::error::{BirdingError, Result};
use crate::llm::ToolDefinition;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Handshake plus discovery limit when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the launch parameters for the eBird server.
///
/// Fails if the server directory is missing or no API key is configured.
pub fn ebird_server_params(settings: &Settings) -> Result<StdioServerParams> {
    let server_dir = settings.ebird_server_dir();
    ensure_server_dir(&server_dir)?;
    let api_key = settings.ebird_api_key()?;

    Ok(StdioServerParams {
        command: settings.ebird.command.clone(),
        args: vec![
            server_dir.join(&settings.ebird.entry).display().to_string(),
            "--api-key".to_string(),
            api_key,
        ],
        cwd: server_dir,
    })
}

/// The server directory must exist before anything is launched.
pub fn ensure_server_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(BirdingError::Config(format!(
            "eBird MCP server folder not found: {}",
            dir.display()
        )))
    }
}

/// The set of remote tools discovered from one MCP server process.
pub struct McpToolset {
    client: Arc<McpClient>,
    tools: Vec<protocol::Tool>,
}

impl McpToolset {
    /// Launch the eBird server described by the settings and discover its tools.
    pub async fn launch(settings: &Settings) -> Result<Self> {
        let params = ebird_server_params(settings)?;
        info!("Creating eBird MCP toolset...");
        let transport = StdioTransport::spawn(&params)?;
        let timeout = Duration::from_secs(settings.ebird.connect_timeout_secs);
        Self::connect_with_timeout(Arc::new(transport), timeout).await
    }

    /// Handshake and discover tools over an existing transport.
    pub async fn connect(transport: Arc<dyn McpTransport>) -> Result<Self> {
        Self::connect_with_timeout(transport, DEFAULT_CONNECT_TIMEOUT).await
    }

    /// Handshake and discover tools, giving up after `timeout`.
    ///
    /// A failed or silent handshake or discovery is a configuration error.
    pub async fn connect_with_timeout(
        transport: Arc<dyn McpTransport>,
        timeout: Duration,
    ) -> Result<Self> {
        let timed_out = || {
            BirdingError::Config(format!(
                "MCP handshake timed out after {} seconds",
                timeout.as_secs()
            ))
        };

        let client = tokio::time::timeout(timeout, McpClient::connect(transport))
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| BirdingError::Config(format!("MCP handshake failed: {}", e)))?;
        let tools = tokio::time::timeout(timeout, client.list_tools())
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| BirdingError::Config(format!("MCP tool discovery failed: {}", e)))?;

        info!("Discovered {} eBird tool(s)", tools.len());
        debug!(
            "eBird tools: {}",
            tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(", ")
        );

        Ok(Self {
            client: Arc::new(client),
            tools,
        })
    }

    /// Remote tool definitions as advertised by the server.
    pub fn definitions(&self) -> &[protocol::Tool] {
        &self.tools
    }

    /// Each remote operation as an agent tool.
    pub fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools
            .iter()
            .map(|t| {
                Arc::new(McpTool {
                    client: self.client.clone(),
                    definition: t.clone(),
                }) as Arc<dyn Tool>
            })
            .collect()
    }
}

/// A single remote MCP operation.
pub struct McpTool {
    client: Arc<McpClient>,
    definition: protocol::Tool,
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.definition.name.clone(),
            description: self.definition.description.clone().unwrap_or_default(),
            parameters: self.definition.input_schema.clone(),
        }
    }

    async fn call(&self, arguments: Value, ctx: &ToolContext) -> Result<String> {
        debug!(
            "MCP call {} (session {}, invocation {})",
            self.definition.name, ctx.session_id, ctx.invocation_id
        );

        let result = self.client.call_tool(&self.definition.name, arguments).await?;
        let text = result.text();

        if result.is_error() {
            return Err(BirdingError::ToolFailed(format!(
                "{}: {}",
                self.definition.name, text
            )));
        }
        if text.trim().is_empty() {
            return Ok("No results.".to_string());
        }
        Ok(text)
    }
}
