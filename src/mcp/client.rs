//! MCP client: handshake, tool discovery and tool invocation.

use super::protocol::{
    Implementation, InitializeParams, InitializeResult, Tool, ToolCallParams, ToolCallResult,
    ToolsListResult, PROTOCOL_VERSION,
};
use super::transport::McpTransport;
use crate::error::{BirdingError, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

const CLIENT_NAME: &str = "birding-assistant";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Client for a single connected MCP server.
pub struct McpClient {
    transport: Arc<dyn McpTransport>,
    server_info: Option<Implementation>,
}

impl McpClient {
    /// Perform the initialize handshake over the given transport.
    pub async fn connect(transport: Arc<dyn McpTransport>) -> Result<Self> {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: json!({}),
            client_info: Implementation {
                name: CLIENT_NAME.to_string(),
                version: CLIENT_VERSION.to_string(),
            },
        };

        let result = transport
            .request("initialize", Some(serde_json::to_value(params)?))
            .await?;
        let result: InitializeResult = serde_json::from_value(result)
            .map_err(|e| BirdingError::Mcp(format!("Invalid initialize response: {}", e)))?;

        if result.protocol_version != PROTOCOL_VERSION {
            debug!(
                "Server negotiated protocol {} (client offered {})",
                result.protocol_version, PROTOCOL_VERSION
            );
        }

        transport.notify("notifications/initialized", None).await?;

        if let Some(server) = &result.server_info {
            info!("Connected to MCP server {} {}", server.name, server.version);
        }

        Ok(Self {
            transport,
            server_info: result.server_info,
        })
    }

    /// Server name/version reported during the handshake.
    pub fn server_info(&self) -> Option<&Implementation> {
        self.server_info.as_ref()
    }

    /// List every tool the server exposes, following pagination cursors.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let result = self.transport.request("tools/list", params).await?;
            let page: ToolsListResult = serde_json::from_value(result)
                .map_err(|e| BirdingError::Mcp(format!("Invalid tools/list response: {}", e)))?;

            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(tools)
    }

    /// Invoke a tool by name.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        let params = ToolCallParams {
            name: name.to_string(),
            arguments,
        };
        let result = self
            .transport
            .request("tools/call", Some(serde_json::to_value(params)?))
            .await?;

        serde_json::from_value(result)
            .map_err(|e| BirdingError::Mcp(format!("Invalid tools/call response: {}", e)))
    }
}
