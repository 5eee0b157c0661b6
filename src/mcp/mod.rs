//! MCP (Model Context Protocol) client for the eBird tool server.
//!
//! Launches the server as a subprocess and speaks JSON-RPC 2.0 over its
//! stdio. Discovered operations are exposed to agents as tools.

mod client;
mod protocol;
mod toolset;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::McpClient;
pub use protocol::{Implementation, Tool as McpToolDefinition, ToolCallResult, ToolContent};
pub use toolset::{
    ebird_server_params, ensure_server_dir, McpTool, McpToolset, DEFAULT_CONNECT_TIMEOUT,
};
pub use transport::{McpTransport, StdioServerParams, StdioTransport};
