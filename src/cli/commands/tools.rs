//! Tools command - list what the eBird MCP server exposes.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::mcp::McpToolset;

/// Launch the eBird MCP server and list its tools.
pub async fn run_tools(settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Query, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let spinner = Output::spinner("Connecting to the eBird MCP server...");
    let toolset = McpToolset::launch(&settings).await;
    spinner.finish_and_clear();
    let toolset = toolset?;

    Output::header(&format!("eBird MCP tools ({})", toolset.definitions().len()));
    for tool in toolset.definitions() {
        Output::tool(&tool.name, tool.description.as_deref());
    }

    Ok(())
}
