//! Agent system: an LLM with a tool calling loop.
//!
//! Agents are configured with an instruction and an ordered list of tools.
//! Tools may be host capabilities (web search), remote MCP operations, or
//! other agents wrapped with [`AgentTool`].

mod runner;
mod search;
mod tools;

pub use runner::{Agent, AgentConfig, AgentEvent, AgentResponse, ToolCallRecord};
pub use search::{format_results, parse_results, SearchResult, WebSearchTool};
pub use tools::{parse_arguments, AgentTool, Tool, ToolContext};
