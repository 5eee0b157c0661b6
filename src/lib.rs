//! Birding Assistant - a multi-agent question answering service for birders
//!
//! Answers natural-language questions about bird species, sightings and
//! hotspots. A root agent delegates to a resolver agent (web search for
//! coordinates and species names) and an eBird agent (tools exposed by the
//! eBird MCP server over stdio).
//!
//! # Architecture
//!
//! - `config` - Settings and agent prompts
//! - `llm` - Chat model abstraction and the OpenAI-compatible backend
//! - `mcp` - MCP client: stdio transport, handshake, tool discovery and calls
//! - `agent` - Tool-calling agent loop, web search and sub-agent tools
//! - `birding` - The three birding agents and the application context
//! - `session` / `runner` - In-memory sessions and event streams
//! - `service` - One fresh session per query, text answer back
//! - `setup` - Dependency installation for the project and the MCP server
//!
//! # Example
//!
//! ```rust,no_run
//! use birding::config::Settings;
//! use birding::service::BirdingService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = BirdingService::start(Settings::load()?).await?;
//!
//!     // Never fails: errors come back as "Error: <message>"
//!     let answer = service.run_query("Bald eagles Seattle").await;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod birding;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod mcp;
pub mod openai;
pub mod runner;
pub mod service;
pub mod session;
pub mod setup;

pub use error::{BirdingError, Result};
