//! The birding assistant: agent wiring and application context.

mod agents;
mod context;

pub use agents::{AgentModel, BirdingAgents, EBIRD_AGENT, RESOLVER_AGENT, ROOT_AGENT};
pub use context::AppContext;
