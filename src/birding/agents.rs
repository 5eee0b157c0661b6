//! The three birding agents and how they are wired together.

use crate::agent::{Agent, AgentConfig, AgentTool, Tool};
use crate::config::Prompts;
use crate::llm::ChatModel;
use std::collections::HashMap;
use std::sync::Arc;

pub const RESOLVER_AGENT: &str = "city_species_agent";
pub const EBIRD_AGENT: &str = "ebird_agent";
pub const ROOT_AGENT: &str = "root_agent";

/// Model settings shared by all three agents.
#[derive(Debug, Clone)]
pub struct AgentModel {
    pub name: String,
    pub max_iterations: usize,
}

/// The resolver, the eBird specialist and the root orchestrator.
pub struct BirdingAgents {
    pub resolver: Arc<Agent>,
    pub ebird: Arc<Agent>,
    pub root: Arc<Agent>,
}

impl BirdingAgents {
    /// Build the agent tree.
    ///
    /// The resolver only sees `search`; the eBird agent sees the MCP tools plus
    /// the resolver (for its fallback description); the root sees the two
    /// specialists as tools.
    pub fn build(
        llm: Arc<dyn ChatModel>,
        model: &AgentModel,
        prompts: &Prompts,
        search: Arc<dyn Tool>,
        ebird_tools: Vec<Arc<dyn Tool>>,
    ) -> Self {
        let mut names = HashMap::new();
        names.insert("resolver_agent".to_string(), RESOLVER_AGENT.to_string());
        names.insert("ebird_agent".to_string(), EBIRD_AGENT.to_string());

        let make = |name: &str, description: &str, instruction: &str, tools: Vec<Arc<dyn Tool>>| {
            let config = AgentConfig {
                name: name.to_string(),
                description: prompts.render_with_custom(description, &names),
                model: model.name.clone(),
                instruction: prompts.render_with_custom(instruction, &names),
                tools,
            };
            Arc::new(Agent::new(config, llm.clone()).with_max_iterations(model.max_iterations))
        };

        let resolver = make(
            RESOLVER_AGENT,
            &prompts.resolver.description,
            &prompts.resolver.instruction,
            vec![search],
        );

        let mut ebird_agent_tools = ebird_tools;
        ebird_agent_tools.push(Arc::new(AgentTool::new(resolver.clone())));
        let ebird = make(
            EBIRD_AGENT,
            &prompts.ebird.description,
            &prompts.ebird.instruction,
            ebird_agent_tools,
        );

        let root = make(
            ROOT_AGENT,
            &prompts.root.description,
            &prompts.root.instruction,
            vec![
                Arc::new(AgentTool::new(resolver.clone())) as Arc<dyn Tool>,
                Arc::new(AgentTool::new(ebird.clone())),
            ],
        );

        Self {
            resolver,
            ebird,
            root,
        }
    }
}
