//! Prompt templates for the three birding agents.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory
//! (`resolver.toml`, `ebird.toml`, `root.toml`). Templates may reference the agent
//! names as `{{resolver_agent}}` and `{{ebird_agent}}`, plus any variables defined
//! under `[prompts.variables]` in the settings file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all agent prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    /// Location and species resolver backed by web search.
    pub resolver: ResolverPrompts,
    /// eBird specialist backed by the MCP toolset.
    pub ebird: EbirdPrompts,
    /// Root orchestrator that delegates to the two specialists.
    pub root: RootPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the location/species resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverPrompts {
    pub description: String,
    pub instruction: String,
}

impl Default for ResolverPrompts {
    fn default() -> Self {
        Self {
            description: "Location and species lookup using web search.".to_string(),
            instruction: r#"You find latitude/longitude for cities, states, countries, places and landmarks.
Use web search to find coordinates for ANY location that is mentioned.
If a state is mentioned, find the capital city of that state and give the coordinates of the capital.
If a country is mentioned, find the capital city of that country and give the coordinates of the capital.
If several locations are mentioned, extract only the main city or place.

You also find information about any bird species or broader category, including its common and scientific name, at any location that is asked about.
Use web search to look up the species or category.
If several species are mentioned, extract only the main species and return its common and scientific name so it can be used with the eBird taxonomy tools."#
                .to_string(),
        }
    }
}

/// Prompts for the eBird specialist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EbirdPrompts {
    pub description: String,
    pub instruction: String,
}

impl Default for EbirdPrompts {
    fn default() -> Self {
        Self {
            description: "eBird specialist using MCP tools for hotspots and observations.".to_string(),
            instruction: r#"You are an eBird specialist. Use the eBird MCP tools to answer birding questions.
If you are given latitude/longitude, use tools such as the hotspot listing or observation search.
If you are given a city or place, FIRST ask {{resolver_agent}} for coordinates, THEN use the eBird tools.
If you are given a general category or a species/bird/common name, ask {{resolver_agent}} for the common or scientific name, THEN use the eBird tools (taxonomy lookup included).
Give concise, useful birding insights: hotspots, recent sightings, species lists, taxonomy.
If the eBird tools return nothing useful, use {{resolver_agent}} to get general information about the species and answer in 4-5 lines describing it."#
                .to_string(),
        }
    }
}

/// Prompts for the root orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RootPrompts {
    pub description: String,
    pub instruction: String,
}

impl Default for RootPrompts {
    fn default() -> Self {
        Self {
            description: "Professional birding assistant with auto-orchestration.".to_string(),
            instruction: r#"You are a kind, helpful and professional birding assistant. For birding and hotspot questions:
1. If the user names a SPECIFIC CITY/PLACE, use {{resolver_agent}} to get its latitude/longitude, then pass those coordinates to {{ebird_agent}}.
2. If the user names a SPECIFIC SPECIES/BIRD, use {{resolver_agent}} to get the common or scientific name, then pass that to {{ebird_agent}}.
3. If the user asks about a broad category of birds, ask {{resolver_agent}} for the common or scientific name, then consult {{ebird_agent}}.
4. If the user already gives latitude/longitude OR asks a general birding question, ask {{resolver_agent}} first and then consult {{ebird_agent}} with the added context.
5. For questions that are not about birding, answer directly without using any tool.

Always explain briefly what you did and why.
Based on the data from {{ebird_agent}}, always answer with a ranked list of the 15 most relevant bird species found at the location, or 10-15 hotspots when hotspots are asked for."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the defaults, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let resolver_path = custom_path.join("resolver.toml");
            if resolver_path.exists() {
                let content = std::fs::read_to_string(&resolver_path)?;
                prompts.resolver = toml::from_str(&content)?;
            }

            let ebird_path = custom_path.join("ebird.toml");
            if ebird_path.exists() {
                let content = std::fs::read_to_string(&ebird_path)?;
                prompts.ebird = toml::from_str(&content)?;
            }

            let root_path = custom_path.join("root.toml");
            if root_path.exists() {
                let content = std::fs::read_to_string(&root_path)?;
                prompts.root = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
