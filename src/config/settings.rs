//! Configuration settings for the birding assistant.

use crate::error::{BirdingError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub ebird: EbirdSettings,
    pub search: SearchSettings,
    pub service: ServiceSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory the eBird server path is resolved against. Empty means the
    /// crate root this binary was built from.
    pub project_root: String,
    /// Log file written alongside stdout.
    pub log_file: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            project_root: String::new(),
            log_file: "birding_agent.log".to_string(),
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model used by all three agents.
    pub model: String,
    /// Base URL of an OpenAI-compatible chat completions API.
    pub api_base: String,
    /// Environment variable holding the model API key.
    pub api_key_env: String,
    /// HTTP timeout for a single model call.
    pub timeout_secs: u64,
    /// Maximum LLM turns per agent invocation.
    pub max_iterations: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash-lite".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 120,
            max_iterations: 15,
        }
    }
}

/// eBird MCP server launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EbirdSettings {
    /// Server directory, relative to the project root unless absolute.
    pub server_dir: String,
    /// Executable used to launch the server.
    pub command: String,
    /// Entry script inside the server directory.
    pub entry: String,
    /// Explicit API key. Takes precedence over `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable holding the eBird API key.
    pub api_key_env: String,
    /// Limit for the handshake and tool discovery, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for EbirdSettings {
    fn default() -> Self {
        Self {
            server_dir: "ebird-mcp-server".to_string(),
            command: "node".to_string(),
            entry: "index.js".to_string(),
            api_key: None,
            api_key_env: "EBIRD_API_KEY".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

/// Web search settings for the resolver agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// HTML search endpoint (DuckDuckGo-compatible result markup).
    pub endpoint: String,
    /// Maximum results returned to the model.
    pub max_results: usize,
    /// HTTP timeout for a search request.
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/".to_string(),
            max_results: 8,
            timeout_secs: 15,
        }
    }
}

/// Query service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Application name sessions are created under.
    pub app_name: String,
    /// User id sessions are created for.
    pub user_id: String,
    /// Upper bound on a single query, end to end.
    pub query_timeout_secs: u64,
    /// Characters shown per answer in the demo run.
    pub preview_chars: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            app_name: "birding_app".to_string(),
            user_id: "test".to_string(),
            query_timeout_secs: 300,
            preview_chars: 600,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| BirdingError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("birding-assistant")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Project root the server directory is resolved against.
    pub fn project_root(&self) -> PathBuf {
        if self.general.project_root.is_empty() {
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        } else {
            Self::expand_path(&self.general.project_root)
        }
    }

    /// Absolute path of the eBird MCP server directory.
    pub fn ebird_server_dir(&self) -> PathBuf {
        let dir = Self::expand_path(&self.ebird.server_dir);
        if dir.is_absolute() {
            dir
        } else {
            self.project_root().join(dir)
        }
    }

    /// Resolve the eBird API key. A missing key is a configuration error.
    pub fn ebird_api_key(&self) -> Result<String> {
        if let Some(key) = self.ebird.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }
        read_env_key(&self.ebird.api_key_env)
    }

    /// Resolve the model API key. A missing key is a configuration error.
    pub fn llm_api_key(&self) -> Result<String> {
        read_env_key(&self.llm.api_key_env)
    }
}

/// Read a non-empty secret from the environment.
pub(crate) fn read_env_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        Ok(_) => Err(BirdingError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(BirdingError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}
