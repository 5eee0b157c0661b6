//! Configuration module for the birding assistant.
//!
//! Handles loading and managing application settings and agent prompts.

mod prompts;
mod settings;

pub use prompts::{EbirdPrompts, Prompts, ResolverPrompts, RootPrompts};
pub(crate) use settings::read_env_key;
pub use settings::{
    EbirdSettings, GeneralSettings, LlmSettings, PromptSettings, SearchSettings,
    ServiceSettings, Settings,
};
