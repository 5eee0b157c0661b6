//! OpenAI-compatible client configuration.

use crate::config::{read_env_key, LlmSettings};
use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a chat client for the configured endpoint.
///
/// The API key is read from the environment variable named in the settings;
/// a missing key is a configuration error.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = read_env_key(&settings.api_key_env)?;

    let config = OpenAIConfig::new()
        .with_api_base(&settings.api_base)
        .with_api_key(api_key);

    create_client_with_timeout(config, Duration::from_secs(settings.timeout_secs))
}

/// Create a client with a custom timeout.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
