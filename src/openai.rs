//! OpenAI-compatible client construction.

use crate::error::{ColloquyError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for model API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create a client for an OpenAI-compatible endpoint (OpenRouter, OpenAI, ...).
pub fn create_client(base_url: &str, api_key: &str, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ColloquyError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(base_url.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Create a client with the default timeout.
pub fn create_default_client(base_url: &str, api_key: &str) -> Result<Client<OpenAIConfig>> {
    create_client(base_url, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}
