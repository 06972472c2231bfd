//! Text-generation oracle abstraction
//!
//! The pipeline only needs `prompt -> free text`. This module provides that interface
//! and the HTTP backends it can talk to:
//! - Ollama (local models)
//! - OpenAI-compatible chat completions
//! - Anthropic messages API
//!
//! [`ScriptedOracle`] replays canned responses for tests and dry runs.

pub mod anthropic;
pub mod ollama;
pub mod openai;
pub mod scripted;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use anthropic::AnthropicOracle;
pub use ollama::OllamaOracle;
pub use openai::OpenAIOracle;
pub use scripted::ScriptedOracle;

/// Failure of a single oracle call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    /// Transport-level failure (connection refused, TLS, body decode).
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("{provider} returned {status}: {message}")]
    Status {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// The call did not finish within the configured deadline.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The backend answered but produced no text.
    #[error("empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

/// Unified oracle interface
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Generate a complete response for the prompt. No streaming, no retries.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Get the provider name (e.g., "ollama", "openai", "anthropic")
    fn provider_name(&self) -> &'static str;

    /// Get the model identifier
    fn model_id(&self) -> &str;
}

/// Call the oracle, giving up after `timeout`.
pub async fn generate_with_timeout(
    oracle: &dyn Oracle,
    prompt: &str,
    timeout: Duration,
) -> Result<String, GenerationError> {
    match tokio::time::timeout(timeout, oracle.generate(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout(timeout)),
    }
}

/// Provider configuration stored in settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Local model served by Ollama
    Ollama { base_url: String, model: String },
    /// OpenAI or any server speaking its chat completions API
    #[serde(rename = "openai")]
    OpenAI {
        api_key: String,
        model: String,
        #[serde(default = "openai::default_base_url")]
        base_url: String,
    },
    /// Anthropic API
    Anthropic { api_key: String, model: String },
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Ollama {
            base_url: ollama::DEFAULT_BASE_URL.to_string(),
            model: ollama::DEFAULT_MODEL.to_string(),
        }
    }
}

impl ProviderConfig {
    /// Get the provider type name
    pub fn provider_type(&self) -> &'static str {
        match self {
            ProviderConfig::Ollama { .. } => "ollama",
            ProviderConfig::OpenAI { .. } => "openai",
            ProviderConfig::Anthropic { .. } => "anthropic",
        }
    }

    /// Get the model ID
    pub fn model_id(&self) -> &str {
        match self {
            ProviderConfig::Ollama { model, .. } => model,
            ProviderConfig::OpenAI { model, .. } => model,
            ProviderConfig::Anthropic { model, .. } => model,
        }
    }

    /// Build the oracle described by this configuration.
    pub fn build(&self) -> Arc<dyn Oracle> {
        match self {
            ProviderConfig::Ollama { base_url, model } => Arc::new(OllamaOracle::new(base_url, model)),
            ProviderConfig::OpenAI {
                api_key,
                model,
                base_url,
            } => Arc::new(OpenAIOracle::new(api_key, model, base_url)),
            ProviderConfig::Anthropic { api_key, model } => {
                Arc::new(AnthropicOracle::new(api_key, model))
            }
        }
    }
}

/// Turn an HTTP error body into a short message.
///
/// Providers wrap errors differently; fall back to the raw body when the JSON shape is unknown.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            let err = v.get("error")?;
            err.get("message")
                .and_then(|m| m.as_str())
                .or_else(|| err.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_serde() {
        let json = r#"{"type":"openai","api_key":"sk-test","model":"gpt-4o-mini"}"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.provider_type(), "openai");
        assert_eq!(config.model_id(), "gpt-4o-mini");
        match config {
            ProviderConfig::OpenAI { base_url, .. } => {
                assert_eq!(base_url, "https://api.openai.com/v1")
            }
            other => panic!("unexpected config: {:?}", other),
        }

        let default = ProviderConfig::default();
        let round = serde_json::to_string(&default).unwrap();
        assert!(round.contains(r#""type":"ollama""#));
        assert!(round.contains("llama3"));
    }

    #[tokio::test]
    async fn test_generate_with_timeout() {
        let slow = ScriptedOracle::replies(["Color = Red"]).with_delay(Duration::from_millis(200));
        let err = generate_with_timeout(&slow, "p", Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(_)));

        let fast = ScriptedOracle::replies(["Color = Red"]);
        let text = generate_with_timeout(&fast, "p", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(text, "Color = Red");
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"type":"invalid_request_error","message":"bad key"}}"#),
            "bad key"
        );
        assert_eq!(error_message(r#"{"error":"model not found"}"#), "model not found");
        assert_eq!(error_message("  gateway timeout \n"), "gateway timeout");
    }
}
