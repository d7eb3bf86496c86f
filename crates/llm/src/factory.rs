//! Generation client factory.
//!
//! Resolves a provider name into a concrete client wrapped in the retry
//! decorator, so callers always get the resilient behavior.

use std::sync::Arc;

use aeroqa_core::{QaError, QaResult};

use crate::client::GenerationClient;
use crate::providers::OllamaGenerator;
use crate::retry::{RetryPolicy, RetryingClient};

/// Create a generation client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier (currently "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (for providers that require it)
/// * `policy` - Retry/timeout policy applied to every call
///
/// # Errors
/// Returns `Config` if the provider is unknown or missing required
/// credentials.
pub fn create_generation_client(
    provider: &str,
    endpoint: Option<&str>,
    _api_key: Option<&str>,
    policy: RetryPolicy,
) -> QaResult<Arc<dyn GenerationClient>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            let client = OllamaGenerator::with_base_url(base_url);
            Ok(Arc::new(RetryingClient::new(client, policy)))
        }
        _ => Err(QaError::Config(format!(
            "Unknown generation provider: {}",
            provider
        ))),
    }
}
