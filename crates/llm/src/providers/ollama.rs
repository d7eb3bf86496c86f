//! Ollama generation provider.
//!
//! Single-attempt HTTP client for the Ollama runtime; retries live in
//! [`crate::RetryingClient`]. HTTP statuses are mapped onto the service's
//! generation failure reasons so the retry policy can classify them.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use std::time::Instant;

use aeroqa_core::{GenerationFailureReason, QaError, QaResult};
use serde::{Deserialize, Serialize};

use crate::client::{GenerationClient, GenerationRequest, GenerationResponse, GenerationUsage};

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    stream: bool,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama generation client.
pub struct OllamaGenerator {
    /// Base URL for Ollama API
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaGenerator {
    /// Create a new Ollama client with default settings.
    ///
    /// Default URL: http://localhost:11434
    pub fn new() -> Self {
        Self::with_base_url("http://localhost:11434")
    }

    /// Create a new Ollama client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Convert GenerationRequest to Ollama format.
    fn to_ollama_request(&self, request: &GenerationRequest) -> OllamaRequest {
        OllamaRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            temperature: request.temperature,
            num_predict: request.max_tokens,
            stream: false,
        }
    }

    /// Map an HTTP error status onto a generation failure reason.
    fn classify_status(status: reqwest::StatusCode) -> GenerationFailureReason {
        match status.as_u16() {
            401 | 403 => GenerationFailureReason::Unauthorized,
            404 => GenerationFailureReason::ModelNotFound,
            400 => GenerationFailureReason::BadRequest,
            429 => GenerationFailureReason::Throttled,
            _ => GenerationFailureReason::Remote,
        }
    }
}

impl Default for OllamaGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl GenerationClient for OllamaGenerator {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: &GenerationRequest) -> QaResult<GenerationResponse> {
        tracing::debug!("Sending generation request to Ollama: model={}", request.model);

        let started = Instant::now();
        let ollama_request = self.to_ollama_request(request);
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| QaError::GenerationFailure {
                reason: GenerationFailureReason::Remote,
                message: format!("Failed to send request to Ollama: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(QaError::GenerationFailure {
                reason: Self::classify_status(status),
                message: format!("Ollama API error ({}): {}", status, error_text),
            });
        }

        let ollama_response: OllamaResponse =
            response.json().await.map_err(|e| QaError::GenerationFailure {
                reason: GenerationFailureReason::Remote,
                message: format!("Failed to parse Ollama response: {}", e),
            })?;

        let usage = GenerationUsage::new(
            ollama_response.prompt_eval_count.unwrap_or(0),
            ollama_response.eval_count.unwrap_or(0),
        );

        tracing::debug!(
            "Received completion from Ollama ({} tokens)",
            usage.total_tokens
        );

        Ok(GenerationResponse {
            text: ollama_response.response.trim().to_string(),
            model: ollama_response.model,
            usage,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn ping(&self) -> QaResult<()> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| QaError::GenerationFailure {
                reason: GenerationFailureReason::Remote,
                message: format!("Ollama unreachable: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(QaError::GenerationFailure {
                reason: Self::classify_status(response.status()),
                message: format!("Ollama health probe failed: {}", response.status()),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_conversion() {
        let generator = OllamaGenerator::new();
        let request = GenerationRequest::new("the prompt", "mistral")
            .with_system("the system")
            .with_max_tokens(384)
            .with_temperature(0.5);

        let ollama = generator.to_ollama_request(&request);
        assert_eq!(ollama.model, "mistral");
        assert_eq!(ollama.prompt, "the prompt");
        assert_eq!(ollama.system.as_deref(), Some("the system"));
        assert_eq!(ollama.num_predict, Some(384));
        assert!(!ollama.stream);
    }

    #[test]
    fn test_status_classification() {
        use reqwest::StatusCode;
        assert_eq!(
            OllamaGenerator::classify_status(StatusCode::UNAUTHORIZED),
            GenerationFailureReason::Unauthorized
        );
        assert_eq!(
            OllamaGenerator::classify_status(StatusCode::NOT_FOUND),
            GenerationFailureReason::ModelNotFound
        );
        assert_eq!(
            OllamaGenerator::classify_status(StatusCode::BAD_REQUEST),
            GenerationFailureReason::BadRequest
        );
        assert_eq!(
            OllamaGenerator::classify_status(StatusCode::TOO_MANY_REQUESTS),
            GenerationFailureReason::Throttled
        );
        assert_eq!(
            OllamaGenerator::classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            GenerationFailureReason::Remote
        );
    }
}
