//! Generation client abstraction and request/response types.

use aeroqa_core::{QaError, QaResult};
use serde::{Deserialize, Serialize};

/// Sampling temperature must stay inside this range.
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

/// Generation request sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The grounded prompt text
    pub prompt: String,

    /// Model identifier (e.g., "mistral", "llama3")
    pub model: String,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    /// Create a new generation request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            system: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Validate generation parameters before any network round trip.
    ///
    /// Out-of-range values are guaranteed to fail remotely, so they are
    /// rejected here with `InvalidGenerationParameters`.
    pub fn validate(&self) -> QaResult<()> {
        if let Some(max_tokens) = self.max_tokens {
            if max_tokens == 0 {
                return Err(QaError::InvalidGenerationParameters(
                    "max_tokens must be positive".to_string(),
                ));
            }
        }

        if let Some(temperature) = self.temperature {
            if !TEMPERATURE_RANGE.contains(&temperature) {
                return Err(QaError::InvalidGenerationParameters(format!(
                    "temperature must be in [{:.1}, {:.1}], got {}",
                    TEMPERATURE_RANGE.start(),
                    TEMPERATURE_RANGE.end(),
                    temperature
                )));
            }
        }

        Ok(())
    }
}

/// Generation response from the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated answer text
    pub text: String,

    /// Model that generated the response
    pub model: String,

    /// Token usage statistics as reported by the model server
    pub usage: GenerationUsage,

    /// Wall-clock latency of the successful attempt in milliseconds
    #[serde(default)]
    pub elapsed_ms: u64,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl GenerationUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for generation model providers.
///
/// Implementations perform a single model invocation per `generate` call;
/// retry and timeout handling belong to [`crate::RetryingClient`], which
/// also implements this trait as a decorator.
#[async_trait::async_trait]
pub trait GenerationClient: Send + Sync {
    /// Get the provider name (e.g., "ollama").
    fn provider_name(&self) -> &str;

    /// Invoke the model with a composed prompt.
    ///
    /// Does not return until a result or a terminal failure is known.
    async fn generate(&self, request: &GenerationRequest) -> QaResult<GenerationResponse>;

    /// Check that the model endpoint is reachable.
    async fn ping(&self) -> QaResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new("prompt", "mistral")
            .with_system("system")
            .with_max_tokens(384)
            .with_temperature(0.5);

        assert_eq!(request.prompt, "prompt");
        assert_eq!(request.model, "mistral");
        assert_eq!(request.system.as_deref(), Some("system"));
        assert_eq!(request.max_tokens, Some(384));
        assert_eq!(request.temperature, Some(0.5));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_max_tokens() {
        let request = GenerationRequest::new("p", "m").with_max_tokens(0);
        let err = request.validate().unwrap_err();
        assert_eq!(err.kind(), "invalid_generation_parameters");
    }

    #[test]
    fn test_validate_temperature_out_of_range() {
        let request = GenerationRequest::new("p", "m").with_temperature(2.5);
        assert!(request.validate().is_err());

        let request = GenerationRequest::new("p", "m").with_temperature(-0.1);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validate_defaults_pass() {
        let request = GenerationRequest::new("p", "m");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_usage_totals() {
        let usage = GenerationUsage::new(120, 80);
        assert_eq!(usage.total_tokens, 200);
    }
}
