//! Query embedding for the retrieval stage.
//!
//! Provider-agnostic embedding generation: a local deterministic trigram
//! provider for offline operation and an Ollama-backed provider for
//! neural embeddings.

pub mod ollama;
pub mod trigram;

use std::sync::Arc;

use aeroqa_core::{AppConfig, QaError, QaResult};

pub use ollama::OllamaEmbedder;
pub use trigram::TrigramProvider;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Map a text to a fixed-length vector.
    async fn embed(&self, text: &str) -> QaResult<Vec<f32>>;
}

/// Create an embedding provider from the application configuration.
pub fn create_embedder(config: &AppConfig) -> QaResult<Arc<dyn EmbeddingProvider>> {
    match config.embedding_provider.as_str() {
        "trigram" => Ok(Arc::new(TrigramProvider::new(config.embedding_dim))),
        "ollama" => {
            let embedder = OllamaEmbedder::new(
                config.endpoint.as_deref().unwrap_or("http://localhost:11434"),
                &config.embedding_model,
                config.embedding_dim,
            );
            Ok(Arc::new(embedder))
        }
        other => Err(QaError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_trigram_embedder() {
        let config = AppConfig::default();
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.provider_name(), "trigram");
        assert_eq!(embedder.dimensions(), 384);
    }

    #[test]
    fn test_create_ollama_embedder() {
        let mut config = AppConfig::default();
        config.embedding_provider = "ollama".to_string();
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.provider_name(), "ollama");
    }

    #[test]
    fn test_create_unknown_embedder() {
        let mut config = AppConfig::default();
        config.embedding_provider = "sentencepiece".to_string();
        let result = create_embedder(&config);
        assert!(result.is_err());
    }
}
