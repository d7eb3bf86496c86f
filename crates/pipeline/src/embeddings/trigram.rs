//! Trigram embedding provider using character trigram-based content-aware
//! embeddings.

use std::collections::HashMap;

use aeroqa_core::{QaError, QaResult};

use crate::embeddings::EmbeddingProvider;

/// Common words excluded from the vector so content words dominate.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "how",
];

/// Trigram-based embedding provider for local, offline operation.
///
/// Generates deterministic embeddings from character trigrams and word
/// frequencies. Not semantically accurate like neural embedding models,
/// but consistent and content-dependent, which is what the retrieval
/// pipeline needs for offline deployments and tests.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Generate a normalized trigram embedding for text.
    fn generate(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split_whitespace()
            .filter(|w| w.len() > 2 && !STOP_WORDS.contains(w))
            .collect();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in &words {
            *word_freq.entry(*word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            // Spread each word over several dimensions via its trigrams
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let dim_idx = hash_bytes(trigram.as_bytes(), 37) as usize % self.dimensions;
                embedding[dim_idx] += (*freq as f32).sqrt();
            }

            // Whole-word signal keeps short words represented
            let dim_idx = hash_bytes(word.as_bytes(), 31) as usize % self.dimensions;
            embedding[dim_idx] += *freq as f32;
        }

        normalize(&mut embedding);
        embedding
    }
}

/// Fold bytes into a hash with the given multiplier.
fn hash_bytes(bytes: &[u8], multiplier: u64) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| {
        acc.wrapping_mul(multiplier).wrapping_add(b as u64)
    })
}

/// Scale a vector to unit length in place.
fn normalize(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in embedding.iter_mut() {
            *v /= norm;
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> QaResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(QaError::EmbeddingFailure(
                "Cannot embed empty text".to_string(),
            ));
        }
        Ok(self.generate(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dimensions_and_normalization() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("airline safety regulations").await.unwrap();
        assert_eq!(embedding.len(), 384);

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = TrigramProvider::new(128);
        let a = provider.embed("cabin crew requirements").await.unwrap();
        let b = provider.embed("cabin crew requirements").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_different_content_differs() {
        let provider = TrigramProvider::new(128);
        let a = provider.embed("runway maintenance schedules").await.unwrap();
        let b = provider.embed("passenger baggage allowances").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_similar_content_scores_higher() {
        let provider = TrigramProvider::new(384);
        let query = provider.embed("airline safety regulations").await.unwrap();
        let related = provider
            .embed("safety regulations for airline operators")
            .await
            .unwrap();
        let unrelated = provider.embed("chocolate cake recipe").await.unwrap();

        let dot = |a: &[f32], b: &[f32]| -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() };
        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let provider = TrigramProvider::new(128);
        let err = provider.embed("   ").await.unwrap_err();
        assert_eq!(err.kind(), "embedding_failure");
    }
}
