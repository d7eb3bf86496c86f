//! Retrieval stage: query embedding plus thresholded similarity search.

use std::sync::Arc;

use aeroqa_core::QaResult;
use tracing::{debug, info};

use crate::embeddings::EmbeddingProvider;
use crate::store::VectorStore;
use crate::types::{ChunkMetadata, RetrievedChunk};

/// Outcome of one retrieval: the passages to ground on, plus the count
/// that qualified before truncation (reported as `total_sources_found`).
#[derive(Debug, Clone)]
pub struct Retrieval {
    /// Qualifying chunks, similarity-descending, at most max_results
    pub chunks: Vec<RetrievedChunk>,

    /// Candidates at or above the threshold before truncation
    pub total_above_threshold: usize,
}

impl Retrieval {
    /// Similarity scores of the retained chunks, in order.
    pub fn scores(&self) -> Vec<f32> {
        self.chunks.iter().map(|c| c.similarity_score).collect()
    }
}

/// Orchestrates the embedder and the vector store client.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,

    /// How many candidates to pull from the store per query. Fetching up
    /// to the deployment cap (not just max_results) keeps
    /// total_above_threshold meaningful when the caller asks for fewer.
    candidate_limit: usize,
}

impl Retriever {
    /// Create a retriever over the given service handles.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        candidate_limit: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            candidate_limit: candidate_limit.max(1),
        }
    }

    /// Retrieve passages relevant to `query_text`.
    ///
    /// Embeds the query once, issues one store read, filters by the
    /// threshold and truncates to `max_results`. A failure from either
    /// dependency propagates; it is never collapsed into an empty result.
    pub async fn retrieve(
        &self,
        query_text: &str,
        max_results: usize,
        similarity_threshold: f32,
    ) -> QaResult<Retrieval> {
        debug!(
            "Retrieving for query ({} chars), max_results={}, threshold={:.2}",
            query_text.len(),
            max_results,
            similarity_threshold
        );

        let query_embedding = self.embedder.embed(query_text).await?;

        let fetch_limit = self.candidate_limit.max(max_results);
        let candidates = self
            .store
            .similarity_search(&query_embedding, fetch_limit)
            .await?;

        debug!("Store returned {} candidates", candidates.len());

        // Stable filter keeps the store's descending order and tie order
        let mut chunks: Vec<RetrievedChunk> = candidates
            .into_iter()
            .filter(|(_, score)| *score >= similarity_threshold)
            .map(|(document, score)| RetrievedChunk {
                content: document.content,
                metadata: parse_metadata(document.metadata),
                similarity_score: score,
            })
            .collect();

        let total_above_threshold = chunks.len();
        chunks.truncate(max_results);

        info!(
            "Retrieved {} qualifying passages ({} kept) above threshold {:.2}",
            total_above_threshold,
            chunks.len(),
            similarity_threshold
        );

        Ok(Retrieval {
            chunks,
            total_above_threshold,
        })
    }
}

/// Decode store metadata into the typed shape, tolerating anything that
/// is not an object by keeping it empty.
fn parse_metadata(value: serde_json::Value) -> ChunkMetadata {
    match serde_json::from_value(value) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!("Malformed chunk metadata, ignoring: {}", e);
            ChunkMetadata::default()
        }
    }
}
