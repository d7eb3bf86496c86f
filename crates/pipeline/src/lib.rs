//! Retrieval-and-generation pipeline for the aeroqa service.
//!
//! Turns a natural-language question into a grounded, cited, confidence-
//! scored answer: embed the query, run similarity search with
//! thresholding against the vector store, compose a grounded prompt,
//! invoke the generation model, and assemble the structured response.

pub mod assemble;
pub mod confidence;
pub mod embeddings;
pub mod health;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use confidence::ConfidencePolicy;
pub use embeddings::{create_embedder, EmbeddingProvider};
pub use health::{check_health, ComponentStatus, HealthReport};
pub use pipeline::{PipelineSettings, QueryPipeline};
pub use retriever::{Retrieval, Retriever};
pub use store::{SqliteVectorStore, StoredDocument, VectorStore};
pub use types::{
    ChunkMetadata, QueryLimits, QueryRequest, QueryResponse, RetrievedChunk, SourceCitation,
};
