//! Seed command handler.
//!
//! Loads documents from a JSON Lines file into the vector store,
//! embedding any record that does not carry a precomputed vector.

use std::path::PathBuf;

use clap::Args;
use serde::Deserialize;

use aeroqa_core::{AppConfig, QaError, QaResult};
use aeroqa_pipeline::{EmbeddingProvider, StoredDocument};

use super::build_services;

/// One input record: `{"id": ..., "content": ..., "embedding": ..., "metadata": ...}`.
///
/// Only `content` is required; a missing id is derived from the line
/// number and a missing embedding is computed locally.
#[derive(Debug, Deserialize)]
struct SeedRecord {
    id: Option<String>,
    content: String,
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    metadata: serde_json::Value,
}

/// Load documents into the vector store
#[derive(Args, Debug)]
pub struct SeedCommand {
    /// Path to a JSON Lines file of documents
    pub file: PathBuf,
}

impl SeedCommand {
    pub async fn execute(&self, config: &AppConfig) -> QaResult<()> {
        tracing::info!("Seeding documents from {:?}", self.file);

        let services = build_services(config)?;
        services.store.ensure_collection()?;

        let contents = std::fs::read_to_string(&self.file)?;

        let mut loaded = 0usize;
        for (line_number, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let record: SeedRecord = serde_json::from_str(line).map_err(|e| {
                QaError::InvalidInput(format!(
                    "Malformed record on line {}: {}",
                    line_number + 1,
                    e
                ))
            })?;

            if record.content.trim().is_empty() {
                return Err(QaError::InvalidInput(format!(
                    "Empty content on line {}",
                    line_number + 1
                )));
            }

            let embedding = match record.embedding {
                Some(embedding) => embedding,
                None => services.embedder.embed(&record.content).await?,
            };

            let document = StoredDocument {
                id: record
                    .id
                    .unwrap_or_else(|| format!("doc-{}", line_number + 1)),
                content: record.content,
                metadata: record.metadata,
            };

            services.store.upsert_document(&document, &embedding)?;
            loaded += 1;
        }

        let total = services.store.document_count()?;
        tracing::info!("Seeded {} document(s)", loaded);
        println!(
            "Loaded {} document(s) into collection '{}' ({} total)",
            loaded, config.collection, total
        );

        Ok(())
    }
}
