//! Command handlers for the aeroqa CLI.

pub mod health;
pub mod query;
pub mod seed;

use std::sync::Arc;
use std::time::Duration;

use aeroqa_core::{AppConfig, QaResult};
use aeroqa_llm::{create_generation_client, GenerationClient, RetryPolicy};
use aeroqa_pipeline::{create_embedder, EmbeddingProvider, SqliteVectorStore};

pub use health::HealthCommand;
pub use query::QueryCommand;
pub use seed::SeedCommand;

/// Shared service handles built once per command invocation.
pub struct Services {
    pub store: Arc<SqliteVectorStore>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub generator: Arc<dyn GenerationClient>,
}

/// Construct the store, embedder, and generation client from config.
pub fn build_services(config: &AppConfig) -> QaResult<Services> {
    let store = SqliteVectorStore::open(&config.store_path, &config.collection)?;

    let embedder = create_embedder(config)?;

    let policy = RetryPolicy {
        max_attempts: config.generation_max_attempts,
        request_timeout: Duration::from_secs(config.generation_timeout_secs),
        ..RetryPolicy::default()
    };
    let generator = create_generation_client(
        &config.provider,
        config.endpoint.as_deref(),
        config.api_key.as_deref(),
        policy,
    )?;

    Ok(Services {
        store: Arc::new(store),
        embedder,
        generator,
    })
}
