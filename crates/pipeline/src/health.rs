//! Health probing for the pipeline's dependencies.
//!
//! `check_health` probes each dependency independently and always
//! returns a report; an unreachable dependency degrades the report
//! instead of failing the check.

use std::sync::Arc;

use aeroqa_llm::GenerationClient;
use serde::Serialize;
use tracing::warn;

use crate::embeddings::EmbeddingProvider;
use crate::store::VectorStore;

/// Probe text used against the embedding provider.
const PROBE_TEXT: &str = "healthcheck";

/// State of one probed dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ComponentStatus::Healthy)
    }
}

/// Aggregate health report over all pipeline dependencies.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall status: healthy only when every component is
    pub status: ComponentStatus,
    pub store: ComponentStatus,
    pub embeddings: ComponentStatus,
    pub generator: ComponentStatus,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }
}

/// Probe the store, embedding provider, and generation backend.
///
/// Never returns an error: each failed probe is logged and reported as
/// unhealthy.
pub async fn check_health(
    store: &dyn VectorStore,
    embedder: &dyn EmbeddingProvider,
    generator: &Arc<dyn GenerationClient>,
) -> HealthReport {
    let store_status = match store.ping().await {
        Ok(()) => ComponentStatus::Healthy,
        Err(error) => {
            warn!("Store health probe failed: {}", error);
            ComponentStatus::Unhealthy
        }
    };

    let embeddings_status = match embedder.embed(PROBE_TEXT).await {
        Ok(_) => ComponentStatus::Healthy,
        Err(error) => {
            warn!("Embedding health probe failed: {}", error);
            ComponentStatus::Unhealthy
        }
    };

    let generator_status = match generator.ping().await {
        Ok(()) => ComponentStatus::Healthy,
        Err(error) => {
            warn!("Generator health probe failed: {}", error);
            ComponentStatus::Unhealthy
        }
    };

    let overall = if store_status.is_healthy()
        && embeddings_status.is_healthy()
        && generator_status.is_healthy()
    {
        ComponentStatus::Healthy
    } else {
        ComponentStatus::Unhealthy
    };

    HealthReport {
        status: overall,
        store: store_status,
        embeddings: embeddings_status,
        generator: generator_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::TrigramProvider;
    use crate::store::SqliteVectorStore;
    use aeroqa_core::{QaError, QaResult};
    use aeroqa_llm::{GenerationRequest, GenerationResponse};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct StubGenerator {
        healthy: bool,
    }

    #[async_trait]
    impl GenerationClient for StubGenerator {
        fn provider_name(&self) -> &str {
            "stub"
        }

        async fn generate(&self, request: &GenerationRequest) -> QaResult<GenerationResponse> {
            Ok(GenerationResponse {
                text: "ok".to_string(),
                model: request.model.clone(),
                usage: Default::default(),
                elapsed_ms: 0,
            })
        }

        async fn ping(&self) -> QaResult<()> {
            if self.healthy {
                Ok(())
            } else {
                Err(QaError::GenerationFailure {
                    reason: aeroqa_core::GenerationFailureReason::Remote,
                    message: "backend down".to_string(),
                })
            }
        }
    }

    #[tokio::test]
    async fn test_all_healthy() {
        let store = SqliteVectorStore::open_in_memory("airline_docs").unwrap();
        store.ensure_collection().unwrap();
        let embedder = TrigramProvider::new(256);
        let generator: Arc<dyn GenerationClient> = Arc::new(StubGenerator { healthy: true });

        let report = check_health(&store, &embedder, &generator).await;
        assert!(report.is_healthy());
        assert_eq!(report.store, ComponentStatus::Healthy);
        assert_eq!(report.embeddings, ComponentStatus::Healthy);
        assert_eq!(report.generator, ComponentStatus::Healthy);
    }

    #[tokio::test]
    async fn test_unhealthy_generator_degrades_overall() {
        let store = SqliteVectorStore::open_in_memory("airline_docs").unwrap();
        store.ensure_collection().unwrap();
        let embedder = TrigramProvider::new(256);
        let generator: Arc<dyn GenerationClient> = Arc::new(StubGenerator { healthy: false });

        let report = check_health(&store, &embedder, &generator).await;
        assert!(!report.is_healthy());
        assert_eq!(report.store, ComponentStatus::Healthy);
        assert_eq!(report.generator, ComponentStatus::Unhealthy);
    }
}
