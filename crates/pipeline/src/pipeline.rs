//! Pipeline orchestrator.
//!
//! Runs one query through the strictly sequential stages
//! retrieve → compose → generate → assemble, carrying each stage's
//! output into the next. A failure at any stage aborts the run with the
//! structured error; no partial response is ever produced.

use std::sync::Arc;
use std::time::Instant;

use aeroqa_core::{AppConfig, QaResult};
use aeroqa_llm::{GenerationClient, GenerationRequest};
use tracing::{debug, info, instrument};

use crate::assemble::assemble;
use crate::confidence::ConfidencePolicy;
use crate::prompt;
use crate::retriever::Retriever;
use crate::types::{QueryLimits, QueryRequest, QueryResponse};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Retrieving,
    Composing,
    Generating,
    Assembling,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Retrieving => "retrieving",
            Stage::Composing => "composing",
            Stage::Generating => "generating",
            Stage::Assembling => "assembling",
        }
    }
}

/// Per-deployment pipeline settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Default number of sources when the caller omits max_results
    pub default_max_results: usize,

    /// Hard cap on caller-supplied max_results
    pub max_results_cap: usize,

    /// Default similarity threshold
    pub default_threshold: f32,

    /// Generation model identifier
    pub model: String,

    /// Maximum tokens per generated answer
    pub max_tokens: u32,

    /// Sampling temperature for generation
    pub temperature: f32,
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_max_results: config.top_k,
            max_results_cap: config.max_results_cap,
            default_threshold: config.similarity_threshold,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

impl PipelineSettings {
    fn limits(&self) -> QueryLimits {
        QueryLimits {
            default_max_results: self.default_max_results,
            max_results_cap: self.max_results_cap,
            default_threshold: self.default_threshold,
        }
    }
}

/// The top-level query pipeline.
///
/// Holds only process-wide service handles constructed at startup; every
/// request runs independently, so arbitrarily many may be in flight.
pub struct QueryPipeline {
    retriever: Retriever,
    generator: Arc<dyn GenerationClient>,
    settings: PipelineSettings,
    confidence: ConfidencePolicy,
}

impl QueryPipeline {
    /// Assemble the pipeline from its service handles.
    pub fn new(
        retriever: Retriever,
        generator: Arc<dyn GenerationClient>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            retriever,
            generator,
            settings,
            confidence: ConfidencePolicy::default(),
        }
    }

    /// Replace the confidence scoring policy.
    pub fn with_confidence_policy(mut self, policy: ConfidencePolicy) -> Self {
        self.confidence = policy;
        self
    }

    /// Run one query end to end.
    ///
    /// Invalid input is rejected before any external call. Zero
    /// qualifying passages yields the canonical well-formed
    /// no-information response rather than a generation round trip the
    /// prompt would only use to refuse.
    #[instrument(skip(self, request), fields(query_len = request.query.len()))]
    pub async fn execute(&self, request: &QueryRequest) -> QaResult<QueryResponse> {
        let started = Instant::now();
        let limits = self.settings.limits();

        request.validate(&limits)?;

        let max_results = request.effective_max_results(&limits);
        let threshold = request.effective_threshold(&limits);

        info!(
            "Processing query ({} chars), max_results={}, threshold={:.2}",
            request.query.len(),
            max_results,
            threshold
        );

        let retrieval = self
            .run_stage(Stage::Retrieving, async {
                self.retriever
                    .retrieve(&request.query, max_results, threshold)
                    .await
            })
            .await?;

        if retrieval.chunks.is_empty() {
            info!("No passages above threshold {:.2}, returning no-information response", threshold);
            return Ok(QueryResponse::no_information(
                &request.query,
                started.elapsed().as_millis() as u64,
            ));
        }

        let grounded = self
            .run_stage(Stage::Composing, async {
                Ok(prompt::compose(&request.query, &retrieval.chunks))
            })
            .await?;

        let generation = self
            .run_stage(Stage::Generating, async {
                let generation_request =
                    GenerationRequest::new(grounded.user.clone(), self.settings.model.clone())
                        .with_system(grounded.system.clone())
                        .with_max_tokens(self.settings.max_tokens)
                        .with_temperature(self.settings.temperature);
                self.generator.generate(&generation_request).await
            })
            .await?;

        let response = self
            .run_stage(Stage::Assembling, async {
                Ok(assemble(
                    generation.text,
                    &retrieval,
                    &request.query,
                    started.elapsed().as_millis() as u64,
                    &self.confidence,
                ))
            })
            .await?;

        info!(
            "Query completed in {}ms: {} sources, confidence {:.3}",
            response.processing_time_ms,
            response.sources.len(),
            response.confidence
        );

        Ok(response)
    }

    /// Run one stage with timing and failure capture.
    async fn run_stage<T>(
        &self,
        stage: Stage,
        fut: impl std::future::Future<Output = QaResult<T>>,
    ) -> QaResult<T> {
        let stage_started = Instant::now();
        match fut.await {
            Ok(output) => {
                debug!(
                    stage = stage.as_str(),
                    elapsed_ms = stage_started.elapsed().as_millis() as u64,
                    "Stage completed"
                );
                Ok(output)
            }
            Err(error) => {
                tracing::error!(
                    stage = stage.as_str(),
                    error_kind = error.kind(),
                    "Pipeline failed: {}",
                    error
                );
                Err(error)
            }
        }
    }
}
