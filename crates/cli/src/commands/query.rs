//! Query command handler.
//!
//! Runs one question through the full retrieval and generation pipeline
//! and prints the structured response.

use clap::Args;

use aeroqa_core::{AppConfig, QaResult};
use aeroqa_pipeline::{PipelineSettings, QueryPipeline, QueryRequest, Retriever};

use super::build_services;

/// Ask a question against the knowledge base
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// The question to ask
    pub question: String,

    /// Maximum number of cited sources
    #[arg(short = 'n', long)]
    pub max_results: Option<usize>,

    /// Minimum similarity score in [0, 1] for a passage to qualify
    #[arg(short = 't', long)]
    pub threshold: Option<f32>,

    /// Output the full response as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryCommand {
    pub async fn execute(&self, config: &AppConfig) -> QaResult<()> {
        tracing::info!("Executing query command");

        let services = build_services(config)?;
        let retriever = Retriever::new(
            services.embedder,
            services.store,
            config.max_results_cap,
        );
        let pipeline = QueryPipeline::new(
            retriever,
            services.generator,
            PipelineSettings::from(config),
        );

        let request = QueryRequest {
            query: self.question.clone(),
            max_results: self.max_results,
            similarity_threshold: self.threshold,
        };

        match pipeline.execute(&request).await {
            Ok(response) => {
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                } else {
                    println!("{}", response.answer);
                    if !response.sources.is_empty() {
                        println!();
                        println!(
                            "Sources ({} of {} above threshold):",
                            response.sources.len(),
                            response.total_sources_found
                        );
                        for (i, source) in response.sources.iter().enumerate() {
                            let location = match (&source.source_file, source.page_number) {
                                (Some(file), Some(page)) => format!(" [{} p.{}]", file, page),
                                (Some(file), None) => format!(" [{}]", file),
                                _ => String::new(),
                            };
                            println!(
                                "  {}. (score {:.3}){} {}",
                                i + 1,
                                source.similarity_score,
                                location,
                                source.content
                            );
                        }
                    }
                    println!();
                    println!(
                        "Confidence: {:.3} ({}ms)",
                        response.confidence, response.processing_time_ms
                    );
                }
                Ok(())
            }
            Err(error) => {
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&error.to_body())?);
                }
                Err(error)
            }
        }
    }
}
