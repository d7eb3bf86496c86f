//! Health command handler.

use clap::Args;

use aeroqa_core::{AppConfig, QaError, QaResult};
use aeroqa_pipeline::check_health;

use super::build_services;

/// Probe the store, embedding, and generation backends
#[derive(Args, Debug)]
pub struct HealthCommand {
    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl HealthCommand {
    pub async fn execute(&self, config: &AppConfig) -> QaResult<()> {
        tracing::info!("Executing health command");

        let services = build_services(config)?;
        let report = check_health(
            services.store.as_ref(),
            services.embedder.as_ref(),
            &services.generator,
        )
        .await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("store:      {:?}", report.store);
            println!("embeddings: {:?}", report.embeddings);
            println!("generator:  {:?}", report.generator);
            println!("overall:    {:?}", report.status);
        }

        if report.is_healthy() {
            Ok(())
        } else {
            Err(QaError::Config(
                "One or more components are unhealthy".to_string(),
            ))
        }
    }
}
