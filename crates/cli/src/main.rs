//! Aeroqa CLI
//!
//! Command-line front end for the retrieval-augmented question answering
//! service: query the knowledge base, probe dependency health, and seed
//! documents into the vector store.

mod commands;

use clap::{Parser, Subcommand};
use commands::{HealthCommand, QueryCommand, SeedCommand};
use aeroqa_core::{config::AppConfig, logging, QaResult};
use std::path::PathBuf;

/// Aeroqa - retrieval-augmented question answering over a document store
#[derive(Parser, Debug)]
#[command(name = "aeroqa")]
#[command(about = "Retrieval-augmented question answering", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "AEROQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (ollama)
    #[arg(short, long, global = true, env = "AEROQA_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "AEROQA_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question against the knowledge base
    Query(QueryCommand),

    /// Probe the store, embedding, and generation backends
    Health(HealthCommand),

    /// Load documents into the vector store
    Seed(SeedCommand),
}

#[tokio::main]
async fn main() -> QaResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let mut config = AppConfig::load()?;

    // An explicit --config merges over the environment-derived values
    if let Some(ref config_file) = cli.config {
        config.merge_file(config_file)?;
    }

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.validate()?;

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Aeroqa CLI starting");
    tracing::debug!("Store: {:?}", config.store_path);
    tracing::debug!("Collection: {}", config.collection);
    tracing::debug!("Provider: {}, model: {}", config.provider, config.model);

    let command_name = match &cli.command {
        Commands::Query(_) => "query",
        Commands::Health(_) => "health",
        Commands::Seed(_) => "seed",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Query(cmd) => cmd.execute(&config).await,
        Commands::Health(cmd) => cmd.execute(&config).await,
        Commands::Seed(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
