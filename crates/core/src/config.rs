//! Configuration management for the aeroqa RAG service.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Environment variables (`AEROQA_*`)
//! - An optional YAML config file
//! - Command-line flags (applied last by the CLI)
//!
//! Retrieval and generation tunables all have deployment defaults so the
//! service runs with nothing but a populated vector store.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{QaError, QaResult};

/// Main application configuration.
///
/// Holds the process-wide settings shared by every pipeline run: the
/// vector collection to query, retrieval defaults and caps, generation
/// model parameters, and the retry/timeout budget for the model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite vector store database
    pub store_path: PathBuf,

    /// Vector collection to query
    pub collection: String,

    /// Optional config file path
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Default number of chunks to retrieve when the caller omits it
    pub top_k: usize,

    /// Hard cap on caller-supplied max_results
    pub max_results_cap: usize,

    /// Default similarity threshold in [0, 1]
    pub similarity_threshold: f32,

    /// Generation provider (e.g. "ollama")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// Provider endpoint override
    pub endpoint: Option<String>,

    /// API key for providers that require one
    pub api_key: Option<String>,

    /// Maximum tokens per generated answer
    pub max_tokens: u32,

    /// Sampling temperature for generation
    pub temperature: f32,

    /// Per-attempt generation timeout in seconds
    pub generation_timeout_secs: u64,

    /// Maximum generation attempts (1 = no retry)
    pub generation_max_attempts: u32,

    /// Embedding provider ("trigram" or "ollama")
    pub embedding_provider: String,

    /// Embedding model identifier (for remote providers)
    pub embedding_model: String,

    /// Embedding vector dimension
    pub embedding_dim: usize,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    #[serde(skip)]
    pub verbose: bool,

    /// Disable colored output
    #[serde(skip)]
    pub no_color: bool,
}

/// Config file structure (YAML).
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    store: Option<StoreConfig>,
    retrieval: Option<RetrievalConfig>,
    generation: Option<GenerationConfig>,
    embedding: Option<EmbeddingSection>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct StoreConfig {
    path: Option<String>,
    collection: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RetrievalConfig {
    #[serde(rename = "topK")]
    top_k: Option<usize>,
    #[serde(rename = "maxResultsCap")]
    max_results_cap: Option<usize>,
    #[serde(rename = "similarityThreshold")]
    similarity_threshold: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerationConfig {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "maxTokens")]
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    #[serde(rename = "timeoutSecs")]
    timeout_secs: Option<u64>,
    #[serde(rename = "maxAttempts")]
    max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("aeroqa.db"),
            collection: "airline_docs".to_string(),
            config_file: None,
            top_k: 5,
            max_results_cap: 20,
            similarity_threshold: 0.7,
            provider: "ollama".to_string(), // Local-first default
            model: "mistral".to_string(),
            endpoint: None,
            api_key: None,
            max_tokens: 384,
            temperature: 0.5,
            generation_timeout_secs: 30,
            generation_max_attempts: 3,
            embedding_provider: "trigram".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dim: 384,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `AEROQA_STORE_PATH`: SQLite vector store path
    /// - `AEROQA_COLLECTION`: vector collection name
    /// - `AEROQA_CONFIG`: path to config file
    /// - `AEROQA_TOP_K`, `AEROQA_SIMILARITY_THRESHOLD`: retrieval defaults
    /// - `AEROQA_PROVIDER`, `AEROQA_MODEL`, `AEROQA_ENDPOINT`,
    ///   `AEROQA_API_KEY`: generation settings
    /// - `AEROQA_MAX_TOKENS`, `AEROQA_TEMPERATURE`: model parameters
    /// - `RUST_LOG`: log level
    /// - `NO_COLOR`: disable colored output
    pub fn load() -> QaResult<Self> {
        let mut config = Self::default();

        if let Ok(config_file) = std::env::var("AEROQA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // YAML config file, if present, overrides defaults
        if let Some(config_path) = config.config_file.clone() {
            if !config_path.exists() {
                return Err(QaError::Config(format!(
                    "Config file does not exist: {:?}",
                    config_path
                )));
            }
            config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(path) = std::env::var("AEROQA_STORE_PATH") {
            config.store_path = PathBuf::from(path);
        }
        if let Ok(collection) = std::env::var("AEROQA_COLLECTION") {
            config.collection = collection;
        }
        if let Ok(top_k) = std::env::var("AEROQA_TOP_K") {
            config.top_k = top_k
                .parse()
                .map_err(|_| QaError::Config(format!("Invalid AEROQA_TOP_K: {}", top_k)))?;
        }
        if let Ok(threshold) = std::env::var("AEROQA_SIMILARITY_THRESHOLD") {
            config.similarity_threshold = threshold.parse().map_err(|_| {
                QaError::Config(format!("Invalid AEROQA_SIMILARITY_THRESHOLD: {}", threshold))
            })?;
        }
        if let Ok(provider) = std::env::var("AEROQA_PROVIDER") {
            config.provider = provider;
        }
        if let Ok(model) = std::env::var("AEROQA_MODEL") {
            config.model = model;
        }
        if let Ok(endpoint) = std::env::var("AEROQA_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }
        if let Ok(max_tokens) = std::env::var("AEROQA_MAX_TOKENS") {
            config.max_tokens = max_tokens
                .parse()
                .map_err(|_| QaError::Config(format!("Invalid AEROQA_MAX_TOKENS: {}", max_tokens)))?;
        }
        if let Ok(temperature) = std::env::var("AEROQA_TEMPERATURE") {
            config.temperature = temperature.parse().map_err(|_| {
                QaError::Config(format!("Invalid AEROQA_TEMPERATURE: {}", temperature))
            })?;
        }

        config.api_key = std::env::var("AEROQA_API_KEY").ok();
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Merge a YAML configuration file given on the command line.
    ///
    /// Values already set from the environment keep precedence only for
    /// keys the file does not mention.
    pub fn merge_file(&mut self, path: &PathBuf) -> QaResult<()> {
        if !path.exists() {
            return Err(QaError::Config(format!(
                "Config file does not exist: {:?}",
                path
            )));
        }
        self.config_file = Some(path.clone());
        self.merge_yaml(path)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> QaResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            QaError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            QaError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(store) = file.store {
            if let Some(path) = store.path {
                self.store_path = PathBuf::from(path);
            }
            if let Some(collection) = store.collection {
                self.collection = collection;
            }
        }

        if let Some(retrieval) = file.retrieval {
            if let Some(top_k) = retrieval.top_k {
                self.top_k = top_k;
            }
            if let Some(cap) = retrieval.max_results_cap {
                self.max_results_cap = cap;
            }
            if let Some(threshold) = retrieval.similarity_threshold {
                self.similarity_threshold = threshold;
            }
        }

        if let Some(generation) = file.generation {
            if let Some(provider) = generation.provider {
                self.provider = provider;
            }
            if let Some(model) = generation.model {
                self.model = model;
            }
            if let Some(endpoint) = generation.endpoint {
                self.endpoint = Some(endpoint);
            }
            if let Some(max_tokens) = generation.max_tokens {
                self.max_tokens = max_tokens;
            }
            if let Some(temperature) = generation.temperature {
                self.temperature = temperature;
            }
            if let Some(timeout) = generation.timeout_secs {
                self.generation_timeout_secs = timeout;
            }
            if let Some(attempts) = generation.max_attempts {
                self.generation_max_attempts = attempts;
            }
        }

        if let Some(embedding) = file.embedding {
            if let Some(provider) = embedding.provider {
                self.embedding_provider = provider;
            }
            if let Some(model) = embedding.model {
                self.embedding_model = model;
            }
            if let Some(dimensions) = embedding.dimensions {
                self.embedding_dim = dimensions;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the
    /// config file.
    pub fn with_overrides(
        mut self,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> QaResult<()> {
        let known_providers = ["ollama"];
        if !known_providers.contains(&self.provider.as_str()) {
            return Err(QaError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        let known_embedders = ["trigram", "ollama"];
        if !known_embedders.contains(&self.embedding_provider.as_str()) {
            return Err(QaError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                known_embedders.join(", ")
            )));
        }

        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(QaError::Config(format!(
                "similarity_threshold must be in [0, 1], got {}",
                self.similarity_threshold
            )));
        }

        if self.top_k == 0 || self.top_k > self.max_results_cap {
            return Err(QaError::Config(format!(
                "top_k must be in 1..={}, got {}",
                self.max_results_cap, self.top_k
            )));
        }

        if self.generation_max_attempts == 0 {
            return Err(QaError::Config(
                "generation_max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
