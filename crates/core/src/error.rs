//! Error types for the aeroqa RAG service.
//!
//! This module defines a unified error enum covering every failure the
//! query pipeline can surface: invalid caller input, embedding and vector
//! store failures, and generation failures with reason codes. Transports
//! map errors to responses via `kind()` and `is_client_error()`.

use serde::Serialize;
use thiserror::Error;

/// Reason codes for generation failures.
///
/// The retry policy in `aeroqa-llm` uses these to decide whether a failed
/// model call is worth retrying. `Throttled` and `Remote` are transient;
/// the rest are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationFailureReason {
    /// Authentication or authorization was rejected
    Unauthorized,
    /// The requested model does not exist at the endpoint
    ModelNotFound,
    /// The request was malformed and rejected by the model server
    BadRequest,
    /// The model server is throttling requests
    Throttled,
    /// Server-side or transport-level failure
    Remote,
}

/// Unified error type for the aeroqa service.
///
/// All fallible functions in the workspace return `Result<T, QaError>`.
/// Runtime failures never panic; they are represented here and
/// propagated to the pipeline orchestrator, which aborts the request.
#[derive(Error, Debug)]
pub enum QaError {
    /// Bad query or parameters from the caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The embedding model failed to produce a query vector
    #[error("Embedding failure: {0}")]
    EmbeddingFailure(String),

    /// The vector store is unreachable or misconfigured
    #[error("Retrieval failure: {0}")]
    RetrievalFailure(String),

    /// The generation call exceeded its timeout on every attempt
    #[error("Generation timed out after {attempts} attempt(s)")]
    GenerationTimeout { attempts: u32 },

    /// The generation model call failed
    #[error("Generation failure ({reason:?}): {message}")]
    GenerationFailure {
        reason: GenerationFailureReason,
        message: String,
    },

    /// Out-of-range generation parameters, rejected before the remote call
    #[error("Invalid generation parameters: {0}")]
    InvalidGenerationParameters(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl QaError {
    /// Stable machine-readable error kind, suitable for wire responses.
    pub fn kind(&self) -> &'static str {
        match self {
            QaError::InvalidInput(_) => "invalid_input",
            QaError::EmbeddingFailure(_) => "embedding_failure",
            QaError::RetrievalFailure(_) => "retrieval_failure",
            QaError::GenerationTimeout { .. } => "generation_timeout",
            QaError::GenerationFailure { .. } => "generation_failure",
            QaError::InvalidGenerationParameters(_) => "invalid_generation_parameters",
            QaError::Config(_) => "config_error",
            QaError::Io(_) => "io_error",
            QaError::Serialization(_) => "serialization_error",
        }
    }

    /// Whether the caller is at fault (4xx-equivalent) rather than a
    /// dependency (5xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            QaError::InvalidInput(_) | QaError::InvalidGenerationParameters(_)
        )
    }

    /// Project into the structured wire shape.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error_kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Structured error response body: `{ error_kind, message }`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error_kind: &'static str,
    pub message: String,
}

impl From<serde_json::Error> for QaError {
    fn from(err: serde_json::Error) -> Self {
        QaError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for QaError {
    fn from(err: serde_yaml::Error) -> Self {
        QaError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with QaError.
pub type QaResult<T> = Result<T, QaError>;
