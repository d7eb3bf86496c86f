//! Aeroqa Core Library
//!
//! This crate provides the foundational utilities for the aeroqa RAG service:
//! - Error handling (`QaError`, `QaResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{ErrorBody, GenerationFailureReason, QaError, QaResult};
