//! Generation model integration for the aeroqa RAG service.
//!
//! This crate provides a provider-agnostic abstraction for invoking the
//! answer-generation model. The remote call is wrapped in an explicit
//! retry policy that classifies failures as transient or terminal, so
//! throttling and timeouts are retried with backoff while auth and
//! bad-request errors surface immediately.
//!
//! # Providers
//! - **Ollama**: local model runtime (default)
//!
//! # Example
//! ```no_run
//! use aeroqa_llm::{create_generation_client, GenerationRequest, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_generation_client("ollama", None, None, RetryPolicy::default())?;
//! let request = GenerationRequest::new("What are the safety regulations?", "mistral")
//!     .with_max_tokens(384)
//!     .with_temperature(0.5);
//! let response = client.generate(&request).await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod retry;

// Re-export main types
pub use client::{GenerationClient, GenerationRequest, GenerationResponse, GenerationUsage};
pub use factory::create_generation_client;
pub use providers::OllamaGenerator;
pub use retry::{ErrorClass, RetryPolicy, RetryingClient};
