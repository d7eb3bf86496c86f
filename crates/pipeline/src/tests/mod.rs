//! Crate-internal integration tests for the full query pipeline.
