//! Answer assembly: raw generation output into the structured response.
//!
//! Pure projection over upstream data; performs no I/O and cannot fail.

use std::collections::HashSet;

use chrono::Utc;

use crate::confidence::{detects_no_information, ConfidencePolicy};
use crate::retriever::Retrieval;
use crate::types::{QueryResponse, SourceCitation};

/// Build the final response from the generated answer and the retrieval
/// that grounded it.
///
/// Citations preserve the chunks' similarity-descending order; duplicate
/// (content, metadata) pairs are dropped, keeping the highest-ranked
/// occurrence.
pub fn assemble(
    answer: String,
    retrieval: &Retrieval,
    query_text: &str,
    processing_time_ms: u64,
    policy: &ConfidencePolicy,
) -> QueryResponse {
    let no_information = detects_no_information(&answer);
    let confidence = policy.score(&retrieval.scores(), no_information);

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut sources = Vec::with_capacity(retrieval.chunks.len());

    for chunk in &retrieval.chunks {
        let metadata_key =
            serde_json::to_string(&chunk.metadata).unwrap_or_else(|_| String::new());
        if seen.insert((chunk.content.clone(), metadata_key)) {
            sources.push(SourceCitation::from_chunk(chunk));
        }
    }

    QueryResponse {
        answer,
        sources,
        confidence,
        query: query_text.to_string(),
        total_sources_found: retrieval.total_above_threshold,
        processing_time_ms,
        timestamp: Utc::now(),
    }
}
