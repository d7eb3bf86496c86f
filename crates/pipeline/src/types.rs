//! Pipeline data model.
//!
//! Every type here is immutable once constructed and owned by a single
//! pipeline run; nothing is shared across requests.

use aeroqa_core::{QaError, QaResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum query length in characters.
pub const MAX_QUERY_LEN: usize = 1000;

/// Maximum length of a citation content excerpt.
const MAX_EXCERPT_LEN: usize = 200;

/// Caller-visible retrieval bounds, derived from configuration.
#[derive(Debug, Clone, Copy)]
pub struct QueryLimits {
    /// Default number of sources when the caller omits max_results
    pub default_max_results: usize,

    /// Hard cap on caller-supplied max_results
    pub max_results_cap: usize,

    /// Default similarity threshold
    pub default_threshold: f32,
}

/// An incoming question with optional retrieval overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question text (required, non-empty)
    pub query: String,

    /// Maximum number of cited sources (1..=cap)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,

    /// Minimum similarity score for a passage to qualify (0..=1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
}

impl QueryRequest {
    /// Create a request with defaults for the optional fields.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: None,
            similarity_threshold: None,
        }
    }

    /// Validate the request against the deployment limits.
    ///
    /// Rejections here happen before any embedding or store call.
    pub fn validate(&self, limits: &QueryLimits) -> QaResult<()> {
        if self.query.trim().is_empty() {
            return Err(QaError::InvalidInput("Query cannot be empty".to_string()));
        }

        if self.query.len() > MAX_QUERY_LEN {
            return Err(QaError::InvalidInput(format!(
                "Query is too long (maximum {} characters)",
                MAX_QUERY_LEN
            )));
        }

        if let Some(max_results) = self.max_results {
            if max_results == 0 || max_results > limits.max_results_cap {
                return Err(QaError::InvalidInput(format!(
                    "max_results must be in 1..={}, got {}",
                    limits.max_results_cap, max_results
                )));
            }
        }

        if let Some(threshold) = self.similarity_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(QaError::InvalidInput(format!(
                    "similarity_threshold must be in [0, 1], got {}",
                    threshold
                )));
            }
        }

        Ok(())
    }

    /// Effective max_results after applying defaults and the cap.
    pub fn effective_max_results(&self, limits: &QueryLimits) -> usize {
        self.max_results
            .unwrap_or(limits.default_max_results)
            .min(limits.max_results_cap)
    }

    /// Effective similarity threshold after applying the default.
    pub fn effective_threshold(&self, limits: &QueryLimits) -> f32 {
        self.similarity_threshold.unwrap_or(limits.default_threshold)
    }
}

/// Metadata attached to a retrieved passage.
///
/// Known keys are typed; everything else the store carries is preserved
/// in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Page number within the source document, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Source file or document name, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Any further metadata keys, passed through as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A candidate passage produced by the retriever for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Passage text
    pub content: String,

    /// Passage metadata
    pub metadata: ChunkMetadata,

    /// Similarity to the query in [0, 1]; higher is more similar
    pub similarity_score: f32,
}

/// A response-facing projection of a retrieved passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCitation {
    /// Content excerpt (truncated if long)
    pub content: String,

    /// Full passage metadata
    pub metadata: ChunkMetadata,

    /// Similarity score of the underlying passage
    pub similarity_score: f32,

    /// Page number extracted from metadata, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,

    /// Source file extracted from metadata, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl SourceCitation {
    /// Project a retrieved chunk into its citation form.
    ///
    /// The convenience fields come straight from metadata and are never
    /// fabricated when the keys are absent.
    pub fn from_chunk(chunk: &RetrievedChunk) -> Self {
        Self {
            content: excerpt(&chunk.content, MAX_EXCERPT_LEN),
            metadata: chunk.metadata.clone(),
            similarity_score: chunk.similarity_score,
            page_number: chunk.metadata.page,
            source_file: chunk.metadata.source.clone(),
        }
    }
}

/// Truncate text to a display excerpt at a character boundary.
fn excerpt(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_len).collect();
    format!("{}...", truncated)
}

/// The externally visible query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Synthesized answer text
    pub answer: String,

    /// Citations ordered by descending similarity score
    pub sources: Vec<SourceCitation>,

    /// Confidence in [0, 1] that the answer is grounded in the sources
    pub confidence: f32,

    /// The original question, echoed back
    pub query: String,

    /// Candidates at or above the threshold before truncation
    pub total_sources_found: usize,

    /// Wall-clock pipeline duration in milliseconds
    pub processing_time_ms: u64,

    /// When the response was produced
    pub timestamp: DateTime<Utc>,
}

/// Canonical answer when nothing qualifying is retrieved.
pub const NO_INFORMATION_ANSWER: &str =
    "No relevant information found in the knowledge base that meets the similarity threshold.";

impl QueryResponse {
    /// Well-formed response for a query with zero qualifying passages.
    pub fn no_information(query: &str, processing_time_ms: u64) -> Self {
        Self {
            answer: NO_INFORMATION_ANSWER.to_string(),
            sources: Vec::new(),
            confidence: 0.0,
            query: query.to_string(),
            total_sources_found: 0,
            processing_time_ms,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> QueryLimits {
        QueryLimits {
            default_max_results: 5,
            max_results_cap: 20,
            default_threshold: 0.7,
        }
    }

    #[test]
    fn test_validate_empty_query() {
        let request = QueryRequest::new("   ");
        let err = request.validate(&limits()).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[test]
    fn test_validate_overlong_query() {
        let request = QueryRequest::new("q".repeat(MAX_QUERY_LEN + 1));
        assert!(request.validate(&limits()).is_err());
    }

    #[test]
    fn test_validate_zero_max_results() {
        let mut request = QueryRequest::new("what are the rules?");
        request.max_results = Some(0);
        let err = request.validate(&limits()).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[test]
    fn test_validate_max_results_above_cap() {
        let mut request = QueryRequest::new("what are the rules?");
        request.max_results = Some(21);
        assert!(request.validate(&limits()).is_err());
    }

    #[test]
    fn test_validate_threshold_range() {
        let mut request = QueryRequest::new("what are the rules?");
        request.similarity_threshold = Some(1.2);
        assert!(request.validate(&limits()).is_err());
    }

    #[test]
    fn test_effective_defaults() {
        let request = QueryRequest::new("q");
        assert_eq!(request.effective_max_results(&limits()), 5);
        assert!((request.effective_threshold(&limits()) - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_metadata_tolerates_unknown_keys() {
        let value = serde_json::json!({
            "page": 12,
            "source": "far_part121.pdf",
            "section": "121.309",
        });

        let metadata: ChunkMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(metadata.page, Some(12));
        assert_eq!(metadata.source.as_deref(), Some("far_part121.pdf"));
        assert_eq!(metadata.extra.get("section").unwrap(), "121.309");
    }

    #[test]
    fn test_citation_extracts_convenience_fields() {
        let chunk = RetrievedChunk {
            content: "Operators must maintain emergency equipment.".to_string(),
            metadata: ChunkMetadata {
                page: Some(3),
                source: Some("safety.pdf".to_string()),
                extra: Default::default(),
            },
            similarity_score: 0.88,
        };

        let citation = SourceCitation::from_chunk(&chunk);
        assert_eq!(citation.page_number, Some(3));
        assert_eq!(citation.source_file.as_deref(), Some("safety.pdf"));
        assert_eq!(citation.content, chunk.content);
    }

    #[test]
    fn test_citation_never_fabricates_fields() {
        let chunk = RetrievedChunk {
            content: "text".to_string(),
            metadata: ChunkMetadata::default(),
            similarity_score: 0.8,
        };

        let citation = SourceCitation::from_chunk(&chunk);
        assert!(citation.page_number.is_none());
        assert!(citation.source_file.is_none());
    }

    #[test]
    fn test_excerpt_truncation() {
        let long = "x".repeat(500);
        let citation = SourceCitation::from_chunk(&RetrievedChunk {
            content: long,
            metadata: ChunkMetadata::default(),
            similarity_score: 0.9,
        });
        assert_eq!(citation.content.chars().count(), 203);
        assert!(citation.content.ends_with("..."));
    }

    #[test]
    fn test_no_information_response_is_well_formed() {
        let response = QueryResponse::no_information("anything about drones?", 12);
        assert_eq!(response.answer, NO_INFORMATION_ANSWER);
        assert!(response.sources.is_empty());
        assert_eq!(response.confidence, 0.0);
        assert_eq!(response.total_sources_found, 0);
        assert_eq!(response.query, "anything about drones?");
    }
}
