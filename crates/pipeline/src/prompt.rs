//! Grounded prompt composition.
//!
//! Builds the instruction + context + question text for the generation
//! model. Pure and deterministic: the same query and chunks always yield
//! the same prompt.

use serde::{Deserialize, Serialize};

use crate::types::{RetrievedChunk, NO_INFORMATION_ANSWER};

/// The composed prompt for one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundedPrompt {
    /// System instructions
    pub system: String,

    /// Context block plus the user's question
    pub user: String,
}

/// Compose the grounded prompt for a query and its retrieved context.
///
/// Chunks must already be in similarity-descending order; they are tagged
/// `[Source N]` so answers can be mapped back to citations. With no
/// qualifying chunks the model is explicitly told to state that nothing
/// relevant was found instead of being left to improvise.
pub fn compose(query_text: &str, chunks: &[RetrievedChunk]) -> GroundedPrompt {
    if chunks.is_empty() {
        return GroundedPrompt {
            system: no_context_system_prompt(),
            user: format!("Question: {}", query_text),
        };
    }

    GroundedPrompt {
        system: grounded_system_prompt(),
        user: format!(
            "Context:\n{}\n\nQuestion: {}",
            build_context(chunks),
            query_text
        ),
    }
}

/// Concatenate chunks into the tagged context block.
fn build_context(chunks: &[RetrievedChunk]) -> String {
    let parts: Vec<String> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Source {}]\n{}", i + 1, chunk.content))
        .collect();

    parts.join("\n\n")
}

/// System instructions when grounded context is available.
fn grounded_system_prompt() -> String {
    String::from(
        "You are an assistant answering questions about airline regulatory documents.\n\
         \n\
         Instructions:\n\
         - Answer the question based only on the context provided above\n\
         - Be concise and factual\n\
         - Cite the sources you used by their [Source N] tags\n\
         - If the context does not contain the answer, state that no relevant \
         information was found in the provided documents\n",
    )
}

/// System instructions when retrieval produced nothing usable.
fn no_context_system_prompt() -> String {
    format!(
        "You are an assistant answering questions about airline regulatory documents.\n\
         \n\
         No relevant context was retrieved for this question. Respond exactly with: \
         \"{}\" Do not answer from general knowledge.\n",
        NO_INFORMATION_ANSWER
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkMetadata;

    fn chunk(content: &str, score: f32) -> RetrievedChunk {
        RetrievedChunk {
            content: content.to_string(),
            metadata: ChunkMetadata::default(),
            similarity_score: score,
        }
    }

    #[test]
    fn test_compose_tags_chunks_in_order() {
        let chunks = vec![chunk("first passage", 0.9), chunk("second passage", 0.8)];
        let prompt = compose("What are the rules?", &chunks);

        assert!(prompt.user.contains("[Source 1]\nfirst passage"));
        assert!(prompt.user.contains("[Source 2]\nsecond passage"));
        let first = prompt.user.find("[Source 1]").unwrap();
        let second = prompt.user.find("[Source 2]").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_compose_includes_query_verbatim() {
        let prompt = compose("What are the exact CREW rest rules?", &[chunk("text", 0.9)]);
        assert!(prompt.user.contains("Question: What are the exact CREW rest rules?"));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let chunks = vec![chunk("a", 0.9), chunk("b", 0.8)];
        let p1 = compose("query", &chunks);
        let p2 = compose("query", &chunks);
        assert_eq!(p1, p2);
    }

    #[test]
    fn test_compose_empty_chunks_instructs_no_information() {
        let prompt = compose("Anything about drones?", &[]);
        assert!(prompt.system.contains(NO_INFORMATION_ANSWER));
        assert!(prompt.system.contains("Do not answer from general knowledge"));
        assert!(!prompt.user.contains("Context:"));
    }

    #[test]
    fn test_grounded_system_restricts_to_context() {
        let prompt = compose("q", &[chunk("text", 0.9)]);
        assert!(prompt.system.contains("based only on the context"));
    }
}
