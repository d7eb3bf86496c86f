//! Confidence scoring policy.
//!
//! How well-supported is the generated answer by the retrieved evidence?
//! The blend of maximum and mean similarity is a tunable policy decision
//! kept behind this struct rather than inlined at call sites; the chosen
//! default weights are 0.7 (max) and 0.3 (mean).

use crate::types::NO_INFORMATION_ANSWER;

/// Phrases that mark an answer as "nothing found", checked
/// case-insensitively.
const NO_INFORMATION_MARKERS: &[&str] = &[
    "no relevant information found",
    "no information found",
    "could not find",
    "does not contain the answer",
];

/// Deterministic confidence scoring over retrieval similarities and the
/// answer's no-information signal.
///
/// Monotonic: raising any similarity score never lowers the result,
/// holding the no-information signal constant.
#[derive(Debug, Clone)]
pub struct ConfidencePolicy {
    /// Weight of the maximum chunk similarity
    pub max_weight: f32,

    /// Weight of the mean chunk similarity
    pub mean_weight: f32,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            max_weight: 0.7,
            mean_weight: 0.3,
        }
    }
}

impl ConfidencePolicy {
    /// Score the answer's confidence in [0, 1].
    ///
    /// An answer carrying the no-information signal scores 0.0 no matter
    /// how strong retrieval looked; an empty score list likewise.
    pub fn score(&self, similarity_scores: &[f32], no_information: bool) -> f32 {
        if no_information || similarity_scores.is_empty() {
            return 0.0;
        }

        let max = similarity_scores.iter().copied().fold(0.0f32, f32::max);
        let mean = similarity_scores.iter().sum::<f32>() / similarity_scores.len() as f32;

        (self.max_weight * max + self.mean_weight * mean).clamp(0.0, 1.0)
    }
}

/// Detect whether generated text is an explicit "nothing found" answer.
pub fn detects_no_information(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    // The canonical refusal answer itself always matches
    if lower.contains(&NO_INFORMATION_ANSWER.to_lowercase()) {
        return true;
    }
    NO_INFORMATION_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}
