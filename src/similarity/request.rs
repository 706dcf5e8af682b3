//! Similarity request payload

use serde::{Deserialize, Serialize};

use crate::similarity::truncate::{truncate_all, truncate_string, TruncationLimits};

/// One similarity call: every query scored against every document.
///
/// All three fields are required; order and duplicates are significant.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimilarityRequest {
    pub queries: Vec<String>,
    pub documents: Vec<String>,
    /// Encoding context for the queries only
    pub prompt: String,
}

impl SimilarityRequest {
    pub fn new(
        queries: impl IntoIterator<Item = impl Into<String>>,
        documents: impl IntoIterator<Item = impl Into<String>>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            queries: queries.into_iter().map(Into::into).collect(),
            documents: documents.into_iter().map(Into::into).collect(),
            prompt: prompt.into(),
        }
    }

    /// Apply the per-field character bounds
    pub fn truncated(mut self, limits: &TruncationLimits) -> Self {
        truncate_all(&mut self.queries, limits.query_max_chars);
        truncate_all(&mut self.documents, limits.document_max_chars);
        truncate_string(&mut self.prompt, limits.prompt_max_chars);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_applies_each_bound() {
        let limits = TruncationLimits {
            query_max_chars: 2,
            document_max_chars: 3,
            prompt_max_chars: 4,
        };
        let request = SimilarityRequest::new(["abcdef", "q"], ["uvwxyz"], "Instruct: x").truncated(&limits);

        assert_eq!(request.queries, vec!["ab", "q"]);
        assert_eq!(request.documents, vec!["uvw"]);
        assert_eq!(request.prompt, "Inst");
    }

    #[test]
    fn test_truncated_is_idempotent() {
        let limits = TruncationLimits::default();
        let request = SimilarityRequest::new(["q".repeat(9000)], ["d".repeat(20_000)], "p".repeat(300));

        let once = request.truncated(&limits);
        assert_eq!(once.queries[0].len(), 7936);
        assert_eq!(once.documents[0].len(), 15872);
        assert_eq!(once.prompt.len(), 150);
        assert_eq!(once.clone().truncated(&limits), once);
    }
}
