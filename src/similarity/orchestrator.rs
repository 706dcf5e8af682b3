//! Similarity orchestration
//!
//! Truncates the request, encodes queries (under the prompt) and documents
//! (without it) and asks the model to score the two sets. No I/O and no
//! retries; any model failure becomes a [`ComputationError`].

use std::time::Instant;
use tracing::debug;

use crate::models::EmbeddingModel;
use crate::similarity::{ComputationError, SimilarityMatrix, SimilarityRequest, TruncationLimits};

/// Turns requests into similarity matrices using the model capability
#[derive(Debug, Clone, Default)]
pub struct SimilarityOrchestrator {
    limits: TruncationLimits,
}

impl SimilarityOrchestrator {
    pub fn new(limits: TruncationLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &TruncationLimits {
        &self.limits
    }

    /// Score every query against every document.
    ///
    /// An empty query or document list yields a matrix with that dimension at
    /// zero without calling the model.
    pub async fn compute_similarity(
        &self,
        request: SimilarityRequest,
        model: &mut dyn EmbeddingModel,
    ) -> Result<SimilarityMatrix, ComputationError> {
        let request = request.truncated(&self.limits);
        let rows = request.queries.len();
        let cols = request.documents.len();

        if rows == 0 || cols == 0 {
            debug!("Empty side ({}x{}), skipping model", rows, cols);
            return Ok(SimilarityMatrix::empty(rows, cols));
        }

        let prompt = Some(request.prompt.as_str()).filter(|p| !p.is_empty());

        let encode_start = Instant::now();
        let query_embeddings = model
            .encode(&request.queries, prompt)
            .await
            .map_err(|source| ComputationError::Encode { stage: "queries", source })?;
        let document_embeddings = model
            .encode(&request.documents, None)
            .await
            .map_err(|source| ComputationError::Encode { stage: "documents", source })?;
        debug!("Encoding {} queries and {} documents took {:?}", rows, cols, encode_start.elapsed());

        for (stage, expected, got) in [
            ("queries", rows, query_embeddings.len()),
            ("documents", cols, document_embeddings.len()),
        ] {
            if expected != got {
                return Err(ComputationError::VectorCount { stage, expected, got });
            }
        }

        let scores = model
            .similarity(&query_embeddings, &document_embeddings)
            .map_err(ComputationError::Similarity)?;

        SimilarityMatrix::from_model_scores(scores, rows, cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::{EncodeCall, HistogramModel};
    use crate::models::{Embedding, EmbeddingResult, ModelInfo};
    use async_trait::async_trait;

    fn orchestrator() -> SimilarityOrchestrator {
        SimilarityOrchestrator::default()
    }

    #[tokio::test]
    async fn test_shape_follows_input_order() {
        let mut model = HistogramModel::new("histogram");
        let request = SimilarityRequest::new(
            ["aaaa", "bbbb"],
            ["bbbb", "zzzz", "aaaa"],
            "",
        );

        let matrix = orchestrator().compute_similarity(request, &mut model).await.unwrap();

        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.cols(), 3);
        assert!((matrix.get(0, 2).unwrap() - 1.0).abs() < 1e-6);
        assert!(matrix.get(0, 0).unwrap().abs() < 1e-6);
        assert!((matrix.get(1, 0).unwrap() - 1.0).abs() < 1e-6);
        assert!(matrix.get(1, 1).unwrap().abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_prompt_applies_to_queries_only() {
        let mut model = HistogramModel::new("histogram");
        let calls = model.calls();
        let request = SimilarityRequest::new(["query"], ["document"], "Instruct: find");

        orchestrator().compute_similarity(request, &mut model).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                EncodeCall {
                    texts: vec!["query".to_string()],
                    prompt: Some("Instruct: find".to_string()),
                },
                EncodeCall {
                    texts: vec!["document".to_string()],
                    prompt: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_inputs_truncated_before_encoding() {
        let mut model = HistogramModel::new("histogram");
        let calls = model.calls();
        let request = SimilarityRequest::new(["q".repeat(8000)], ["d".repeat(16_000)], "p".repeat(151));

        orchestrator().compute_similarity(request, &mut model).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].texts[0].len(), 7936);
        assert_eq!(calls[0].prompt.as_deref(), Some("p".repeat(150).as_str()));
        assert_eq!(calls[1].texts[0].len(), 15872);
    }

    #[tokio::test]
    async fn test_empty_prompt_is_no_prompt() {
        let mut model = HistogramModel::new("histogram");
        let calls = model.calls();

        orchestrator()
            .compute_similarity(SimilarityRequest::new(["q"], ["d"], ""), &mut model)
            .await
            .unwrap();

        assert_eq!(calls.lock().unwrap()[0].prompt, None);
    }

    #[tokio::test]
    async fn test_empty_sides_skip_model() {
        let mut model = HistogramModel::new("histogram");
        let calls = model.calls();
        let no_strings: [&str; 0] = [];

        let matrix = orchestrator()
            .compute_similarity(SimilarityRequest::new(no_strings, ["d"], "p"), &mut model)
            .await
            .unwrap();
        assert_eq!((matrix.rows(), matrix.cols()), (0, 1));

        let matrix = orchestrator()
            .compute_similarity(SimilarityRequest::new(["q", "r"], no_strings, "p"), &mut model)
            .await
            .unwrap();
        assert_eq!((matrix.rows(), matrix.cols()), (2, 0));
        assert_eq!(matrix.to_rows(), vec![Vec::<f64>::new(), Vec::new()]);

        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_is_computation_error() {
        let mut model = HistogramModel::new("histogram").failing("out of memory");

        let result = orchestrator()
            .compute_similarity(SimilarityRequest::new(["q"], ["d"], ""), &mut model)
            .await;

        assert!(matches!(result, Err(ComputationError::Encode { stage: "queries", .. })));
    }

    #[tokio::test]
    async fn test_deterministic() {
        let mut model = HistogramModel::new("histogram");
        let request = SimilarityRequest::new(["hello world", "rust"], ["world", "trust me"], "Q: ");

        let first = orchestrator().compute_similarity(request.clone(), &mut model).await.unwrap();
        let second = orchestrator().compute_similarity(request, &mut model).await.unwrap();
        assert_eq!(first, second);
    }

    /// Returns one vector too few for every batch
    struct ShortModel(ModelInfo);

    #[async_trait]
    impl EmbeddingModel for ShortModel {
        fn info(&self) -> &ModelInfo {
            &self.0
        }

        async fn initialize(&mut self) -> EmbeddingResult<()> {
            Ok(())
        }

        fn is_ready(&self) -> bool {
            true
        }

        async fn encode(&mut self, texts: &[String], _prompt: Option<&str>) -> EmbeddingResult<Vec<Embedding>> {
            Ok(vec![vec![1.0]; texts.len() - 1])
        }
    }

    #[tokio::test]
    async fn test_wrong_vector_count() {
        let mut model = ShortModel(ModelInfo::from(&crate::models::ModelConfig::default()));

        let result = orchestrator()
            .compute_similarity(SimilarityRequest::new(["a", "b"], ["c", "d"], ""), &mut model)
            .await;

        assert!(matches!(
            result,
            Err(ComputationError::VectorCount { stage: "queries", expected: 2, got: 1 })
        ));
    }
}
