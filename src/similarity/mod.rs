//! Similarity orchestration: truncation policy, model calls, result shaping

pub mod matrix;
pub mod orchestrator;
pub mod request;
pub mod truncate;

pub use matrix::SimilarityMatrix;
pub use orchestrator::SimilarityOrchestrator;
pub use request::SimilarityRequest;
pub use truncate::TruncationLimits;

use crate::models::EmbeddingError;

/// The model could not produce a usable matrix for a request
#[derive(Debug, thiserror::Error)]
pub enum ComputationError {
    #[error("Encoding {stage} failed: {source}")]
    Encode {
        stage: &'static str,
        source: EmbeddingError,
    },

    #[error("Similarity scoring failed: {0}")]
    Similarity(#[source] EmbeddingError),

    #[error("Model returned {got} vectors for {expected} {stage}")]
    VectorCount {
        stage: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Model returned a {rows}x{cols} matrix, expected {expected_rows}x{expected_cols}")]
    ShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
}
