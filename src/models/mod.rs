//! Embedding model capability
//!
//! The server only ever talks to a model through the [`EmbeddingModel`] trait:
//! encode a batch of texts (optionally under a prompt) and score two encoded
//! batches against each other.

pub mod config;
pub mod cosine;
pub mod model;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use config::{ModelConfig, PoolingMode};
pub use model::{EmbeddingModel, ModelFactory, ModelInfo, SharedModel};

/// Embedding vector type
pub type Embedding = Vec<f32>;

/// Result type for embedding models operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Errors that can occur in embedding models operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Model not ready: {model_name}")]
    ModelNotReady { model_name: String },

    #[error("Model load failed: {error}")]
    ModelLoadFailed { error: String },

    #[error("Inference failed: {model_name} - {error}")]
    InferenceError { model_name: String, error: String },

    #[error("Embedding failed: {error}")]
    EmbeddingFailed { error: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

#[cfg(feature = "onnx")]
impl From<ort::Error> for EmbeddingError {
    fn from(error: ort::Error) -> Self {
        EmbeddingError::ModelLoadFailed { error: error.to_string() }
    }
}
