//! Similarity Endpoint Library
//!
//! Local HTTP endpoint scoring a set of queries against a set of documents
//! with an embedding model.

pub mod models;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod protocol;
pub mod server;
pub mod similarity;

// Re-exports
pub use models::{EmbeddingError, EmbeddingModel, ModelFactory, SharedModel};
pub use protocol::DecodeError;
pub use server::{ServerConfig, SimilarityServer};
pub use similarity::{ComputationError, SimilarityMatrix, SimilarityOrchestrator, SimilarityRequest, TruncationLimits};
