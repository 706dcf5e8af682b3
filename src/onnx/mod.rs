//! ONNX Runtime backend for the embedding model capability

pub mod onnx_engine;
pub use onnx_engine::OnnxEmbeddingEngine;
