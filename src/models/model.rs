//! Model definitions and traits
//!
//! This module defines the capability the similarity orchestrator depends on,
//! plus the ONNX-backed implementation and the factory that builds it at
//! startup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::config::{ModelConfig, PoolingMode};
use crate::models::{Embedding, EmbeddingError, EmbeddingResult};

/// The process-wide model handle.
///
/// Inference state is not assumed to be safe for concurrent use, so every
/// caller goes through the mutex.
pub type SharedModel = Arc<Mutex<Box<dyn EmbeddingModel>>>;

/// Information about a model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name, also its public identity
    pub name: String,
    /// Maximum sequence length in tokens
    pub max_sequence_length: usize,
    /// Pooling mode
    pub pooling_mode: PoolingMode,
    /// Model file path
    pub model_path: String,
    /// Tokenizer path
    pub tokenizer_path: String,
}

impl From<&ModelConfig> for ModelInfo {
    fn from(config: &ModelConfig) -> Self {
        Self {
            name: config.name.clone(),
            max_sequence_length: config.max_sequence_length,
            pooling_mode: config.pooling_mode,
            model_path: config.model_path.clone(),
            tokenizer_path: config.tokenizer_path.clone(),
        }
    }
}

/// Core embedding model trait
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Initialize the model
    async fn initialize(&mut self) -> EmbeddingResult<()>;

    /// Check if the model is ready for inference
    fn is_ready(&self) -> bool;

    /// Encode a batch of texts, one vector per text, in input order.
    ///
    /// `prompt` is auxiliary context applied to every text of this batch.
    async fn encode(&mut self, texts: &[String], prompt: Option<&str>) -> EmbeddingResult<Vec<Embedding>>;

    /// Pairwise scores between two encoded batches, higher means more similar
    fn similarity(&self, a: &[Embedding], b: &[Embedding]) -> EmbeddingResult<Vec<Vec<f32>>> {
        crate::models::cosine::cosine_similarity_matrix(a, b)
    }

    /// Stable model name
    fn identity(&self) -> &str {
        &self.info().name
    }
}

/// Prepend `prompt` to every text, the way instruction-tuned embedders expect it
pub(crate) fn apply_prompt(texts: &[String], prompt: Option<&str>) -> Vec<String> {
    match prompt {
        Some(prompt) => texts.iter().map(|text| format!("{}{}", prompt, text)).collect(),
        None => texts.to_vec(),
    }
}

/// ONNX-based embedding model implementation
#[cfg(feature = "onnx")]
pub mod onnx {
    use super::*;
    use crate::onnx::OnnxEmbeddingEngine;

    /// ONNX embedding model
    pub struct OnnxEmbeddingModel {
        info: ModelInfo,
        engine: Option<OnnxEmbeddingEngine>,
        config: ModelConfig,
    }

    impl OnnxEmbeddingModel {
        /// Create a new ONNX embedding model
        pub fn new(config: ModelConfig) -> Self {
            Self {
                info: ModelInfo::from(&config),
                engine: None,
                config,
            }
        }
    }

    #[async_trait]
    impl EmbeddingModel for OnnxEmbeddingModel {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        async fn initialize(&mut self) -> EmbeddingResult<()> {
            let engine = OnnxEmbeddingEngine::new(&self.config)?;
            self.engine = Some(engine);
            Ok(())
        }

        fn is_ready(&self) -> bool {
            self.engine.is_some()
        }

        async fn encode(&mut self, texts: &[String], prompt: Option<&str>) -> EmbeddingResult<Vec<Embedding>> {
            let engine = self.engine.as_mut().ok_or_else(|| EmbeddingError::ModelNotReady {
                model_name: self.info.name.clone(),
            })?;

            engine
                .embed_texts(apply_prompt(texts, prompt))
                .await
                .map_err(|e| EmbeddingError::InferenceError {
                    model_name: self.info.name.clone(),
                    error: e.to_string(),
                })
        }
    }
}

/// Factory for creating embedding models
pub struct ModelFactory;

impl ModelFactory {
    /// Create an uninitialized model from configuration
    pub fn create_model(config: &ModelConfig) -> EmbeddingResult<Box<dyn EmbeddingModel>> {
        #[cfg(feature = "onnx")]
        {
            Ok(Box::new(onnx::OnnxEmbeddingModel::new(config.clone())))
        }

        #[cfg(not(feature = "onnx"))]
        {
            Err(EmbeddingError::ConfigError {
                message: format!(
                    "Cannot load '{}': built without the `onnx` feature",
                    config.name
                ),
            })
        }
    }

    /// Create, initialize and wrap the model for sharing across connections
    pub async fn load(config: &ModelConfig) -> EmbeddingResult<SharedModel> {
        config.validate()?;

        let mut model = Self::create_model(config)?;
        model.initialize().await?;
        Self::into_shared(model)
    }

    /// Wrap an initialized model, refusing one that cannot serve requests
    pub fn into_shared(model: Box<dyn EmbeddingModel>) -> EmbeddingResult<SharedModel> {
        if !model.is_ready() {
            return Err(EmbeddingError::ModelNotReady {
                model_name: model.identity().to_string(),
            });
        }
        Ok(Arc::new(Mutex::new(model)))
    }
}
