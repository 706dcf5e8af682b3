//! Configuration for the embedding model
//!
//! Lives in the `[model]` table of the server's TOML file. The model's `name`
//! doubles as the identity served on `GET /embedding-model`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::EmbeddingError;

/// How token states are reduced to one sentence vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolingMode {
    /// Average of every attended token
    Mean,
    /// State of the last attended token (decoder-style embedders)
    LastToken,
}

impl fmt::Display for PoolingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolingMode::Mean => f.write_str("mean"),
            PoolingMode::LastToken => f.write_str("last_token"),
        }
    }
}

/// Configuration for the loaded model
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Stable model name, exposed read-only to callers
    pub name: String,

    /// File paths
    pub model_path: String,
    pub tokenizer_path: String,

    /// Model parameters
    pub max_sequence_length: usize,
    pub pooling_mode: PoolingMode,

    /// Performance settings
    pub num_threads: usize,

    /// Optional ONNX Runtime dylib, empty means let `ort` find it
    pub onnx_runtime_path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "Qwen/Qwen3-Embedding-0.6B".to_string(),
            model_path: "embedding-models/Qwen/Qwen3-Embedding-0.6B/model.onnx".to_string(),
            tokenizer_path: "embedding-models/Qwen/Qwen3-Embedding-0.6B/tokenizer.json".to_string(),
            max_sequence_length: 8192,
            pooling_mode: PoolingMode::LastToken,
            num_threads: 4,
            onnx_runtime_path: String::new(),
        }
    }
}

impl ModelConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.name.trim().is_empty() {
            return Err(EmbeddingError::ConfigError {
                message: "model.name must not be empty".to_string(),
            });
        }

        if self.max_sequence_length == 0 {
            return Err(EmbeddingError::ConfigError {
                message: format!("model.max_sequence_length must be positive for '{}'", self.name),
            });
        }

        if self.num_threads == 0 {
            return Err(EmbeddingError::ConfigError {
                message: format!("model.num_threads must be positive for '{}'", self.name),
            });
        }

        Ok(())
    }
}
