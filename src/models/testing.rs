//! Deterministic stand-in model for tests

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::models::config::{ModelConfig, PoolingMode};
use crate::models::model::{apply_prompt, EmbeddingModel, ModelInfo};
use crate::models::{Embedding, EmbeddingError, EmbeddingResult};

/// One recorded `encode` call
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeCall {
    pub texts: Vec<String>,
    pub prompt: Option<String>,
}

/// Encodes text as a letter histogram (26 ASCII letters plus one bucket for
/// everything else). Scores with the trait's default cosine similarity.
pub struct HistogramModel {
    info: ModelInfo,
    ready: bool,
    fail_with: Option<String>,
    calls: Arc<Mutex<Vec<EncodeCall>>>,
}

impl HistogramModel {
    pub fn new(name: &str) -> Self {
        let config = ModelConfig {
            name: name.to_string(),
            pooling_mode: PoolingMode::Mean,
            ..ModelConfig::default()
        };
        Self {
            info: ModelInfo::from(&config),
            ready: true,
            fail_with: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Model that reports not ready
    pub fn unready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Model whose every `encode` fails with `error`
    pub fn failing(mut self, error: &str) -> Self {
        self.fail_with = Some(error.to_string());
        self
    }

    /// Shared log of every `encode` call, survives boxing the model
    pub fn calls(&self) -> Arc<Mutex<Vec<EncodeCall>>> {
        Arc::clone(&self.calls)
    }

    pub fn histogram(text: &str) -> Embedding {
        let mut counts = vec![0.0f32; 27];
        for c in text.chars() {
            let lower = c.to_ascii_lowercase();
            if lower.is_ascii_lowercase() {
                counts[(lower as u8 - b'a') as usize] += 1.0;
            } else if !c.is_whitespace() {
                counts[26] += 1.0;
            }
        }
        counts
    }
}

#[async_trait]
impl EmbeddingModel for HistogramModel {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    async fn initialize(&mut self) -> EmbeddingResult<()> {
        self.ready = true;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn encode(&mut self, texts: &[String], prompt: Option<&str>) -> EmbeddingResult<Vec<Embedding>> {
        self.calls.lock().unwrap().push(EncodeCall {
            texts: texts.to_vec(),
            prompt: prompt.map(str::to_string),
        });

        if let Some(error) = &self.fail_with {
            return Err(EmbeddingError::InferenceError {
                model_name: self.info.name.clone(),
                error: error.clone(),
            });
        }

        Ok(apply_prompt(texts, prompt)
            .iter()
            .map(|text| Self::histogram(text))
            .collect())
    }
}
