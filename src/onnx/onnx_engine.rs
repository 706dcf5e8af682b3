//! # ONNX Embedding Engine
//!
//! Embedding generation on ONNX Runtime with a HuggingFace tokenizer.
//!
//! Each text is tokenized (truncated to the model's maximum sequence length),
//! run through the session on its own, pooled over the attention mask and
//! L2-normalized. Pooling is either the mean of attended tokens (BERT-style
//! sentence transformers) or the last attended token (decoder embedders such
//! as Qwen3-Embedding).

use crate::models::{EmbeddingError, ModelConfig, PoolingMode};
use ndarray::ArrayViewD;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, instrument};

/// ONNX-based embedding engine for generating text embeddings
#[derive(Debug)]
pub struct OnnxEmbeddingEngine {
    /// ONNX Runtime session for model inference
    session: Session,
    /// HuggingFace tokenizer for text preprocessing
    tokenizer: Tokenizer,
    /// How token states become one vector
    pooling_mode: PoolingMode,
    /// Whether the graph declares a `token_type_ids` input
    wants_token_type_ids: bool,
}

impl OnnxEmbeddingEngine {
    /// Create a new ONNX embedding engine from the `[model]` configuration
    pub fn new(config: &ModelConfig) -> Result<Self, EmbeddingError> {
        info!("Initializing ONNX embedding engine with model: {}", config.model_path);

        if !config.onnx_runtime_path.is_empty() {
            unsafe {
                std::env::set_var("ORT_DYLIB_PATH", &config.onnx_runtime_path);
            }
            debug!("Set ORT_DYLIB_PATH to: {}", config.onnx_runtime_path);
        }

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.num_threads)?
            .commit_from_file(&config.model_path)
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                error: format!("Failed to load ONNX model: {}", e),
            })?;

        let mut tokenizer = Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                error: format!("Failed to load tokenizer: {}", e),
            })?;

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                error: format!("Failed to configure tokenizer truncation: {}", e),
            })?;

        let wants_token_type_ids = session.inputs.iter().any(|input| input.name == "token_type_ids");

        info!(
            "ONNX embedding engine ready ({} threads, {} pooling)",
            config.num_threads, config.pooling_mode
        );
        Ok(Self {
            session,
            tokenizer,
            pooling_mode: config.pooling_mode,
            wants_token_type_ids,
        })
    }

    /// Generate one normalized embedding per text, in input order
    #[instrument(skip(self, texts), fields(text_count = texts.len()))]
    pub async fn embed_texts(&mut self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Err(EmbeddingError::InvalidInput {
                message: "Cannot embed empty text list".to_string(),
            });
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut embeddings = Vec::with_capacity(texts.len());
        for text in &texts {
            embeddings.push(self.embed_one(text)?);
        }

        debug!("Successfully generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }

    fn embed_one(&mut self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding = self.tokenizer.encode(text, true)
            .map_err(|e| EmbeddingError::EmbeddingFailed {
                error: format!("Tokenization failed: {}", e),
            })?;

        let attention_mask = encoding.get_attention_mask();
        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
        let mask: Vec<i64> = attention_mask.iter().map(|&x| x as i64).collect();
        let seq_len = input_ids.len() as i64;

        let mut inputs = vec![
            ("input_ids", tensor([1, seq_len], input_ids)?),
            ("attention_mask", tensor([1, seq_len], mask)?),
        ];
        if self.wants_token_type_ids {
            inputs.push(("token_type_ids", tensor([1, seq_len], vec![0i64; seq_len as usize])?));
        }

        let outputs = self.session.run(inputs)
            .map_err(|e| EmbeddingError::EmbeddingFailed {
                error: format!("ONNX inference failed: {}", e),
            })?;

        // First output is the token-level hidden state: [batch, seq_len, hidden]
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbeddingError::EmbeddingFailed {
                error: format!("Failed to extract output tensor: {}", e),
            })?;

        let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();
        let hidden = ndarray::ArrayView::from_shape(dims.as_slice(), data)
            .map_err(|e| EmbeddingError::EmbeddingFailed {
                error: format!("Failed to create output array view: {:?}", e),
            })?;

        let pooled = match self.pooling_mode {
            PoolingMode::Mean => mean_pooling(&hidden, attention_mask)?,
            PoolingMode::LastToken => last_token_pooling(&hidden, attention_mask)?,
        };

        normalize_embedding(&pooled)
    }
}

fn tensor(shape: [i64; 2], values: Vec<i64>) -> Result<Tensor<i64>, EmbeddingError> {
    Tensor::from_array((shape, values))
        .map_err(|e| EmbeddingError::EmbeddingFailed {
            error: format!("Failed to create input tensor: {}", e),
        })
}

fn check_hidden_shape(hidden: &ArrayViewD<f32>, attention_mask: &[u32]) -> Result<(usize, usize), EmbeddingError> {
    let shape = hidden.shape();
    if shape.len() != 3 {
        return Err(EmbeddingError::EmbeddingFailed {
            error: format!("Expected 3D output tensor, got {}D", shape.len()),
        });
    }

    let (seq_len, hidden_size) = (shape[1], shape[2]);
    if attention_mask.len() != seq_len {
        return Err(EmbeddingError::EmbeddingFailed {
            error: format!("Attention mask length {} doesn't match sequence length {}", attention_mask.len(), seq_len),
        });
    }

    Ok((seq_len, hidden_size))
}

/// Mean of the hidden states of every attended token
fn mean_pooling(hidden: &ArrayViewD<f32>, attention_mask: &[u32]) -> Result<Vec<f32>, EmbeddingError> {
    let (seq_len, hidden_size) = check_hidden_shape(hidden, attention_mask)?;

    let mut pooled = vec![0.0f32; hidden_size];
    let mut valid_tokens = 0;

    for seq_idx in (0..seq_len).filter(|&i| attention_mask[i] == 1) {
        for (hidden_idx, slot) in pooled.iter_mut().enumerate() {
            *slot += hidden[[0, seq_idx, hidden_idx]];
        }
        valid_tokens += 1;
    }

    if valid_tokens == 0 {
        return Err(EmbeddingError::EmbeddingFailed {
            error: "No valid tokens found in attention mask".to_string(),
        });
    }

    for val in &mut pooled {
        *val /= valid_tokens as f32;
    }

    Ok(pooled)
}

/// Hidden state of the last attended token
fn last_token_pooling(hidden: &ArrayViewD<f32>, attention_mask: &[u32]) -> Result<Vec<f32>, EmbeddingError> {
    let (seq_len, hidden_size) = check_hidden_shape(hidden, attention_mask)?;

    let last = (0..seq_len)
        .rev()
        .find(|&i| attention_mask[i] == 1)
        .ok_or_else(|| EmbeddingError::EmbeddingFailed {
            error: "No valid tokens found in attention mask".to_string(),
        })?;

    Ok((0..hidden_size).map(|h| hidden[[0, last, h]]).collect())
}

/// L2 normalization
fn normalize_embedding(embedding: &[f32]) -> Result<Vec<f32>, EmbeddingError> {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm == 0.0 {
        return Err(EmbeddingError::EmbeddingFailed {
            error: "Cannot normalize zero vector".to_string(),
        });
    }

    Ok(embedding.iter().map(|x| x / norm).collect())
}
