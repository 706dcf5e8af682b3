//! HTTP Protocol
//!
//! - `GET /embedding-model` answers the model identity as plain text
//! - `POST /` takes `{"queries": [...], "documents": [...], "prompt": "..."}`
//!   and answers a JSON array of arrays, one row per query
//! - `OPTIONS` on any path is a CORS preflight
//!
//! Every response carries permissive CORS headers so browsers can call the
//! endpoint directly.

use hyper::body::HttpBody;
use hyper::Body;

use crate::similarity::SimilarityRequest;

/// Path serving the model identity
pub const MODEL_PATH: &str = "/embedding-model";

/// Path accepting similarity requests
pub const SIMILARITY_PATH: &str = "/";

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// The request body could not be turned into a [`SimilarityRequest`]
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Failed to read request body: {0}")]
    Body(#[from] hyper::Error),

    #[error("Request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Invalid request payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request payload must be a JSON object")]
    NotAnObject,
}

/// Read the whole body, refusing anything over `limit` bytes
pub async fn read_body(mut body: Body, limit: usize) -> Result<Vec<u8>, DecodeError> {
    if body.size_hint().lower() > limit as u64 {
        return Err(DecodeError::TooLarge { limit });
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk?;
        if bytes.len() + chunk.len() > limit {
            return Err(DecodeError::TooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Decode a similarity payload; all three fields must be present and typed
pub fn decode_request(bytes: &[u8]) -> Result<SimilarityRequest, DecodeError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    Ok(serde_json::from_value(value)?)
}
