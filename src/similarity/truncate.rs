//! Input length policy
//!
//! Every text is cut to a leading prefix of at most N characters (Unicode
//! scalar values, never splitting one) before it reaches the model. Over-length
//! input is not an error.

use serde::{Deserialize, Serialize};

/// Per-field character bounds, tuned to the deployed model's input length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TruncationLimits {
    pub query_max_chars: usize,
    pub document_max_chars: usize,
    pub prompt_max_chars: usize,
}

impl Default for TruncationLimits {
    fn default() -> Self {
        Self {
            query_max_chars: 8192 - 256,
            document_max_chars: 16 * 1024 - 256,
            prompt_max_chars: 150,
        }
    }
}

impl TruncationLimits {
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("query_max_chars", self.query_max_chars),
            ("document_max_chars", self.document_max_chars),
            ("prompt_max_chars", self.prompt_max_chars),
        ] {
            if value == 0 {
                return Err(format!("truncation.{} must be positive", field));
            }
        }
        Ok(())
    }
}

/// Leading prefix of `text` holding at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Truncate `text` in place
pub fn truncate_string(text: &mut String, max_chars: usize) {
    let keep = truncate_chars(text, max_chars).len();
    text.truncate(keep);
}

/// Truncate every string of `texts` in place, order preserved
pub fn truncate_all(texts: &mut [String], max_chars: usize) {
    for text in texts.iter_mut() {
        truncate_string(text, max_chars);
    }
}
