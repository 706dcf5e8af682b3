//! Wire protocol of the similarity endpoint

pub mod http;

pub use http::{decode_request, read_body, DecodeError};
