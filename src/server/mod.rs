//! Server module

pub mod config;
pub mod hyper_server;
pub mod server;

pub use config::{ConfigError, ServerConfig};
pub use hyper_server::{handle_request, Route, ServerState};
pub use server::SimilarityServer;
