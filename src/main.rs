//! Similarity Endpoint Main
//!
//! Usage: `similarity_endpoint [config.toml]`. `SIMILARITY_CONFIG` is used when
//! no argument is given; a missing file means built-in defaults.

use similarity_endpoint::{ServerConfig, SimilarityServer};
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SIMILARITY_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let config = ServerConfig::load(&config_path)?;

    // Initialize tracing
    let log_level = match config.monitoring.log_level.to_lowercase().as_str() {
        "trace" => "similarity_endpoint=trace,info",
        "debug" => "similarity_endpoint=debug,info",
        "warn" => "similarity_endpoint=warn,warn",
        "error" => "similarity_endpoint=error,error",
        _ => "similarity_endpoint=info,info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into())
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .init();

    info!("📄 Config: {}", config_path);
    info!("📊 Log Level: {}", config.monitoring.log_level);

    // Model load and bind are fatal on failure, nothing is served without a model
    let server = SimilarityServer::new(config).await?;

    info!("🛑 Press Ctrl+C to stop");
    server.start().await?;

    Ok(())
}
