//! Similarity Server
//!
//! Owns the process-wide model handle and the port binding. The model is
//! loaded and the port bound before anything is accepted, so a server that
//! exists can always answer.

use std::future::Future;
use std::net::SocketAddr;
use tracing::{error, info};

use crate::models::{ModelFactory, SharedModel};
use crate::server::config::{ConfigError, ServerConfig};
use crate::server::hyper_server::{bind_listener, serve, ServerState};

pub struct SimilarityServer {
    listener: std::net::TcpListener,
    local_addr: SocketAddr,
    state: ServerState,
}

impl SimilarityServer {
    /// Load the configured model, then bind
    pub async fn new(config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🚀 Loading resources for server...");

        let model = ModelFactory::load(&config.model).await?;
        info!("✅ Embedding model {} loaded", config.model.name);

        Self::with_model(config, model).await
    }

    /// Bind around an already loaded model
    pub async fn with_model(config: ServerConfig, model: SharedModel) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;

        let addr = config.socket_addr()?;
        let listener = bind_listener(addr).map_err(|source| ConfigError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;
        info!("📡 Server bound to {}", local_addr);

        let state = ServerState::new(model, &config).await;

        Ok(Self {
            listener,
            local_addr,
            state,
        })
    }

    /// Actual listening address, useful when the configured port is 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn identity(&self) -> &str {
        self.state.identity()
    }

    /// Serve until Ctrl+C
    pub async fn start(self) -> Result<(), hyper::Error> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves; in-flight requests are allowed to finish
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), hyper::Error>
    where
        F: Future<Output = ()>,
    {
        info!(
            "Server online on port {}, serving {}.",
            self.local_addr.port(),
            self.state.identity()
        );
        serve(self.listener, self.state, shutdown).await?;
        info!("🛑 Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("🛑 Ctrl+C received, shutting down"),
        Err(e) => {
            error!("❌ Unable to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await
        }
    }
}
