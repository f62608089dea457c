//! Axum server bootstrap.
//!
//! Binds the listener, builds the router around an injected engine and runs
//! until the shutdown token fires.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chatgate_core::{ChatService, InferenceEngine, RequestIdStrategy, Settings};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::routes::create_router;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port for the HTTP server.
    pub port: u16,
    /// How request ids are minted.
    pub request_ids: RequestIdStrategy,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Derive the server config from validated settings.
    ///
    /// An empty origin list means any origin is allowed.
    pub fn from_settings(settings: &Settings) -> Self {
        let cors = if settings.allowed_origins.is_empty() {
            CorsConfig::AllowAll
        } else {
            CorsConfig::AllowOrigins(settings.allowed_origins.clone())
        };

        Self {
            host: settings.host.clone(),
            port: settings.port,
            request_ids: settings.request_ids,
            cors,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Application context for the Axum adapter.
#[derive(Debug, Clone)]
pub struct AxumContext {
    /// The chat service wrapping the engine.
    pub chat: ChatService,
}

impl AxumContext {
    pub fn new(engine: Arc<dyn InferenceEngine>, request_ids: RequestIdStrategy) -> Self {
        Self {
            chat: ChatService::new(engine, request_ids),
        }
    }
}

/// Serve on an already bound listener until `shutdown` is cancelled.
///
/// In-flight responses are allowed to finish; streams whose client goes
/// away are dropped, which aborts their generation.
pub async fn serve(
    listener: TcpListener,
    ctx: AxumContext,
    cors: CorsConfig,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = create_router(ctx, &cors);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
    .context("HTTP server failed")?;

    info!("HTTP server stopped");
    Ok(())
}

/// Bind `config.bind_addr()` and serve the chat API.
pub async fn start_server(
    config: ServerConfig,
    engine: Arc<dyn InferenceEngine>,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        model = %engine.model(),
        request_ids = %config.request_ids,
        "chatgate listening on http://{}",
        listener.local_addr().map_or(addr, |a| a.to_string())
    );

    let ctx = AxumContext::new(engine, config.request_ids);
    serve(listener, ctx, config.cors, shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_from_settings() {
        let settings = Settings::default();
        let config = ServerConfig::from_settings(&settings);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.request_ids, RequestIdStrategy::Uuid);
        assert!(matches!(config.cors, CorsConfig::AllowAll));

        let settings = Settings {
            allowed_origins: vec!["https://chat.example.com".to_string()],
            ..Settings::default()
        };
        let config = ServerConfig::from_settings(&settings);
        assert!(matches!(config.cors, CorsConfig::AllowOrigins(ref o) if o.len() == 1));
    }
}
