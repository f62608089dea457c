//! Serve command handler.
//!
//! Resolves the engine (an external URL, or a managed `vllm serve` child),
//! then runs the HTTP server until Ctrl+C or SIGTERM.

use std::sync::Arc;

use anyhow::{Result, bail};
use chatgate_axum::{ServerConfig, start_server};
use chatgate_core::Settings;
use chatgate_runtime::{EngineProcess, OpenAiEngine, OpenAiEngineConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::commands::ServeArgs;

/// Server settings from the command line.
pub fn settings(args: &ServeArgs) -> Result<Settings> {
    let settings = Settings {
        host: args.host.clone(),
        port: args.port,
        request_ids: args.request_ids,
        allowed_origins: args.allowed_origins.clone(),
    };
    settings.validate()?;
    Ok(settings)
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs) -> Result<()> {
    let settings = settings(&args)?;
    let config = args.engine.to_config()?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    let (engine_url, process) = if let Some(url) = args.engine_url.clone() {
        info!(url = %url, model = %config.model, "Using external inference engine");
        (url, None)
    } else {
        let spec = args.launch.to_launch_spec(config.clone());

        // Dropping the launch future kills the child.
        let process = tokio::select! {
            process = EngineProcess::launch(&spec) => process?,
            () = shutdown.cancelled() => bail!("Interrupted while the engine was starting"),
        };
        (process.base_url().to_string(), Some(process))
    };

    let engine = OpenAiEngine::new(OpenAiEngineConfig::new(engine_url, config.model))?;
    let result = start_server(
        ServerConfig::from_settings(&settings),
        Arc::new(engine),
        shutdown,
    )
    .await;

    if let Some(process) = process {
        match process.shutdown().await {
            Ok(status) => info!(%status, "Inference engine stopped"),
            Err(e) => warn!("Failed to stop inference engine: {e}"),
        }
    }

    result
}

/// Resolve on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Commands;
    use crate::parser::Cli;
    use clap::Parser;

    fn serve_args(args: &[&str]) -> ServeArgs {
        let argv = ["chatgate", "serve"].iter().chain(args.iter()).copied();
        let Commands::Serve(args) = Cli::parse_from(argv).command else {
            panic!("expected serve");
        };
        args
    }

    #[test]
    fn test_settings_from_args() {
        let settings = settings(&serve_args(&["--port", "9090", "--host", "127.0.0.1"])).unwrap();
        assert_eq!(settings.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn test_invalid_origin_is_rejected() {
        let err = settings(&serve_args(&["--allowed-origins", "chat.example.com"])).unwrap_err();
        assert!(err.to_string().contains("chat.example.com"), "{err}");
    }

    #[tokio::test]
    async fn test_failed_engine_launch_is_reported() {
        let args = serve_args(&["--vllm-bin", "/nonexistent/bin/vllm", "--port", "0"]);
        let err = execute(args).await.unwrap_err();
        assert!(err.to_string().contains("Failed to spawn"), "{err}");
    }
}
