//! Managed engine process lifecycle.
//!
//! Owns one `vllm serve` child: spawn, log capture, readiness wait and
//! graceful shutdown. No request handling happens here.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use anyhow::{Result, anyhow};
use chatgate_core::EngineConfig;
use tokio::process::Child;
use tracing::{info, warn};

use crate::command;
use crate::health::wait_for_http_health;
use crate::shutdown::shutdown_child;
use crate::vllm::{DEFAULT_VLLM_BINARY, VllmCommandBuilder};

/// Default port for a managed engine.
pub const DEFAULT_ENGINE_PORT: u16 = 8000;

/// Default time allowed for model download and load.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(600);

/// Everything needed to launch an engine process.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Path or name of the `vllm` executable.
    pub binary: PathBuf,
    pub config: EngineConfig,
    /// Interface the engine binds to.
    pub host: String,
    pub port: u16,
    /// How long to wait for `/health` before giving up.
    pub startup_timeout: Duration,
    /// Additional flags passed through to the engine.
    pub extra_args: Vec<String>,
}

impl LaunchSpec {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_VLLM_BINARY),
            config,
            host: "127.0.0.1".to_string(),
            port: DEFAULT_ENGINE_PORT,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            extra_args: Vec::new(),
        }
    }

    pub fn command(&self) -> VllmCommandBuilder<'_> {
        VllmCommandBuilder::new(&self.binary, &self.config)
            .host(self.host.clone())
            .port(self.port)
            .extra_args(self.extra_args.clone())
    }

    /// URL clients use to reach the launched engine.
    pub fn base_url(&self) -> String {
        let host = match self.host.as_str() {
            "0.0.0.0" | "::" => "127.0.0.1",
            other => other,
        };
        format!("http://{}:{}", host, self.port)
    }
}

/// A running engine process.
#[derive(Debug)]
pub struct EngineProcess {
    child: Child,
    base_url: String,
    pid: Option<u32>,
}

impl EngineProcess {
    /// Spawn the engine and wait until it serves `/health`.
    ///
    /// # Errors
    ///
    /// Fails if the process cannot be spawned, exits during start-up, or
    /// does not become healthy within `spec.startup_timeout`. The child is
    /// terminated in every failure case.
    pub async fn launch(spec: &LaunchSpec) -> Result<Self> {
        spec.config.validate()?;

        let mut child = command::spawn(&spec.command())?;
        let pid = child.id();
        command::spawn_log_readers(&mut child, spec.port);

        let base_url = spec.base_url();
        info!(pid = ?pid, base_url = %base_url, model = %spec.config.model, "Engine process started");

        let ready = tokio::select! {
            result = wait_for_http_health(&base_url, spec.startup_timeout) => result,
            status = child.wait() => Err(match status {
                Ok(status) => anyhow!("Inference engine exited during start-up ({status})"),
                Err(e) => anyhow!("Failed to wait for inference engine: {e}"),
            }),
        };

        if let Err(e) = ready {
            if let Err(kill_err) = shutdown_child(child).await {
                warn!("Failed to stop engine after failed start: {}", kill_err);
            }
            return Err(e);
        }

        Ok(Self {
            child,
            base_url,
            pid,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Stop the engine (SIGTERM, then SIGKILL after a grace period).
    pub async fn shutdown(self) -> io::Result<ExitStatus> {
        info!(pid = ?self.pid, "Stopping inference engine");
        shutdown_child(self.child).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_maps_wildcard_host() {
        let mut spec = LaunchSpec::new(EngineConfig::default());
        assert_eq!(spec.base_url(), "http://127.0.0.1:8000");

        spec.host = "0.0.0.0".to_string();
        spec.port = 8100;
        assert_eq!(spec.base_url(), "http://127.0.0.1:8100");

        spec.host = "10.0.0.2".to_string();
        assert_eq!(spec.base_url(), "http://10.0.0.2:8100");
    }

    #[tokio::test]
    async fn test_missing_binary_fails_to_launch() {
        let mut spec = LaunchSpec::new(EngineConfig::default());
        spec.binary = PathBuf::from("/nonexistent/bin/vllm");

        let err = EngineProcess::launch(&spec).await.unwrap_err();
        assert!(err.to_string().contains("Failed to spawn"), "{err}");
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_spawn() {
        let mut spec = LaunchSpec::new(EngineConfig::new(""));
        spec.binary = PathBuf::from("/nonexistent/bin/vllm");

        let err = EngineProcess::launch(&spec).await.unwrap_err();
        assert!(err.to_string().contains("model identifier"), "{err}");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_engine_exiting_during_startup_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let binary = dir.path().join("vllm");
        std::fs::write(&binary, "#!/bin/sh\necho 'CUDA out of memory' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut spec = LaunchSpec::new(EngineConfig::default());
        spec.binary = binary;
        spec.port = 9;
        spec.startup_timeout = Duration::from_secs(30);

        let err = EngineProcess::launch(&spec).await.unwrap_err();
        assert!(err.to_string().contains("exited during start-up"), "{err}");
    }
}
