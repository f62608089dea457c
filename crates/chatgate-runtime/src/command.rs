//! Spawning the engine process and streaming its output.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tracing::{debug, info};

use crate::vllm::VllmCommandBuilder;

/// Spawn the engine described by `builder`.
///
/// # Errors
///
/// Returns an error if the binary cannot be found or executed.
pub fn spawn(builder: &VllmCommandBuilder<'_>) -> anyhow::Result<Child> {
    info!(command = %builder.display(), "Launching inference engine");

    builder.build().spawn().with_context(|| {
        format!(
            "Failed to spawn inference engine '{}'. Is vLLM installed and on PATH?",
            builder.binary().display()
        )
    })
}

/// Spawn background tasks that forward stdout/stderr lines to tracing.
///
/// The tasks exit when the streams close.
pub fn spawn_log_readers(child: &mut Child, port: u16) {
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(text)) = lines.next_line().await {
                debug!(target: "chatgate::engine", port, "stdout: {}", text);
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(text)) = lines.next_line().await {
                // vLLM logs everything, including INFO, to stderr
                debug!(target: "chatgate::engine", port, "stderr: {}", text);
            }
        });
    }
}
