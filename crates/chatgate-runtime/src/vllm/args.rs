//! `vllm serve` command construction.

use std::path::{Path, PathBuf};

use chatgate_core::{EngineConfig, Quantization};
use tokio::process::Command;

/// Binary looked up on `PATH` when none is configured.
pub const DEFAULT_VLLM_BINARY: &str = "vllm";

/// Builds the argument list for an OpenAI-compatible vLLM server.
#[derive(Debug, Clone)]
pub struct VllmCommandBuilder<'a> {
    binary: PathBuf,
    config: &'a EngineConfig,
    host: String,
    port: u16,
    extra_args: Vec<String>,
}

impl<'a> VllmCommandBuilder<'a> {
    pub fn new(binary: impl AsRef<Path>, config: &'a EngineConfig) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            config,
            host: "127.0.0.1".to_string(),
            port: 8000,
            extra_args: Vec::new(),
        }
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Extra flags appended verbatim after the generated ones.
    #[must_use]
    pub fn extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Arguments passed after the binary name.
    pub fn args(&self) -> Vec<String> {
        let config = self.config;
        let mut args = vec![
            "serve".to_string(),
            config.model.clone(),
            "--host".to_string(),
            self.host.clone(),
            "--port".to_string(),
            self.port.to_string(),
            "--dtype".to_string(),
            config.dtype.to_string(),
            "--gpu-memory-utilization".to_string(),
            config.gpu_memory_utilization.to_string(),
            "--max-model-len".to_string(),
            config.max_model_len.to_string(),
            "--max-num-seqs".to_string(),
            config.max_num_seqs.to_string(),
        ];

        if config.trust_remote_code {
            args.push("--trust-remote-code".to_string());
        }

        if let Some(quantization) = config.quantization {
            args.push("--quantization".to_string());
            args.push(quantization.to_string());
            // In-flight bitsandbytes quantization also needs the matching loader.
            if quantization == Quantization::Bitsandbytes {
                args.push("--load-format".to_string());
                args.push("bitsandbytes".to_string());
            }
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Shell-style rendering for logs and `engine-args`.
    pub fn display(&self) -> String {
        std::iter::once(self.binary.display().to_string())
            .chain(self.args())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build the command with piped stdio, killed if the handle is dropped.
    pub fn build(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(self.args())
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}
