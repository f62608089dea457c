//! Engine construction and launch flags shared by `serve` and `engine-args`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chatgate_core::domain::engine::{
    DEFAULT_GPU_MEMORY_UTILIZATION, DEFAULT_MAX_MODEL_LEN, DEFAULT_MAX_NUM_SEQS, DEFAULT_MODEL,
};
use chatgate_core::{Dtype, EngineConfig, Quantization};
use chatgate_runtime::LaunchSpec;
use chatgate_runtime::process::{DEFAULT_ENGINE_PORT, DEFAULT_STARTUP_TIMEOUT};
use chatgate_runtime::vllm::DEFAULT_VLLM_BINARY;
use clap::Args;

/// Model and resource settings for the inference engine.
#[derive(Debug, Clone, Args)]
pub struct EngineFlags {
    /// Model identifier (hub repo id or local path)
    #[arg(long, env = "CHATGATE_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Do not allow the model repository to run custom code
    #[arg(long)]
    pub no_trust_remote_code: bool,

    /// Weight quantization (bitsandbytes, awq, gptq, fp8)
    #[arg(long, env = "CHATGATE_QUANTIZATION", default_value = "bitsandbytes")]
    pub quantization: Quantization,

    /// Load weights as stored, ignoring --quantization
    #[arg(long, conflicts_with = "quantization")]
    pub no_quantization: bool,

    /// Weight and activation dtype (auto, float16, bfloat16, float32)
    #[arg(long, env = "CHATGATE_DTYPE", default_value = "bfloat16")]
    pub dtype: Dtype,

    /// Fraction of GPU memory the engine may use
    #[arg(long, env = "CHATGATE_GPU_MEMORY_UTILIZATION", default_value_t = DEFAULT_GPU_MEMORY_UTILIZATION)]
    pub gpu_memory_utilization: f32,

    /// Maximum context length in tokens
    #[arg(long, env = "CHATGATE_MAX_MODEL_LEN", default_value_t = DEFAULT_MAX_MODEL_LEN)]
    pub max_model_len: u32,

    /// Maximum number of concurrently scheduled sequences
    #[arg(long, env = "CHATGATE_MAX_NUM_SEQS", default_value_t = DEFAULT_MAX_NUM_SEQS)]
    pub max_num_seqs: u32,
}

impl EngineFlags {
    /// Build and validate the engine configuration.
    pub fn to_config(&self) -> Result<EngineConfig> {
        let config = EngineConfig {
            model: self.model.clone(),
            trust_remote_code: !self.no_trust_remote_code,
            quantization: (!self.no_quantization).then_some(self.quantization),
            dtype: self.dtype,
            gpu_memory_utilization: self.gpu_memory_utilization,
            max_model_len: self.max_model_len,
            max_num_seqs: self.max_num_seqs,
        };
        config.validate()?;
        Ok(config)
    }
}

/// How a managed engine process is started.
#[derive(Debug, Clone, Args)]
pub struct LaunchFlags {
    /// Path to the vllm executable
    #[arg(long, env = "CHATGATE_VLLM_BIN", default_value = DEFAULT_VLLM_BINARY)]
    pub vllm_bin: PathBuf,

    /// Interface the managed engine binds to
    #[arg(long, env = "CHATGATE_ENGINE_HOST", default_value = "127.0.0.1")]
    pub engine_host: String,

    /// Port the managed engine listens on
    #[arg(long, env = "CHATGATE_ENGINE_PORT", default_value_t = DEFAULT_ENGINE_PORT)]
    pub engine_port: u16,

    /// Seconds to wait for the engine to load the model
    #[arg(long, env = "CHATGATE_STARTUP_TIMEOUT", default_value_t = DEFAULT_STARTUP_TIMEOUT.as_secs())]
    pub startup_timeout: u64,

    /// Extra argument passed through to the engine (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,
}

impl LaunchFlags {
    pub fn to_launch_spec(&self, config: EngineConfig) -> LaunchSpec {
        LaunchSpec {
            binary: self.vllm_bin.clone(),
            config,
            host: self.engine_host.clone(),
            port: self.engine_port,
            startup_timeout: Duration::from_secs(self.startup_timeout),
            extra_args: self.engine_args.clone(),
        }
    }
}
