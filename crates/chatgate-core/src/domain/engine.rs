//! Inference engine launch configuration.
//!
//! These are the construction parameters of the engine: which model to
//! load and how much of the GPU it may take. They are intent-based; the
//! runtime crate decides how to turn them into a process invocation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model served when none is configured.
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-R1-Distill-Llama-8B";

/// Fraction of GPU memory the engine may reserve by default.
pub const DEFAULT_GPU_MEMORY_UTILIZATION: f32 = 0.75;

/// Default maximum context length (prompt + generation) in tokens.
pub const DEFAULT_MAX_MODEL_LEN: u32 = 2048;

/// Default number of sequences the engine batches concurrently.
pub const DEFAULT_MAX_NUM_SEQS: u32 = 32;

/// Error for string-to-enum conversions of configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Weight quantization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantization {
    /// 4-bit bitsandbytes, loaded on the fly from full-precision weights.
    Bitsandbytes,
    Awq,
    Gptq,
    Fp8,
}

impl Quantization {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bitsandbytes => "bitsandbytes",
            Self::Awq => "awq",
            Self::Gptq => "gptq",
            Self::Fp8 => "fp8",
        }
    }
}

impl fmt::Display for Quantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quantization {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bitsandbytes" | "bnb" => Ok(Self::Bitsandbytes),
            "awq" => Ok(Self::Awq),
            "gptq" => Ok(Self::Gptq),
            "fp8" => Ok(Self::Fp8),
            _ => Err(ParseEnumError::new("quantization", s)),
        }
    }
}

/// Numeric precision for weights and activations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Auto,
    Float16,
    #[default]
    Bfloat16,
    Float32,
}

impl Dtype {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Float16 => "float16",
            Self::Bfloat16 => "bfloat16",
            Self::Float32 => "float32",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dtype {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "float16" | "half" | "fp16" => Ok(Self::Float16),
            "bfloat16" | "bf16" => Ok(Self::Bfloat16),
            "float32" | "float" | "fp32" => Ok(Self::Float32),
            _ => Err(ParseEnumError::new("dtype", s)),
        }
    }
}

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineConfigError {
    #[error("model identifier must not be empty")]
    EmptyModel,

    #[error("gpu_memory_utilization must be in (0, 1], got {0}")]
    GpuMemoryUtilization(f32),

    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

/// Construction parameters for the inference engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Model identifier (hub repo id or local path).
    pub model: String,
    /// Allow the model repository to ship custom code.
    pub trust_remote_code: bool,
    /// Weight quantization; `None` loads weights as stored.
    pub quantization: Option<Quantization>,
    pub dtype: Dtype,
    /// Fraction of GPU memory reserved for weights and KV cache.
    pub gpu_memory_utilization: f32,
    /// Maximum context length in tokens.
    pub max_model_len: u32,
    /// Maximum number of sequences scheduled together.
    pub max_num_seqs: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            trust_remote_code: true,
            quantization: Some(Quantization::Bitsandbytes),
            dtype: Dtype::Bfloat16,
            gpu_memory_utilization: DEFAULT_GPU_MEMORY_UTILIZATION,
            max_model_len: DEFAULT_MAX_MODEL_LEN,
            max_num_seqs: DEFAULT_MAX_NUM_SEQS,
        }
    }
}

impl EngineConfig {
    /// Create a configuration for `model` with default resource limits.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if self.model.trim().is_empty() {
            return Err(EngineConfigError::EmptyModel);
        }
        if !(self.gpu_memory_utilization > 0.0 && self.gpu_memory_utilization <= 1.0) {
            return Err(EngineConfigError::GpuMemoryUtilization(
                self.gpu_memory_utilization,
            ));
        }
        if self.max_model_len == 0 {
            return Err(EngineConfigError::Zero("max_model_len"));
        }
        if self.max_num_seqs == 0 {
            return Err(EngineConfigError::Zero("max_num_seqs"));
        }
        Ok(())
    }
}
