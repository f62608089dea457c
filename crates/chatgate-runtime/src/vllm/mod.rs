//! Helpers for building vLLM invocations.

pub mod args;

pub use args::{DEFAULT_VLLM_BINARY, VllmCommandBuilder};
