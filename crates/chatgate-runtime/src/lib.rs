//! Engine runtime for chatgate.
//!
//! Two halves:
//!
//! - **Process management**: launch a `vllm serve` child from an
//!   [`EngineConfig`](chatgate_core::EngineConfig), forward its output to
//!   `tracing`, wait until `/health` answers and shut it down with
//!   SIGTERM → SIGKILL.
//! - **Engine client**: [`OpenAiEngine`] implements
//!   [`InferenceEngine`](chatgate_core::InferenceEngine) against any
//!   OpenAI-compatible completions server, turning its SSE token stream
//!   into cumulative snapshots.

#![deny(unsafe_code)]

pub mod client;
mod command;
mod health;
pub mod process;
mod shutdown;
pub mod vllm;

pub use client::{OpenAiEngine, OpenAiEngineConfig};
pub use health::{check_http_health, wait_for_http_health};
pub use process::{EngineProcess, LaunchSpec};
pub use shutdown::shutdown_child;
pub use vllm::VllmCommandBuilder;
