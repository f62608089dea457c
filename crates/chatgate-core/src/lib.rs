//! Core domain types, ports and services for chatgate.
//!
//! This crate holds everything the `/chat` adapter needs that is independent
//! of the transport and of any concrete inference engine:
//!
//! - [`domain`]: request/response records, sampling parameters, snapshots,
//!   engine launch configuration
//! - [`ports`]: the [`InferenceEngine`] trait implemented by engine adapters
//! - [`services`]: the [`ChatService`] that validates, delegates and shapes
//! - [`settings`]: server-level settings and defaults
//!
//! Adapters (`chatgate-runtime`, `chatgate-axum`, `chatgate-cli`) depend on
//! this crate; it depends on none of them.

pub mod domain;
pub mod ports;
pub mod services;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types for convenience
pub use domain::{
    ChatRequest, ChatResponse, CompletionOutput, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
    DEFAULT_TOP_P, Dtype, EngineConfig, EngineConfigError, GenerationSnapshot, ParseEnumError,
    Quantization, RequestContext, RequestId, RequestIdStrategy, SamplingParams, UNKNOWN_CLIENT,
    ValidationError,
};
pub use ports::{EngineError, InferenceEngine, SnapshotStream};
pub use services::{AbortOnDrop, ChatError, ChatService, DeltaStream, DeltaTracker};
pub use settings::{DEFAULT_HOST, DEFAULT_PORT, Settings, SettingsError};
