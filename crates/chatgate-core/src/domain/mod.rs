//! Domain types.
//!
//! Pure data records with serde derives and validation. No I/O.

pub mod chat;
pub mod engine;
pub mod generation;
pub mod request_id;
pub mod sampling;

pub use chat::{
    ChatRequest, ChatResponse, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, RequestContext,
    UNKNOWN_CLIENT, ValidationError,
};
pub use engine::{Dtype, EngineConfig, EngineConfigError, ParseEnumError, Quantization};
pub use generation::{CompletionOutput, GenerationSnapshot};
pub use request_id::{RequestId, RequestIdStrategy};
pub use sampling::{DEFAULT_TOP_P, SamplingParams};
