//! Inference engine port.
//!
//! Abstracts the component that turns a prompt into generated text. The
//! engine owns model loading, batching and GPU memory; callers only see a
//! lazy stream of cumulative snapshots per request.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use thiserror::Error;

use crate::domain::{GenerationSnapshot, RequestId, SamplingParams};

/// Lazy, finite, non-restartable sequence of snapshots for one request.
pub type SnapshotStream =
    Pin<Box<dyn Stream<Item = Result<GenerationSnapshot, EngineError>> + Send + 'static>>;

/// Errors raised by an engine during generation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be reached.
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    /// The engine answered with an error status.
    #[error("Engine returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The engine's output could not be understood.
    #[error("Malformed engine output: {0}")]
    Protocol(String),

    /// The generation was aborted before it finished.
    #[error("Request {0} was aborted")]
    Aborted(RequestId),

    /// Unexpected failure inside the engine adapter.
    #[error("Internal engine error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Suggested HTTP status code for this error.
    #[must_use]
    pub const fn suggested_status_code(&self) -> u16 {
        match self {
            Self::Unavailable(_) => 503,
            Self::Upstream { .. } | Self::Protocol(_) => 502,
            Self::Aborted(_) | Self::Internal(_) => 500,
        }
    }
}

/// Port for the inference engine.
///
/// Implementations must be safe to share between concurrent requests;
/// batching across requests is the engine's business, not the caller's.
#[async_trait]
pub trait InferenceEngine: Send + Sync + fmt::Debug {
    /// Start generating for `prompt`.
    ///
    /// Returns once the engine has accepted the request. Each item of the
    /// returned stream carries the full text generated so far; the stream
    /// ends after the engine reports completion.
    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParams,
        request_id: &RequestId,
    ) -> Result<SnapshotStream, EngineError>;

    /// Stop an in-flight generation and release its engine resources.
    ///
    /// Must not block: callers invoke this from `Drop`. Unknown or already
    /// finished ids are ignored. Ids are not guaranteed unique, so an engine
    /// must never cancel a generation other than the caller's; dropping the
    /// returned stream has to stop its own generation regardless.
    fn abort(&self, request_id: &RequestId);

    /// Check that the engine is reachable and ready.
    async fn health(&self) -> Result<(), EngineError>;

    /// Identifier of the model this engine serves.
    fn model(&self) -> &str;
}
