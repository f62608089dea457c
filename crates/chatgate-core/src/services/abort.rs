//! Snapshot stream guard that aborts unfinished generations.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tracing::debug;

use crate::domain::{GenerationSnapshot, RequestId};
use crate::ports::{EngineError, InferenceEngine, SnapshotStream};

/// Wraps an engine stream and calls [`InferenceEngine::abort`] if it is
/// dropped before the engine finished.
///
/// Dropping happens when the client disconnects mid-stream (the response
/// body is dropped by the transport) or when a handler bails out early.
pub struct AbortOnDrop {
    inner: SnapshotStream,
    engine: Arc<dyn InferenceEngine>,
    request_id: RequestId,
    done: bool,
}

impl AbortOnDrop {
    pub fn new(inner: SnapshotStream, engine: Arc<dyn InferenceEngine>, request_id: RequestId) -> Self {
        Self {
            inner,
            engine,
            request_id,
            done: false,
        }
    }

    pub const fn request_id(&self) -> &RequestId {
        &self.request_id
    }
}

impl Stream for AbortOnDrop {
    type Item = Result<GenerationSnapshot, EngineError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        let polled = this.inner.as_mut().poll_next(cx);
        match &polled {
            Poll::Ready(None) | Poll::Ready(Some(Err(_))) => this.done = true,
            Poll::Ready(Some(Ok(snapshot))) if snapshot.finished => this.done = true,
            _ => {}
        }
        polled
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        // Runs before `inner` is dropped, so the engine still sees this
        // generation as live.
        if !self.done {
            debug!(request_id = %self.request_id, "Generation dropped before completion, aborting");
            self.engine.abort(&self.request_id);
        }
    }
}
