//! Chat service: the request/response adapter in front of the engine.
//!
//! Validates a [`ChatRequest`], derives [`SamplingParams`], mints a
//! request id and hands the prompt to the injected engine. The output is
//! shaped either into a single [`ChatResponse`] or into a stream of text
//! deltas. Transport concerns (HTTP status codes, body framing) live in
//! the adapters.

use std::pin::Pin;
use std::sync::Arc;

use futures_core::Stream;
use futures_util::StreamExt;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{
    ChatRequest, ChatResponse, RequestContext, RequestIdStrategy, SamplingParams, ValidationError,
};
use crate::ports::{EngineError, InferenceEngine};

use super::abort::AbortOnDrop;
use super::delta::DeltaTracker;

/// Stream of text deltas for a streaming response.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, EngineError>> + Send + 'static>>;

/// Errors surfaced by [`ChatService`].
#[derive(Debug, Error)]
pub enum ChatError {
    /// Input rejected before any engine call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The engine failed to start or complete the generation.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Stateless chat adapter around an [`InferenceEngine`].
#[derive(Debug, Clone)]
pub struct ChatService {
    engine: Arc<dyn InferenceEngine>,
    request_ids: RequestIdStrategy,
}

impl ChatService {
    pub fn new(engine: Arc<dyn InferenceEngine>, request_ids: RequestIdStrategy) -> Self {
        Self {
            engine,
            request_ids,
        }
    }

    pub fn engine(&self) -> &Arc<dyn InferenceEngine> {
        &self.engine
    }

    /// Validate, build parameters and start the generation.
    async fn start(
        &self,
        request: &ChatRequest,
        ctx: &RequestContext,
    ) -> Result<AbortOnDrop, ChatError> {
        request.validate()?;

        let params = SamplingParams::from(request);
        let request_id = self.request_ids.mint(ctx);

        info!(
            request_id = %request_id,
            client_ip = %ctx.client_ip,
            stream = request.stream,
            temperature = params.temperature,
            max_tokens = params.max_tokens,
            "Starting generation"
        );

        let stream = self
            .engine
            .generate(&request.message, &params, &request_id)
            .await?;

        Ok(AbortOnDrop::new(stream, Arc::clone(&self.engine), request_id))
    }

    /// Run the generation to completion and return the final text.
    pub async fn complete(
        &self,
        request: ChatRequest,
        ctx: RequestContext,
    ) -> Result<ChatResponse, ChatError> {
        let mut snapshots = self.start(&request, &ctx).await?;

        let mut final_text = String::new();
        while let Some(snapshot) = snapshots.next().await {
            let snapshot = snapshot?;
            final_text.clear();
            final_text.push_str(snapshot.text());
        }

        debug!(
            request_id = %snapshots.request_id(),
            chars = final_text.chars().count(),
            "Generation complete"
        );

        Ok(ChatResponse::new(&ctx, request.message, final_text))
    }

    /// Start the generation and return its text deltas as they arrive.
    ///
    /// Validation and engine start-up errors are returned before any
    /// output; errors after that end the stream with one `Err` item.
    pub async fn stream(
        &self,
        request: ChatRequest,
        ctx: RequestContext,
    ) -> Result<DeltaStream, ChatError> {
        let snapshots = self.start(&request, &ctx).await?;
        Ok(Box::pin(deltas(snapshots)))
    }
}

/// State threaded through the `unfold` stream.
struct DeltaState {
    snapshots: AbortOnDrop,
    tracker: DeltaTracker,
    done: bool,
}

fn deltas(snapshots: AbortOnDrop) -> impl Stream<Item = Result<String, EngineError>> + Send {
    let state = DeltaState {
        snapshots,
        tracker: DeltaTracker::new(),
        done: false,
    };

    futures_util::stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }

        loop {
            match st.snapshots.next().await {
                Some(Ok(snapshot)) => {
                    let delta = st.tracker.advance(&snapshot);
                    if !delta.is_empty() {
                        return Some((Ok(delta), st));
                    }
                }
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(e), st));
                }
                None => {
                    debug!(request_id = %st.snapshots.request_id(), "Stream complete");
                    return None;
                }
            }
        }
    })
}
