//! SSE → cumulative snapshot adapter.
//!
//! OpenAI-compatible servers stream completions as Server-Sent Events
//! whose payloads carry text deltas. The engine port speaks cumulative
//! snapshots, so this module decodes the event stream and re-accumulates
//! the text per candidate.

use std::fmt;

use bytes::{Bytes, BytesMut};
use chatgate_core::{CompletionOutput, EngineError, GenerationSnapshot, RequestId};
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::InflightGuard;
use super::wire::{CompletionChunk, message_of};

/// Upper bound on candidate indices accepted from the engine.
const MAX_CHOICES: usize = 16;

/// State threaded through the `unfold` stream.
struct SseState<E> {
    stream: BoxStream<'static, Result<Bytes, E>>,
    buf: BytesMut,
    request_id: RequestId,
    outputs: Vec<CompletionOutput>,
    cancel: CancellationToken,
    /// Keeps the request registered for `abort` while the stream lives.
    _inflight: Option<InflightGuard>,
    /// Every candidate has reported a finish reason.
    finished: bool,
    done: bool,
}

/// Convert an SSE byte stream into cumulative snapshots.
///
/// SSE format: `data: {"choices":[{"index":0,"text":"He"}]}\n\n`, ending
/// with `data: [DONE]`. The stream ends early (with
/// [`EngineError::Aborted`]) when `cancel` fires. A body that closes before
/// `[DONE]` while a candidate is still open yields [`EngineError::Protocol`].
pub(crate) fn snapshots<S, E>(
    byte_stream: S,
    request_id: RequestId,
    cancel: CancellationToken,
    inflight: Option<InflightGuard>,
) -> impl Stream<Item = Result<GenerationSnapshot, EngineError>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let state = SseState {
        stream: byte_stream.boxed(),
        buf: BytesMut::new(),
        request_id,
        outputs: Vec::new(),
        cancel,
        _inflight: inflight,
        finished: false,
        done: false,
    };

    futures_util::stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }

        loop {
            // Try to extract a complete SSE line from the buffer.
            if let Some(line_end) = find_newline(&st.buf) {
                let line = st.buf.split_to(line_end);
                let line_str = String::from_utf8_lossy(&line);
                let trimmed = line_str.trim();

                // Skip empty lines and SSE comments.
                if trimmed.is_empty() || trimmed.starts_with(':') {
                    continue;
                }

                let Some(data) = trimmed.strip_prefix("data:") else {
                    // event:/id:/retry: fields carry nothing we need.
                    continue;
                };
                let data = data.trim();

                if data == "[DONE]" {
                    debug!(request_id = %st.request_id, "Engine stream finished");
                    return None;
                }

                match serde_json::from_str::<CompletionChunk>(data) {
                    Ok(chunk) => {
                        if let Some(error) = chunk.error {
                            st.done = true;
                            let status = error
                                .get("code")
                                .and_then(serde_json::Value::as_u64)
                                .and_then(|c| u16::try_from(c).ok())
                                .unwrap_or(500);
                            let message = message_of(&serde_json::json!({ "error": error.clone() }))
                                .unwrap_or_else(|| error.to_string());
                            return Some((Err(EngineError::Upstream { status, message }), st));
                        }

                        // Usage-only chunks carry no choices.
                        if chunk.choices.is_empty() {
                            continue;
                        }

                        if let Err(e) = apply_chunk(&mut st.outputs, chunk) {
                            st.done = true;
                            return Some((Err(e), st));
                        }
                        st.finished = !st.outputs.is_empty()
                            && st.outputs.iter().all(|o| o.finish_reason.is_some());
                        let snapshot = GenerationSnapshot::new(
                            st.request_id.clone(),
                            st.outputs.clone(),
                            st.finished,
                        );
                        return Some((Ok(snapshot), st));
                    }
                    Err(e) => {
                        st.done = true;
                        return Some((
                            Err(EngineError::Protocol(format!("invalid completion chunk: {e}"))),
                            st,
                        ));
                    }
                }
            }

            // Need more data from upstream.
            tokio::select! {
                biased;

                () = st.cancel.cancelled() => {
                    debug!(request_id = %st.request_id, "Engine stream cancelled");
                    st.done = true;
                    let id = st.request_id.clone();
                    return Some((Err(EngineError::Aborted(id)), st));
                }
                next = st.stream.next() => match next {
                    Some(Ok(chunk)) => {
                        st.buf.extend_from_slice(&chunk);
                    }
                    Some(Err(e)) => {
                        warn!(request_id = %st.request_id, "Engine stream error: {e}");
                        st.done = true;
                        return Some((
                            Err(EngineError::Unavailable(format!("engine stream interrupted: {e}"))),
                            st,
                        ));
                    }
                    None if st.finished => {
                        debug!(request_id = %st.request_id, "Engine closed stream after final chunk");
                        return None;
                    }
                    None => {
                        warn!(request_id = %st.request_id, "Engine stream ended without [DONE]");
                        st.done = true;
                        return Some((
                            Err(EngineError::Protocol("engine stream ended without [DONE]".to_string())),
                            st,
                        ));
                    }
                }
            }
        }
    })
}

/// Append a chunk's deltas to the cumulative outputs.
fn apply_chunk(outputs: &mut Vec<CompletionOutput>, chunk: CompletionChunk) -> Result<(), EngineError> {
    for choice in chunk.choices {
        if choice.index >= MAX_CHOICES {
            return Err(EngineError::Protocol(format!(
                "choice index {} out of range",
                choice.index
            )));
        }
        while outputs.len() <= choice.index {
            let index = outputs.len();
            outputs.push(CompletionOutput::new(index, String::new()));
        }
        let output = &mut outputs[choice.index];
        output.text.push_str(&choice.text);
        if choice.finish_reason.is_some() {
            output.finish_reason = choice.finish_reason;
        }
    }
    Ok(())
}

/// Find the next newline in the buffer, returning the position after it.
fn find_newline(buf: &BytesMut) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n').map(|pos| pos + 1)
}
