//! Streaming response bodies.
//!
//! Text deltas are written as raw `text/plain` chunks with no framing, so
//! a client that concatenates the body sees exactly the generated text.

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use chatgate_core::DeltaStream;
use futures_util::StreamExt;

/// Build a chunked `text/plain` response from a delta stream.
///
/// An engine error mid-stream is surfaced to hyper as a body error, which
/// aborts the connection; the client sees a truncated body rather than a
/// completion marker.
pub fn text_stream_response(deltas: DeltaStream) -> Response {
    let body = deltas.map(|item| {
        item.map(Bytes::from).map_err(|e| {
            tracing::error!("Generation failed mid-stream: {e}");
            std::io::Error::other(e)
        })
    });

    let mut response = (StatusCode::OK, Body::from_stream(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    // Disable proxy buffering (nginx) so deltas reach the client promptly.
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}
