//! `POST /chat` handler.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use chatgate_core::{ChatRequest, RequestContext};

use crate::error::HttpError;
use crate::extract::ClientAddr;
use crate::state::AppState;
use crate::stream::text_stream_response;

/// Generate a reply to `message`.
///
/// POST /chat
///
/// With `"stream": false` (the default) the handler waits for the engine to
/// finish and returns `{timestamp, client_ip, prompt, response}`. With
/// `"stream": true` it returns the generated text as it is produced.
pub async fn chat(
    State(state): State<AppState>,
    ClientAddr(client_ip): ClientAddr,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, HttpError> {
    let ctx = RequestContext::now(client_ip);
    let Json(request) = payload?;

    if request.stream {
        let deltas = state.chat.stream(request, ctx).await?;
        Ok(text_stream_response(deltas))
    } else {
        let response = state.chat.complete(request, ctx).await?;
        Ok(Json(response).into_response())
    }
}
