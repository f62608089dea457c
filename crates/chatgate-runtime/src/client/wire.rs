//! OpenAI completions API wire types (the subset the engine client uses).

use serde::{Deserialize, Serialize};

/// `POST /v1/completions` request body.
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

/// One SSE `data:` payload of a streaming completion.
#[derive(Debug, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// Present when the server fails mid-stream.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: usize,
    /// Newly generated text (a delta, not cumulative).
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Pull a human-readable message out of an error body.
///
/// Handles both `{"error": {"message": ..}}` and the flat
/// `{"object": "error", "message": ..}` shape; falls back to the raw text.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| message_of(&v))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Message inside an error value, if it has one.
pub fn message_of(value: &serde_json::Value) -> Option<String> {
    value
        .get("error")
        .and_then(|e| e.get("message").or(Some(e)))
        .and_then(serde_json::Value::as_str)
        .or_else(|| value.get("message").and_then(serde_json::Value::as_str))
        .map(str::to_string)
}
