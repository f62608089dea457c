//! Chat request and response records.

use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Temperature used when the request omits one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Generation budget used when the request omits one.
pub const DEFAULT_MAX_TOKENS: u32 = 200;

/// Client address reported when the transport does not expose a peer.
pub const UNKNOWN_CLIENT: &str = "unknown";

const fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

const fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

/// `POST /chat` request body.
///
/// Only `message` is required; everything else falls back to the
/// defaults above. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Prompt text handed to the engine verbatim.
    pub message: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum number of tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Stream raw text deltas instead of returning one JSON object.
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    /// Create a request with default sampling settings.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            stream: false,
        }
    }

    /// Set the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the generation budget.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Switch streaming on or off.
    #[must_use]
    pub const fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Range checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(ValidationError::Temperature(self.temperature));
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::MaxTokens);
        }
        Ok(())
    }
}

/// Input rejected before the engine is involved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("temperature must be a finite number >= 0, got {0}")]
    Temperature(f32),

    #[error("max_tokens must be at least 1")]
    MaxTokens,
}

/// Per-request facts captured on receipt.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// When the request arrived (local time).
    pub received_at: DateTime<Local>,
    /// Peer address as seen by the transport.
    pub client_ip: String,
}

impl RequestContext {
    /// Capture the current time for a request from `client_ip`.
    pub fn now(client_ip: impl Into<String>) -> Self {
        Self {
            received_at: Local::now(),
            client_ip: client_ip.into(),
        }
    }

    /// Context for a request whose peer address is not known.
    pub fn unknown_client() -> Self {
        Self::now(UNKNOWN_CLIENT)
    }

    /// ISO-8601 receipt timestamp as reported to clients.
    pub fn timestamp(&self) -> String {
        self.received_at
            .to_rfc3339_opts(SecondsFormat::Micros, false)
    }
}

/// Non-streaming `POST /chat` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub timestamp: String,
    pub client_ip: String,
    pub prompt: String,
    pub response: String,
}

impl ChatResponse {
    /// Assemble the response for a finished generation.
    pub fn new(ctx: &RequestContext, prompt: String, response: String) -> Self {
        Self {
            timestamp: ctx.timestamp(),
            client_ip: ctx.client_ip.clone(),
            prompt,
            response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_when_fields_missing() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "Hi"}"#).unwrap();
        assert_eq!(req.message, "Hi");
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(req.max_tokens, 200);
        assert!(!req.stream);
    }

    #[test]
    fn test_explicit_fields_override_defaults() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"message": "Hi", "temperature": 0, "max_tokens": 16, "stream": true}"#,
        )
        .unwrap();
        assert_eq!(req.temperature, 0.0);
        assert_eq!(req.max_tokens, 16);
        assert!(req.stream);
    }

    #[test]
    fn test_missing_message_is_rejected() {
        let err = serde_json::from_str::<ChatRequest>(r#"{"stream": true}"#).unwrap_err();
        assert!(err.to_string().contains("message"));
    }

    #[test]
    fn test_wrong_types_are_rejected() {
        assert!(serde_json::from_str::<ChatRequest>(r#"{"message": 42}"#).is_err());
        assert!(serde_json::from_str::<ChatRequest>(r#"{"message": "Hi", "stream": "yes"}"#).is_err());
        assert!(serde_json::from_str::<ChatRequest>(r#"{"message": "Hi", "max_tokens": -1}"#).is_err());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"message": "Hi", "model": "whatever"}"#).unwrap();
        assert_eq!(req, ChatRequest::new("Hi"));
    }

    #[test]
    fn test_validate_ranges() {
        assert!(ChatRequest::new("Hi").validate().is_ok());
        assert!(ChatRequest::new("Hi").with_temperature(0.0).validate().is_ok());
        assert_eq!(
            ChatRequest::new("Hi").with_temperature(-0.1).validate(),
            Err(ValidationError::Temperature(-0.1))
        );
        assert!(ChatRequest::new("Hi")
            .with_temperature(f32::NAN)
            .validate()
            .is_err());
        assert_eq!(
            ChatRequest::new("Hi").with_max_tokens(0).validate(),
            Err(ValidationError::MaxTokens)
        );
    }

    #[test]
    fn test_response_carries_context() {
        let ctx = RequestContext::now("10.0.0.7");
        let resp = ChatResponse::new(&ctx, "Hi".to_string(), "Hello!".to_string());
        assert_eq!(resp.client_ip, "10.0.0.7");
        assert_eq!(resp.prompt, "Hi");
        assert_eq!(resp.response, "Hello!");
        assert!(DateTime::parse_from_rfc3339(&resp.timestamp).is_ok());
    }
}
