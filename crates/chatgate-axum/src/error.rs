//! Axum-specific error types and mappings.
//!
//! Maps body rejections, validation failures and engine errors to HTTP
//! status codes with a JSON body of the form `{"error": .., "status": ..}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chatgate_core::{ChatError, EngineError};
use serde::Serialize;
use thiserror::Error;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Body is not JSON, or a field fails a range check.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Body is JSON but does not match the request schema.
    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    /// Body was sent without a JSON content type.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The engine answered with an error or unreadable output.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// The engine could not be reached.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HttpError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::BadRequest(msg)
            | Self::UnprocessableEntity(msg)
            | Self::UnsupportedMediaType(msg)
            | Self::BadGateway(msg)
            | Self::ServiceUnavailable(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "{}", self);
        }

        let body = ErrorBody {
            error: self.message(),
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<EngineError> for HttpError {
    fn from(err: EngineError) -> Self {
        let msg = err.to_string();
        match err {
            EngineError::Unavailable(_) => Self::ServiceUnavailable(msg),
            EngineError::Upstream { .. } | EngineError::Protocol(_) => Self::BadGateway(msg),
            EngineError::Aborted(_) | EngineError::Internal(_) => Self::Internal(msg),
        }
    }
}

impl From<ChatError> for HttpError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Validation(e) => Self::BadRequest(e.to_string()),
            ChatError::Engine(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        let msg = rejection.body_text();
        match rejection {
            JsonRejection::JsonDataError(_) => Self::UnprocessableEntity(msg),
            JsonRejection::MissingJsonContentType(_) => Self::UnsupportedMediaType(msg),
            _ => Self::BadRequest(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatgate_core::{RequestId, ValidationError};

    #[test]
    fn test_engine_errors_map_to_5xx() {
        let cases = [
            (EngineError::Unavailable("refused".into()), 503),
            (
                EngineError::Upstream {
                    status: 400,
                    message: "too long".into(),
                },
                502,
            ),
            (EngineError::Protocol("bad chunk".into()), 502),
            (EngineError::Aborted(RequestId::new("r")), 500),
            (EngineError::Internal("boom".into()), 500),
        ];

        for (err, expected) in cases {
            assert_eq!(err.suggested_status_code(), expected);
            assert_eq!(HttpError::from(err).status().as_u16(), expected);
        }
    }

    #[test]
    fn test_validation_error_is_bad_request() {
        let err = HttpError::from(ChatError::Validation(ValidationError::MaxTokens));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "max_tokens must be at least 1");
    }
}
