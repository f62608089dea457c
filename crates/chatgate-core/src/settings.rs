//! Server settings and validation.
//!
//! Pure data with defaults; the CLI fills it from flags and environment.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::RequestIdStrategy;

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port for the HTTP server.
pub const DEFAULT_PORT: u16 = 8080;

/// Settings validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("invalid allowed origin: {0}")]
    InvalidOrigin(String),
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address to bind.
    pub host: String,
    /// Port to listen on (0 picks a free port).
    pub port: u16,
    /// How per-request engine ids are minted.
    pub request_ids: RequestIdStrategy,
    /// Browser origins allowed by CORS; empty allows any.
    pub allowed_origins: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            request_ids: RequestIdStrategy::default(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Settings {
    /// `host:port` string suitable for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.host.trim().is_empty() {
            return Err(SettingsError::EmptyHost);
        }
        if let Some(bad) = self
            .allowed_origins
            .iter()
            .find(|o| !(o.starts_with("http://") || o.starts_with("https://")))
        {
            return Err(SettingsError::InvalidOrigin(bad.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr(), "0.0.0.0:8080");
        assert_eq!(settings.request_ids, RequestIdStrategy::Uuid);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"port": 9000, "request_ids": "timestamp-addr"}"#).unwrap();
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.request_ids, RequestIdStrategy::TimestampAddr);
    }

    #[test]
    fn test_validate_origins() {
        let settings = Settings {
            allowed_origins: vec!["https://ui.example".to_string(), "ui.example".to_string()],
            ..Settings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::InvalidOrigin("ui.example".to_string()))
        );
    }
}
