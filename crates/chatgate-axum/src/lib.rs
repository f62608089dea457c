//! Axum adapter exposing the chat service over HTTP.
//!
//! Routes:
//! - `POST /chat`: JSON response, or a chunked `text/plain` delta stream
//!   when the request sets `"stream": true`
//! - `GET /health`: adapter liveness and engine reachability
//!
//! The engine is injected through [`AxumContext`]; nothing here knows how
//! it is hosted.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod stream;

// Re-export primary types
pub use bootstrap::{AxumContext, CorsConfig, ServerConfig, serve, start_server};
pub use error::HttpError;
pub use extract::ClientAddr;
pub use routes::create_router;
pub use state::AppState;
