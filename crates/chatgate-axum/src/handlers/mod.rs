//! HTTP request handlers.
//!
//! Handlers are thin wrappers that delegate to `ChatService`.

pub mod chat;
pub mod health;
