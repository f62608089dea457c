//! Shared helpers for router tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use chatgate_axum::{AxumContext, CorsConfig, create_router};
use chatgate_core::RequestIdStrategy;
use chatgate_core::testing::ScriptedEngine;

/// Cumulative snapshots of a reply to "Hi".
pub const HELLO_STEPS: [&str; 4] = ["He", "Hell", "Hello", "Hello!"];

pub fn router_with(engine: Arc<ScriptedEngine>) -> Router {
    let ctx = AxumContext::new(engine, RequestIdStrategy::Uuid);
    create_router(ctx, &CorsConfig::AllowAll)
}

pub fn hello_engine() -> Arc<ScriptedEngine> {
    Arc::new(ScriptedEngine::new(HELLO_STEPS))
}

pub fn post_chat(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
