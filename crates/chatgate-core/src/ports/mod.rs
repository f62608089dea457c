//! Port definitions (trait abstractions) for external systems.
//!
//! The only external collaborator is the inference engine. Adapters
//! implement [`InferenceEngine`]; the HTTP layer receives it as an
//! injected `Arc<dyn InferenceEngine>`.

pub mod engine;

pub use engine::{EngineError, InferenceEngine, SnapshotStream};
