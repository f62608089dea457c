//! Application services.

pub mod abort;
pub mod chat;
pub mod delta;

pub use abort::AbortOnDrop;
pub use chat::{ChatError, ChatService, DeltaStream};
pub use delta::DeltaTracker;
