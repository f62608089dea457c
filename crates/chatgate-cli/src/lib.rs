//! Command-line front end for chatgate.
//!
//! `main.rs` is the composition root; this library holds the argument
//! definitions and command handlers so they can be unit tested.

#![deny(unsafe_code)]

pub mod commands;
pub mod engine_flags;
pub mod handlers;
pub mod logging;
pub mod parser;

// Re-export primary types for convenient access
pub use commands::{AskArgs, Commands, ServeArgs};
pub use engine_flags::{EngineFlags, LaunchFlags};
pub use parser::Cli;
