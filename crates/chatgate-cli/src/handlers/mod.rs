//! Command handlers.

pub mod ask;
pub mod engine_args;
pub mod serve;
