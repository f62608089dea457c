//! Engine-args command handler.

use anyhow::Result;

use crate::engine_flags::{EngineFlags, LaunchFlags};

/// The command line `serve` would run, as one shell-style string.
pub fn render(engine: &EngineFlags, launch: &LaunchFlags) -> Result<String> {
    let spec = launch.to_launch_spec(engine.to_config()?);
    Ok(spec.command().display())
}

pub fn execute(engine: &EngineFlags, launch: &LaunchFlags) -> Result<()> {
    println!("{}", render(engine, launch)?);
    Ok(())
}
