//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// HTTP chat adapter in front of an LLM inference engine.
#[derive(Debug, Parser)]
#[command(name = "chatgate")]
#[command(about = "Serve a /chat endpoint backed by an LLM inference engine")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_verbose_after_subcommand() {
        let cli = Cli::parse_from(["chatgate", "engine-args", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::EngineArgs { .. }));
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["chatgate"]).is_err());
    }
}
