//! CLI entry point - the composition root.

use clap::Parser;

use chatgate_cli::{Cli, Commands, handlers, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before parsing so it can supply CHATGATE_* defaults
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Serve(args) => handlers::serve::execute(args).await,
        Commands::Ask(args) => handlers::ask::execute(&args).await,
        Commands::EngineArgs { engine, launch } => handlers::engine_args::execute(&engine, &launch),
    }
}
