//! Main commands enum and subcommand arguments.

use chatgate_core::{DEFAULT_HOST, DEFAULT_MAX_TOKENS, DEFAULT_PORT, DEFAULT_TEMPERATURE, RequestIdStrategy};
use clap::{Args, Subcommand};

use crate::engine_flags::{EngineFlags, LaunchFlags};

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server (launching the engine unless --engine-url is given)
    Serve(ServeArgs),

    /// Send a message to a running server and print the reply
    Ask(AskArgs),

    /// Print the engine command line `serve` would launch
    EngineArgs {
        #[command(flatten)]
        engine: EngineFlags,
        #[command(flatten)]
        launch: LaunchFlags,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Interface to bind
    #[arg(long, env = "CHATGATE_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "CHATGATE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// How per-request engine ids are minted (uuid, timestamp-addr)
    #[arg(long, env = "CHATGATE_REQUEST_IDS", default_value = "uuid")]
    pub request_ids: RequestIdStrategy,

    /// Browser origins allowed by CORS (comma separated; empty allows any)
    #[arg(long, env = "CHATGATE_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Use an already running OpenAI-compatible engine instead of launching one
    #[arg(long, env = "CHATGATE_ENGINE_URL")]
    pub engine_url: Option<String>,

    #[command(flatten)]
    pub engine: EngineFlags,

    #[command(flatten)]
    pub launch: LaunchFlags,
}

#[derive(Debug, Clone, Args)]
pub struct AskArgs {
    /// Message to send (words are joined with spaces)
    #[arg(required = true, num_args = 1..)]
    pub message: Vec<String>,

    /// Server root URL
    #[arg(long, env = "CHATGATE_URL", default_value = "http://127.0.0.1:8080")]
    pub url: String,

    /// Print the reply as it is generated
    #[arg(long, conflicts_with = "no_stream")]
    pub stream: bool,

    /// Wait for the full reply and print the JSON response (default)
    #[arg(long)]
    pub no_stream: bool,

    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,
}

impl AskArgs {
    pub fn prompt(&self) -> String {
        self.message.join(" ")
    }
}
