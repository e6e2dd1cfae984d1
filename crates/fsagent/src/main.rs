//! fsagent - an LLM coding agent confined to one directory

use std::io::IsTerminal;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{chat_command, ChatArgs};

/// fsagent - read, list and edit files with an LLM
#[derive(Parser)]
#[command(name = "fsagent")]
#[command(about = "◆ An LLM coding agent sandboxed to one directory")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(flatten)]
    chat: ChatArgs,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    if let Err(e) = chat_command(cli.chat).await {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
