//! Flowsmith CLI: prompt-to-element generation and the OAuth exchange service.
//!
//! Runs the HTTP API, or performs a single generation or token exchange
//! from the terminal.

mod commands;
mod host;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
