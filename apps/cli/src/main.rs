//! Blackstar CLI — command-line access to a Blackstar content server.
//!
//! Fetches chunks by id, name, or tag and creates, updates, or deletes
//! them through the content API.

mod commands;

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
