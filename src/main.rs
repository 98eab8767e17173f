mod auth;
mod cli;
mod client;
mod commands;
mod config;
mod error;
mod output;
mod queue;
mod resolve;
mod tail;
mod types;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.execute().await
}
