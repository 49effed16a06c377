//! jobwatch CLI: scrape a job board, normalize salaries, keep a local copy.
//!
//! Runs the scrape pipeline once, serves it over HTTP, or inspects the
//! stored postings.

mod commands;
mod server;

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
