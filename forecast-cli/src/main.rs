//! Binary crate for the `forecast` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Answering the location permission question in the terminal
//! - Painting the forecast screen

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod configure;
mod locator;
mod logging;
mod show;
mod terminal;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cmd = cli::Cli::parse();
    logging::init_logging(cmd.verbose);
    cmd.run().await
}
