//! pombump: patch dependency and property versions in Maven POM files.

mod analyze;
mod bump;
mod cli;
mod inputs;

use clap::Parser;
use cli::{Cli, Command};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("caused by: {cause}");
        }
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Bump(args) => bump::run(args),
        Command::Analyze(args) => analyze::run(args),
    }
}
