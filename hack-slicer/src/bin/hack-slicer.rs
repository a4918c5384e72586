//! CLI entry point for hack-slicer.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// hack-slicer — extract a standalone slice of a Hack project.
#[derive(Parser, Debug)]
#[command(name = "hack-slicer", version, about)]
struct Cli {
    /// Path to the JSON program description.
    program: PathBuf,

    /// Entry point: a fully qualified function name, or Class::method.
    entry: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hack_slicer=info")),
        )
        .init();

    let cli = Cli::parse();
    let output = hack_slicer::run(&cli.program, &cli.entry)?;
    println!("{output}");
    Ok(())
}
