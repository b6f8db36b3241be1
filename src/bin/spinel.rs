// src/bin/spinel.rs

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use spinel::cli::{Cli, Commands};
use spinel::commands::check::check_file;
use spinel::commands::compile::compile_file;
use spinel::commands::inspect::inspect_file;

fn main() -> ExitCode {
    // Tracing stays silent unless SPINEL_LOG asks for it
    if let Ok(filter) = EnvFilter::try_from_env("SPINEL_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Compile { input, output } => compile_file(&input, &output),
        Commands::Check { input } => check_file(&input),
        Commands::Inspect { input } => inspect_file(&input),
    }
}
