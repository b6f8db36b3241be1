// src/cli/args.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Spinel programming language compiler
#[derive(Parser)]
#[command(name = "spinel")]
#[command(version = "0.1.0")]
#[command(about = "Spinel programming language compiler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a Spinel source file to an executable
    Compile {
        /// Path to the root .spn file
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        /// Path the executable is written to
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
    /// Check a Spinel source file without producing an executable
    Check {
        /// Path to the root .spn file
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
    /// Print the instruction listing generated for a source file
    Inspect {
        /// Path to the root .spn file
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}
