// src/commands/compile.rs

use std::path::Path;
use std::process::ExitCode;

use super::common::{load_and_generate, native_platform, Failure};
use crate::errors::Sourced;

/// Compile a Spinel source file to an executable
pub fn compile_file(input: &Path, output: &Path) -> ExitCode {
    match execute(input, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            failure.report();
            ExitCode::FAILURE
        }
    }
}

fn execute(input: &Path, output: &Path) -> Result<(), Failure> {
    let platform = native_platform()?;
    let generated = load_and_generate(input, platform)?;
    platform
        .compile(&generated.program, output)
        .map_err(|error| {
            Failure::Compile(Sourced::new(input.to_string_lossy(), "", error))
        })
}
