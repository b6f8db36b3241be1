// src/commands/inspect.rs

use std::path::Path;
use std::process::ExitCode;

use super::common::{load_and_generate, native_platform};

/// Print the instruction listing generated for a source file
pub fn inspect_file(path: &Path) -> ExitCode {
    let platform = match native_platform() {
        Ok(platform) => platform,
        Err(failure) => {
            failure.report();
            return ExitCode::FAILURE;
        }
    };
    match load_and_generate(path, platform) {
        Ok(generated) => {
            print!("{}", generated.program.listing(&generated.interner));
            ExitCode::SUCCESS
        }
        Err(failure) => {
            failure.report();
            ExitCode::FAILURE
        }
    }
}
