// src/commands/check.rs

use std::path::Path;
use std::process::ExitCode;

use super::common::{load_and_generate, native_platform, Failure};
use crate::errors::render_to_stderr;

/// Check a Spinel source file (parse + generate, no executable)
pub fn check_file(path: &Path) -> ExitCode {
    let platform = match native_platform() {
        Ok(platform) => platform,
        Err(failure) => {
            failure.report();
            return ExitCode::FAILURE;
        }
    };
    match load_and_generate(path, platform) {
        Ok(_) => ExitCode::SUCCESS,
        Err(failure) => {
            failure.report();
            // check is the diagnostic surface, so also render the full
            // report with labels and help
            if let Failure::Compile(sourced) = &failure {
                render_to_stderr(sourced.report.as_ref());
            }
            ExitCode::FAILURE
        }
    }
}
