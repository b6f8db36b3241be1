// src/commands/common.rs
//! Shared plumbing for CLI commands.

use std::fs;
use std::path::Path;

use crate::codegen::{self, Platform};
use crate::errors::Sourced;
use crate::frontend::Interner;
use crate::ir::Program;
use crate::module::Project;
use crate::sema::generate;

/// A program lowered to instructions, with the interner its listing
/// resolves names against.
pub struct Generated {
    pub program: Program,
    pub interner: Interner,
}

/// Why a command could not produce its result.
pub enum Failure {
    /// The input could not be read, or the machine has no backend
    Input(String),
    /// A diagnostic raised somewhere in the pipeline
    Compile(Sourced),
}

impl Failure {
    /// Print the failure to stderr in the stable one-line form.
    pub fn report(&self) {
        match self {
            Failure::Input(message) => eprintln!("error: {message}"),
            Failure::Compile(sourced) => eprintln!("{}", sourced.line()),
        }
    }
}

/// The backend for the machine the compiler is running on.
pub fn native_platform() -> Result<&'static dyn Platform, Failure> {
    codegen::native().ok_or_else(|| {
        Failure::Input(format!(
            "no backend for {}/{}",
            std::env::consts::OS,
            std::env::consts::ARCH
        ))
    })
}

/// Run the front half of the pipeline: load the module graph rooted at
/// `path` and generate instructions for it.
pub fn load_and_generate(path: &Path, platform: &dyn Platform) -> Result<Generated, Failure> {
    let root = path.to_string_lossy().to_string();
    let source = fs::read_to_string(path).map_err(|error| {
        Failure::Input(format!("could not read '{}': {}", path.display(), error))
    })?;
    let mut project = Project::load(&root, source).map_err(Failure::Compile)?;
    let program = generate(&mut project, platform).map_err(Failure::Compile)?;
    Ok(Generated {
        program,
        interner: project.interner,
    })
}
