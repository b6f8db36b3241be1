// src/codegen/mod.rs
//! Native code generation.
//!
//! A [`Platform`] turns the generator's instruction stream into an
//! executable for one (os, arch) pair. The only implementation today
//! is Linux x86-64; the trait exists so the generator can ask the
//! target about syscall signatures without knowing which target it is.

pub mod asm;
pub mod link;
pub mod stack;
pub mod x86_64;

use std::path::Path;

use crate::errors::CodegenError;
use crate::ir::Program;
use crate::sema::type_arena::{TypeArena, TypeId, TypeIdVec};

/// One compilation target.
pub trait Platform {
    /// Input and output types of system call `number`, or `None` when
    /// the target has no signature for it.
    fn syscall_signature(
        &self,
        number: u64,
        arena: &mut TypeArena,
    ) -> Option<(TypeIdVec, TypeId)>;

    /// Lower the program to assembly, assemble, and link an executable
    /// at `output`.
    fn compile(&self, program: &Program, output: &Path) -> Result<(), CodegenError>;
}

/// The platform matching the machine the compiler is running on.
pub fn native() -> Option<&'static dyn Platform> {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("linux", "x86_64") => Some(&x86_64::LinuxX86_64),
        _ => None,
    }
}
