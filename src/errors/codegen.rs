// src/errors/codegen.rs
//! Backend errors (E3xxx). These carry no source spans; anything the
//! backend rejects was already reduced to instructions.

#![allow(unused_assignments)] // False positives from thiserror derive

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CodegenError {
    #[error("unsupported lowering: {detail}")]
    #[diagnostic(code(E3001))]
    Unsupported { detail: String },

    #[error("{tool} not found")]
    #[diagnostic(
        code(E3002),
        help("the compiler drives external 'nasm' and 'ld'; both must be on PATH")
    )]
    ToolNotFound { tool: String },

    #[error("nasm failed ({status})")]
    #[diagnostic(code(E3003))]
    AssemblyFailed { status: String },

    #[error("ld failed ({status})")]
    #[diagnostic(code(E3004))]
    LinkFailed { status: String },

    #[error("{context}: {message}")]
    #[diagnostic(code(E3005))]
    Io { context: String, message: String },
}
