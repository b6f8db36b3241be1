// src/errors/loader.rs
//! Module loading errors (E4xxx).

#![allow(unused_assignments)] // False positives from thiserror derive

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum LoaderError {
    #[error("no such file {path}")]
    #[diagnostic(code(E4001))]
    ModuleNotFound {
        path: String,
        #[label("imported here")]
        span: SourceSpan,
    },

    #[error("unsupported import path '{path}'")]
    #[diagnostic(
        code(E4002),
        help("import paths are relative and start with './'")
    )]
    UnsupportedImportPath {
        path: String,
        #[label("imported here")]
        span: SourceSpan,
    },

    #[error("failed to read {path}: {message}")]
    #[diagnostic(code(E4003))]
    Read {
        path: String,
        message: String,
        #[label("imported here")]
        span: SourceSpan,
    },
}
