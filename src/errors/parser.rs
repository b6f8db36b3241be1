// src/errors/parser.rs
//! Parser errors (E1xxx).

#![allow(unused_assignments)] // False positives from thiserror derive

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParserError {
    #[error("expected '{expected}' but found '{found}'")]
    #[diagnostic(code(E1001))]
    ExpectedToken {
        expected: String,
        found: String,
        #[label("unexpected token")]
        span: SourceSpan,
    },

    #[error("expected an expression")]
    #[diagnostic(code(E1002))]
    ExpectedExpression {
        #[label("not an expression")]
        span: SourceSpan,
    },

    #[error("duplicate property name '{name}'")]
    #[diagnostic(code(E1003))]
    DuplicateProperty {
        name: String,
        #[label("already defined in this object")]
        span: SourceSpan,
    },

    #[error("import statements may only appear as the first statements of a module")]
    #[diagnostic(
        code(E1004),
        help("move the import above the first declaration or statement")
    )]
    ImportNotAtModuleHead {
        #[label("import after other statements")]
        span: SourceSpan,
    },

    #[error("exports may only be declared at the module scope")]
    #[diagnostic(code(E1005))]
    ExportOutsideModule {
        #[label("export inside a block")]
        span: SourceSpan,
    },

    #[error("invalid object for export")]
    #[diagnostic(
        code(E1006),
        help("only function and type declarations can be exported")
    )]
    InvalidExport {
        #[label("cannot be exported")]
        span: SourceSpan,
    },

    #[error("invalid number literal")]
    #[diagnostic(code(E1007))]
    InvalidNumber {
        #[label("invalid number")]
        span: SourceSpan,
    },
}
