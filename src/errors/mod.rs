// src/errors/mod.rs
//! Structured error reporting for the Spinel compiler.
//!
//! Each compilation phase has its own error enum with miette-backed
//! diagnostics. Errors that point into source are wrapped in
//! [`Sourced`] by whichever pass knows the offending module, so
//! multi-module failures always render against the right file.

pub mod codegen;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod report;
pub mod sema;

pub use codegen::CodegenError;
pub use lexer::LexerError;
pub use loader::LoaderError;
pub use parser::ParserError;
pub use report::{render_to_stderr, render_to_string};
pub use sema::SemanticError;

use miette::{Diagnostic, NamedSource};

/// A diagnostic bound to the module it was raised in.
#[derive(Debug)]
pub struct Sourced {
    pub path: String,
    pub source: String,
    pub report: miette::Report,
}

impl Sourced {
    pub fn new(
        path: impl Into<String>,
        source: impl Into<String>,
        error: impl Diagnostic + Send + Sync + 'static,
    ) -> Self {
        let path = path.into();
        let source = source.into();
        let report = miette::Report::new(error)
            .with_source_code(NamedSource::new(path.clone(), source.clone()));
        Self {
            path,
            source,
            report,
        }
    }

    /// Byte offset of the first label, if the diagnostic has one
    fn offset(&self) -> Option<usize> {
        let mut labels = self.report.labels()?;
        labels.next().map(|label| label.offset())
    }

    /// 1-based line and column of the first label
    pub fn location(&self) -> Option<(u32, u32)> {
        self.offset()
            .map(|offset| crate::util::line_col(&self.source, offset))
    }

    /// The stable one-line rendering: `path:row:col: message`
    pub fn line(&self) -> String {
        match self.location() {
            Some((row, column)) => format!("{}:{}:{}: {}", self.path, row, column, self.report),
            None => format!("{}: {}", self.path, self.report),
        }
    }
}

impl std::fmt::Display for Sourced {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.line())
    }
}
