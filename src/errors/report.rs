// src/errors/report.rs
//! Graphical rendering of diagnostics.
//!
//! Two renderings exist: the colored unicode report the `check`
//! command prints, and a plain ascii one whose output is stable enough
//! to assert against in tests.

use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, ThemeCharacters, ThemeStyles};

/// Render to stderr with unicode and ANSI colors.
pub fn render_to_stderr(report: &dyn Diagnostic) {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme {
        characters: ThemeCharacters::unicode(),
        styles: ThemeStyles::ansi(),
    });
    let mut output = String::new();
    if handler.render_report(&mut output, report).is_ok() {
        eprint!("{output}");
    }
}

/// Render to a plain ascii string with no color codes.
pub fn render_to_string(report: &dyn Diagnostic) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme {
        characters: ThemeCharacters::ascii(),
        styles: ThemeStyles::none(),
    });
    let mut output = String::new();
    let _ = handler.render_report(&mut output, report);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{LexerError, SemanticError};
    use miette::NamedSource;

    #[test]
    fn render_lexer_error_to_string() {
        let err = LexerError::UnexpectedCharacter {
            ch: '!',
            span: (8, 1).into(),
        };
        let report = miette::Report::new(err)
            .with_source_code(NamedSource::new("bad.spn", "let a = !b;".to_string()));

        let output = render_to_string(report.as_ref());
        assert!(output.contains("E0001"), "should contain error code");
        assert!(
            output.contains("unexpected character"),
            "should contain message"
        );
        assert!(output.contains('!'), "should contain the character");
    }

    #[test]
    fn render_with_help() {
        let err = SemanticError::AmbiguousLiteral {
            literal: "integer",
            span: (0, 1).into(),
        };
        let report = miette::Report::new(err)
            .with_source_code(NamedSource::new("bare.spn", "5;".to_string()));

        let output = render_to_string(report.as_ref());
        assert!(output.contains("E2005"), "should contain error code");
        assert!(output.contains("help"), "should contain help text");
    }
}
