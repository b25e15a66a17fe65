//! Compiler diagnostics.
//!
//! Every stage funnels its findings into [`Diagnostic`]s: lexer and parser
//! errors are converted on entry to the pipeline, the analyzer emits its
//! own errors and warnings, and code generation reports internal
//! inconsistencies. Rendering follows the fixed format
//!
//! ```text
//! <file>:<line>:<column>: <message>
//! <file>:<line>:<column>: warning: <message>
//! ```
//!
//! with 1-based line and column derived from the span against the source
//! buffer. Errors abort the pipeline after analysis; warnings never block
//! code generation.

use kukicha_base::Span;
use kukicha_language::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Diagnostic { severity: Severity::Error, message: message.into(), span }
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Diagnostic { severity: Severity::Warning, message: message.into(), span }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// `<file>:<line>:<col>: [warning: ]<message>`.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let (line, col) = self.span.line_col(source);
        match self.severity {
            Severity::Error => format!("{}:{}:{}: {}", filename, line, col, self.message),
            Severity::Warning => {
                format!("{}:{}:{}: warning: {}", filename, line, col, self.message)
            }
        }
    }
}

impl From<ParseError> for Diagnostic {
    fn from(error: ParseError) -> Self {
        Diagnostic::error(error.kind.to_string(), error.span)
    }
}

/// Stable source-order sort: diagnostics at the same position keep their
/// insertion order, which matches traversal order within a stage.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by_key(|d| d.span.start);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_error_format() {
        let source = "func f()\n    boom\n";
        let diag = Diagnostic::error("undefined identifier 'boom'", Span::new(13, 17));
        assert_eq!(
            diag.render("main.kuki", source),
            "main.kuki:2:5: undefined identifier 'boom'"
        );
    }

    #[test]
    fn render_warning_has_prefix() {
        let source = "x := 1\n";
        let diag = Diagnostic::warning("something odd", Span::new(0, 1));
        assert_eq!(diag.render("a.kuki", source), "a.kuki:1:1: warning: something odd");
    }

    #[test]
    fn sort_is_stable_at_equal_positions() {
        let mut diags = vec![
            Diagnostic::error("b", Span::new(5, 6)),
            Diagnostic::error("first", Span::new(2, 3)),
            Diagnostic::warning("second", Span::new(2, 3)),
        ];
        sort_diagnostics(&mut diags);
        assert_eq!(diags[0].message, "first");
        assert_eq!(diags[1].message, "second");
        assert_eq!(diags[2].message, "b");
    }
}
