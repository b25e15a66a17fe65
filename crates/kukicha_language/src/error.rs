//! Lexer and parser error types.
//!
//! Both front-end stages report through [`ParseError`]: a closed
//! [`ParseErrorKind`] plus the span of the offending source. Errors are
//! collected, never thrown; lexing and parsing always run to the end of the
//! input. [`ParseError::display_with_source`] renders the rustc-style
//! source excerpt with a caret underline and a did-you-mean hint.

use std::fmt;

use kukicha_base::Span;

use crate::style::Style;
use crate::suggest::{find_similar, KEYWORDS};
use crate::token::TokenKind;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Renders the error with its source line, caret underline and an
    /// optional spelling suggestion.
    pub fn display_with_source(&self, source: &str) -> String {
        let (line_num, line_start, line_content) = self.line_context(source);
        let col = self.span.start.saturating_sub(line_start);
        let width = self.span.len().max(1);
        let underline = format!("{}{}", " ".repeat(col), "^".repeat(width));

        let mut out = format!(
            "{}: {}\n\n{} {} {}\n     {} {}",
            Style::bold_red("error"),
            self.kind,
            Style::blue(&format!("{:4}", line_num)),
            Style::blue("|"),
            line_content,
            Style::blue("|"),
            Style::red(&underline),
        );

        if let Some(word) = self.spanned_word(source) {
            if let Some(suggestion) = find_similar(word, KEYWORDS, 2) {
                out.push_str(&format!(
                    "\n     {} {}: did you mean '{}'?",
                    Style::blue("|"),
                    Style::cyan("help"),
                    Style::green(suggestion),
                ));
            }
        }

        out
    }

    fn spanned_word<'s>(&self, source: &'s str) -> Option<&'s str> {
        if self.span.end <= source.len() && self.span.start < self.span.end {
            let word = &source[self.span.start..self.span.end];
            if !word.is_empty() && word.chars().all(|c| c.is_alphabetic()) {
                return Some(word);
            }
        }
        None
    }

    fn line_context<'s>(&self, source: &'s str) -> (usize, usize, &'s str) {
        let mut line_num = 1;
        let mut line_start = 0;
        for (i, c) in source.char_indices() {
            if i >= self.span.start {
                break;
            }
            if c == '\n' {
                line_num += 1;
                line_start = i + 1;
            }
        }
        let line_end = source[line_start..]
            .find('\n')
            .map(|off| line_start + off)
            .unwrap_or(source.len());
        (line_num, line_start, &source[line_start..line_end])
    }
}

#[derive(Debug, Clone)]
pub enum ParseErrorKind {
    // Lexer
    TabIndentation,
    IndentNotMultipleOfFour { width: usize },
    IndentTooDeep { from: usize, to: usize },
    InconsistentDedent { width: usize },
    UnterminatedString,
    UnterminatedRawString,
    UnterminatedRune,
    InvalidEscape { sequence: String },
    InvalidNumber { text: String },
    UnexpectedChar { ch: char },
    EmptyInterpolation,

    // Parser
    UnexpectedToken { expected: String, found: TokenKind },
    ExpectedDeclaration { found: TokenKind },
    ExpectedStatement { found: TokenKind },
    ExpectedExpression { found: TokenKind },
    ExpectedIdentifier { found: TokenKind },
    ExpectedTypeAnnotation { found: TokenKind },
    MissingParamType { name: String },
    MixedNamedPositional,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TabIndentation => {
                write!(f, "indentation uses a tab; kukicha indents with 4 spaces per level")
            }
            Self::IndentNotMultipleOfFour { width } => {
                write!(f, "indentation of {} spaces is not a multiple of 4", width)
            }
            Self::IndentTooDeep { from, to } => write!(
                f,
                "indentation jumps from {} to {} spaces; blocks indent by exactly 4",
                from, to
            ),
            Self::InconsistentDedent { width } => write!(
                f,
                "indentation of {} spaces does not match any enclosing block",
                width
            ),
            Self::UnterminatedString => write!(f, "string literal is missing its closing quote"),
            Self::UnterminatedRawString => {
                write!(f, "raw string literal is missing its closing backtick")
            }
            Self::UnterminatedRune => write!(f, "rune literal is missing its closing quote"),
            Self::InvalidEscape { sequence } => {
                write!(f, "invalid escape sequence '\\{}' in string literal", sequence)
            }
            Self::InvalidNumber { text } => write!(f, "invalid numeric literal '{}'", text),
            Self::UnexpectedChar { ch } => write!(f, "unexpected character '{}'", ch),
            Self::EmptyInterpolation => {
                write!(f, "empty interpolation hole '{{}}' in string literal")
            }
            Self::UnexpectedToken { expected, found } => {
                write!(f, "expected {}, found {}", expected, found.describe())
            }
            Self::ExpectedDeclaration { found } => write!(
                f,
                "expected a declaration (petiole, import, type, interface, func, var or skill), found {}",
                found.describe()
            ),
            Self::ExpectedStatement { found } => {
                write!(f, "expected a statement, found {}", found.describe())
            }
            Self::ExpectedExpression { found } => {
                write!(f, "expected an expression, found {}", found.describe())
            }
            Self::ExpectedIdentifier { found } => {
                write!(f, "expected an identifier, found {}", found.describe())
            }
            Self::ExpectedTypeAnnotation { found } => {
                write!(f, "expected a type annotation, found {}", found.describe())
            }
            Self::MissingParamType { name } => {
                write!(f, "parameter '{}' is missing a type annotation", name)
            }
            Self::MixedNamedPositional => {
                write!(f, "positional argument may not follow a named argument")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_token_names_both_sides() {
        let kind = ParseErrorKind::UnexpectedToken {
            expected: "'('".to_string(),
            found: TokenKind::Newline,
        };
        let message = kind.to_string();
        assert!(message.contains("'('"));
        assert!(message.contains("end of line"));
    }

    #[test]
    fn display_with_source_underlines_the_span() {
        let error = ParseError::new(
            ParseErrorKind::ExpectedExpression { found: TokenKind::Newline },
            Span::new(5, 9),
        );
        let rendered = error.display_with_source("x := wild\n");
        assert!(rendered.contains("wild"));
        assert!(rendered.contains("^^^^"));
    }

    #[test]
    fn display_with_source_suggests_keyword_fix() {
        let error = ParseError::new(
            ParseErrorKind::ExpectedStatement { found: TokenKind::Ident },
            Span::new(0, 6),
        );
        let rendered = error.display_with_source("retrun 5\n");
        assert!(rendered.contains("did you mean"));
        assert!(rendered.contains("return"));
    }

    #[test]
    fn indent_errors_mention_the_width() {
        let kind = ParseErrorKind::IndentNotMultipleOfFour { width: 3 };
        assert!(kind.to_string().contains('3'));
    }
}
