//! The compilation pipeline.
//!
//! ```text
//! Kukicha Source
//!       │
//!       ▼
//! ┌───────────────┐
//! │  1. Lexer     │ tokens + lex errors
//! └───────┬───────┘
//!         ▼
//! ┌───────────────┐
//! │  2. Parser    │ arena AST + parse errors
//! └───────┬───────┘
//!         ▼
//! ┌───────────────┐
//! │  3. Analyzer  │ errors, warnings, return-count table
//! └───────┬───────┘
//!         ▼
//! ┌───────────────┐
//! │  4. CodeGen   │ Go source (skipped on any error)
//! └───────────────┘
//! ```
//!
//! [`compile`] is pure: no I/O, no global state, deterministic output.
//! The CLI driver wires it to files and exit codes (0 clean, 1 on any
//! error diagnostic); warnings never fail a build.

use kukicha_base::{Arena, Interner};
use kukicha_language::arena_ctx::AstContext;
use kukicha_language::{Lexer, Parser};

use crate::analysis::analyze;
use crate::codegen::{generate, GenOptions};
use crate::diagnostic::{sort_diagnostics, Diagnostic};

/// Knobs the driver may turn; the defaults match `kukicha build`.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Emit `// line` markers for source mapping.
    pub line_directives: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions { line_directives: true }
    }
}

/// Result of one compilation: generated Go text (absent when any error
/// diagnostic was produced) and all diagnostics in source order.
#[derive(Debug)]
pub struct CompileOutput {
    pub code: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    /// Renders every diagnostic in the `<file>:<line>:<col>` format.
    pub fn render_diagnostics(&self, filename: &str, source: &str) -> Vec<String> {
        self.diagnostics
            .iter()
            .map(|d| d.render(filename, source))
            .collect()
    }
}

/// Compiles one kukicha source buffer to Go.
pub fn compile(source: &str, filename: &str) -> CompileOutput {
    compile_with_options(source, filename, CompileOptions::default())
}

pub fn compile_with_options(
    source: &str,
    filename: &str,
    options: CompileOptions,
) -> CompileOutput {
    let mut interner = Interner::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    let (tokens, lex_errors) = Lexer::new(source, &mut interner).tokenize();
    diagnostics.extend(lex_errors.into_iter().map(Diagnostic::from));

    let exprs = Arena::new();
    let stmts = Arena::new();
    let types = Arena::new();
    let ctx = AstContext::new(&exprs, &stmts, &types);
    let (program, parse_errors) = Parser::new(tokens, &mut interner, ctx).parse_program();
    diagnostics.extend(parse_errors.into_iter().map(Diagnostic::from));

    let analysis = analyze(&program, &interner, filename);
    diagnostics.extend(analysis.errors);
    diagnostics.extend(analysis.warnings);

    let code = if diagnostics.iter().any(|d| d.is_error()) {
        None
    } else {
        let gen_options = GenOptions {
            filename: filename.to_string(),
            line_directives: options.line_directives,
            is_stdlib: filename.starts_with("stdlib/") || filename.contains("/stdlib/"),
        };
        match generate(
            &program,
            &mut interner,
            source,
            &analysis.expr_return_counts,
            gen_options,
        ) {
            Ok(code) => Some(code),
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("code generation error: {}", e.message),
                    e.span,
                ));
                None
            }
        }
    };

    sort_diagnostics(&mut diagnostics);
    CompileOutput { code, diagnostics }
}
