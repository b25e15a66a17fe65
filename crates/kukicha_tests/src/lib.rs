//! Shared helpers for the end-to-end suites under `tests/`.
//!
//! The suites compile kukicha source through the full pipeline and assert
//! on the generated Go and on diagnostics. Most use
//! [`compile_plain`], which turns off line directives so expected output
//! is easier to read in assertions.

use kukicha_compile::{compile_with_options, CompileOptions, CompileOutput};

/// Compiles with line directives off.
pub fn compile_plain(source: &str) -> CompileOutput {
    compile_with_options(
        source,
        "main.kuki",
        CompileOptions { line_directives: false },
    )
}

/// Compiles expecting a clean run and returns the generated Go.
pub fn go_for(source: &str) -> String {
    let out = compile_plain(source);
    assert!(
        !out.has_errors(),
        "expected a clean compile, got: {:?}",
        out.diagnostics
    );
    out.code.expect("code generated")
}

/// Compiles expecting at least one error; returns every diagnostic
/// message.
pub fn errors_for(source: &str) -> Vec<String> {
    let out = compile_plain(source);
    assert!(out.has_errors(), "expected errors, got none");
    assert!(out.code.is_none(), "errors must suppress code generation");
    out.diagnostics.iter().map(|d| d.message.clone()).collect()
}
