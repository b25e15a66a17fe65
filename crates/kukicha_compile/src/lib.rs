//! # kukicha-compile
//!
//! The back half of the kukicha compiler: semantic analysis and Go code
//! generation over the AST built by `kukicha-language`.
//!
//! ```text
//! Program ──▶ Analyzer ──▶ side tables ──▶ Generator ──▶ Go source
//!                │                                │
//!                └── errors / warnings ───────────┴── diagnostics
//! ```
//!
//! ## Modules
//!
//! - [`compile`]: the pure `compile(source, filename)` pipeline entry
//! - [`analysis`]: symbol tables, type inference, onerr validation,
//!   security lints, and the stdlib return-count registry
//! - [`codegen`]: deterministic Go emission with auto-imports, generic
//!   placeholder substitution and onerr/pipe/interpolation desugaring
//! - [`diagnostic`]: the `<file>:<line>:<col>` diagnostic model
//!
//! ## Example
//!
//! ```
//! use kukicha_compile::compile;
//!
//! let out = compile("func main()\n    print(\"Hello\")\n", "hello.kuki");
//! let code = out.code.expect("clean compile");
//! assert!(code.contains("fmt.Println(\"Hello\")"));
//! ```

pub mod analysis;
pub mod codegen;
pub mod compile;
pub mod diagnostic;

pub use compile::{compile, compile_with_options, CompileOptions, CompileOutput};
pub use diagnostic::{Diagnostic, Severity};
