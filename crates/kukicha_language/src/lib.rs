//! # kukicha-language
//!
//! The front half of the kukicha compiler.
//!
//! ```text
//! Kukicha Source
//!      │
//!      ▼
//! ┌─────────┐     ┌───────────┐     ┌──────────┐
//! │  Lexer  │ ──▶ │  Parser   │ ──▶ │ Program  │
//! └─────────┘     └───────────┘     └──────────┘
//!   INDENT/DEDENT   error-tolerant    arena AST
//!   interpolation   recursive descent
//! ```
//!
//! The [`Lexer`] turns a UTF-8 buffer into tokens, synthesizing
//! INDENT/DEDENT from layout and splitting interpolated strings. The
//! [`Parser`] builds an arena-allocated [`ast::Program`] and collects —
//! never throws — [`ParseError`]s. Semantic analysis and Go code
//! generation live in the `kukicha-compile` crate.

pub mod arena_ctx;
pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod style;
pub mod suggest;
pub mod token;

pub use arena_ctx::AstContext;
pub use error::{ParseError, ParseErrorKind};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{StrPart, Token, TokenKind};
