//! # kukicha-base
//!
//! Structural atoms shared by every stage of the kukicha compiler:
//!
//! - [`Span`] — byte-offset source ranges carried by tokens, AST nodes and
//!   diagnostics
//! - [`Interner`]/[`Symbol`] — string interning so identifier comparison is
//!   an integer compare
//! - [`Arena`] — bump allocation backing the arena-lifetimed AST
//!
//! This crate knows nothing about kukicha syntax or Go output. It is pure
//! infrastructure the language and compile crates build on.

pub mod arena;
pub mod intern;
pub mod span;

pub use arena::Arena;
pub use intern::{Interner, Symbol, SymbolEq};
pub use span::Span;
