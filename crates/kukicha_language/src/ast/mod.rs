//! The kukicha AST.
//!
//! Four disjoint node families mirror the shape of the language:
//! declarations ([`Decl`]), statements ([`Stmt`]), expressions ([`Expr`])
//! and type annotations ([`TypeAnn`]). Nodes are arena-allocated and wired
//! together with `&'a` references; the tree is immutable once the parser
//! returns it. Call-like expressions carry an [`ExprId`] so the analyzer
//! can annotate them through side tables without touching the tree.

pub mod decl;
pub mod expr;
pub mod stmt;
pub mod types;

pub use decl::{
    Decl, Field, FunctionDecl, ImportDecl, InterfaceDecl, MethodSig, PackageDecl, Param, Program,
    Receiver, SkillDecl, SkillOption, TypeDeclKind,
};
pub use expr::{Arg, BinaryOp, Expr, ExprId, LambdaBody, UnaryOp};
pub use stmt::{
    Block, OnErr, OnErrHandler, SelectCase, SelectOp, Stmt, SwitchCase, TypeSwitchCase,
};
pub use types::{PrimitiveKind, TypeAnn};
