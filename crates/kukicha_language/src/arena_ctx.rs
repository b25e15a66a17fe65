//! Arena bundle for AST allocation.
//!
//! The parser allocates every node through an [`AstContext`], a `Copy`
//! bundle of references to typed arenas owned by the caller. Owning the
//! arenas outside the parser keeps the `'a` node lifetime independent of
//! the parser's own borrow, so the tree outlives parsing — the analyzer's
//! side tables and the code generator both read it afterwards.

use kukicha_base::Arena;

use crate::ast::{Expr, Stmt, TypeAnn};

/// References to the three node arenas a compilation owns.
#[derive(Clone, Copy)]
pub struct AstContext<'a> {
    pub exprs: &'a Arena<Expr<'a>>,
    pub stmts: &'a Arena<Stmt<'a>>,
    pub types: &'a Arena<TypeAnn<'a>>,
}

impl<'a> AstContext<'a> {
    pub fn new(
        exprs: &'a Arena<Expr<'a>>,
        stmts: &'a Arena<Stmt<'a>>,
        types: &'a Arena<TypeAnn<'a>>,
    ) -> Self {
        AstContext { exprs, stmts, types }
    }

    pub fn alloc_expr(&self, expr: Expr<'a>) -> &'a Expr<'a> {
        self.exprs.alloc(expr)
    }

    pub fn alloc_stmt(&self, stmt: Stmt<'a>) -> &'a Stmt<'a> {
        self.stmts.alloc(stmt)
    }

    pub fn alloc_type(&self, ty: TypeAnn<'a>) -> &'a TypeAnn<'a> {
        self.types.alloc(ty)
    }

    /// Freezes a collected statement vector into a block slice.
    pub fn alloc_block(&self, stmts: Vec<Stmt<'a>>) -> &'a [Stmt<'a>] {
        self.stmts.alloc_slice(stmts)
    }
}
