//! Statement nodes.

use kukicha_base::{Span, Symbol};

use super::expr::Expr;
use super::types::TypeAnn;

/// A statement block is an arena slice; blocks nest through their
/// statements, never through a separate node.
pub type Block<'a> = &'a [Stmt<'a>];

/// The handler attached to an `onerr` clause.
#[derive(Debug)]
pub enum OnErrHandler<'a> {
    /// `onerr return` (shorthand propagation when empty) or
    /// `onerr return a, b`.
    Return(Vec<&'a Expr<'a>>),
    /// `onerr panic EXPR`.
    Panic(&'a Expr<'a>),
    /// `onerr discard` — the error is deliberately ignored.
    Discard,
    /// `onerr error EXPR` — replace the error with a new message.
    ErrorValue(&'a Expr<'a>),
    /// `onerr EXPR` — a fallback value assigned in place of the result.
    Fallback(&'a Expr<'a>),
    /// An indented block with the caught error in scope.
    Block(Block<'a>),
}

/// An `onerr` clause attached to a var-decl, assignment or expression
/// statement.
#[derive(Debug)]
pub struct OnErr<'a> {
    pub handler: OnErrHandler<'a>,
    /// `onerr as NAME` rebinds the caught error; default binding is `error`.
    pub alias: Option<Symbol>,
    /// `explain STR` wraps the caught error with a hint message.
    pub explain: Option<&'a Expr<'a>>,
    pub span: Span,
}

/// One `when` branch of a value or condition switch. An empty `values`
/// list marks the `otherwise`/`default` branch.
#[derive(Debug)]
pub struct SwitchCase<'a> {
    pub values: Vec<&'a Expr<'a>>,
    pub body: Block<'a>,
    pub span: Span,
}

/// One `when TYPE` branch of a type switch; `ty` is `None` for the
/// `otherwise` branch.
#[derive(Debug)]
pub struct TypeSwitchCase<'a> {
    pub ty: Option<&'a TypeAnn<'a>>,
    pub body: Block<'a>,
    pub span: Span,
}

/// The communication half of a select case.
#[derive(Debug)]
pub enum SelectOp<'a> {
    /// `receive NAME from CH`.
    Receive { name: Symbol, chan: &'a Expr<'a> },
    /// `send VALUE to CH`.
    Send { value: &'a Expr<'a>, chan: &'a Expr<'a> },
}

/// One case of a `select`; `op` is `None` for the `otherwise` branch.
#[derive(Debug)]
pub struct SelectCase<'a> {
    pub op: Option<SelectOp<'a>>,
    pub body: Block<'a>,
    pub span: Span,
}

#[derive(Debug)]
pub enum Stmt<'a> {
    /// A bare nested block (rare; mostly produced by desugaring).
    Block {
        body: Block<'a>,
        span: Span,
    },
    /// `x := E`, `x, y := E`, or `var x TYPE [= E]`.
    VarDecl {
        names: Vec<Symbol>,
        ty: Option<&'a TypeAnn<'a>>,
        value: Option<&'a Expr<'a>>,
        onerr: Option<OnErr<'a>>,
        span: Span,
    },
    /// `target = E` or `a, b = E`.
    Assign {
        targets: Vec<&'a Expr<'a>>,
        value: &'a Expr<'a>,
        onerr: Option<OnErr<'a>>,
        span: Span,
    },
    Return {
        values: Vec<&'a Expr<'a>>,
        span: Span,
    },
    If {
        cond: &'a Expr<'a>,
        then_block: Block<'a>,
        /// `else` body, or a nested `If` for `else if` chains.
        else_branch: Option<&'a Stmt<'a>>,
        span: Span,
    },
    /// Value switch (`subject` present) or condition switch (absent).
    Switch {
        subject: Option<&'a Expr<'a>>,
        cases: Vec<SwitchCase<'a>>,
        span: Span,
    },
    /// `switch EXPR as NAME` with `when TYPE` branches.
    TypeSwitch {
        subject: &'a Expr<'a>,
        binding: Symbol,
        cases: Vec<TypeSwitchCase<'a>>,
        span: Span,
    },
    /// `for item in xs` / `for i, item in xs`.
    ForRange {
        index: Option<Symbol>,
        item: Symbol,
        collection: &'a Expr<'a>,
        body: Block<'a>,
        span: Span,
    },
    /// `for i from A to B` (exclusive) / `from A through B` (inclusive).
    /// Iterates downward when A > B.
    ForNumeric {
        var: Symbol,
        start: &'a Expr<'a>,
        end: &'a Expr<'a>,
        inclusive: bool,
        body: Block<'a>,
        span: Span,
    },
    /// `for COND`.
    ForCondition {
        cond: &'a Expr<'a>,
        body: Block<'a>,
        span: Span,
    },
    /// Bare `for`.
    ForInfinite {
        body: Block<'a>,
        span: Span,
    },
    Defer {
        call: &'a Expr<'a>,
        span: Span,
    },
    /// `go CALL`, or `go` with an indented block.
    Go {
        call: Option<&'a Expr<'a>>,
        block: Option<Block<'a>>,
        span: Span,
    },
    /// `send VALUE to CH`.
    Send {
        value: &'a Expr<'a>,
        chan: &'a Expr<'a>,
        span: Span,
    },
    /// `receive NAME from CH` as a binding statement.
    Receive {
        name: Symbol,
        chan: &'a Expr<'a>,
        span: Span,
    },
    Select {
        cases: Vec<SelectCase<'a>>,
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    /// `x++` / `x--`.
    IncDec {
        target: &'a Expr<'a>,
        increment: bool,
        span: Span,
    },
    Expr {
        expr: &'a Expr<'a>,
        onerr: Option<OnErr<'a>>,
        span: Span,
    },
}

impl<'a> Stmt<'a> {
    pub fn span(&self) -> Span {
        match self {
            Self::Block { span, .. }
            | Self::VarDecl { span, .. }
            | Self::Assign { span, .. }
            | Self::Return { span, .. }
            | Self::If { span, .. }
            | Self::Switch { span, .. }
            | Self::TypeSwitch { span, .. }
            | Self::ForRange { span, .. }
            | Self::ForNumeric { span, .. }
            | Self::ForCondition { span, .. }
            | Self::ForInfinite { span, .. }
            | Self::Defer { span, .. }
            | Self::Go { span, .. }
            | Self::Send { span, .. }
            | Self::Receive { span, .. }
            | Self::Select { span, .. }
            | Self::Break { span }
            | Self::Continue { span }
            | Self::IncDec { span, .. }
            | Self::Expr { span, .. } => *span,
        }
    }

    /// The `onerr` clause, for the statement forms that may carry one.
    pub fn onerr(&self) -> Option<&OnErr<'a>> {
        match self {
            Self::VarDecl { onerr, .. }
            | Self::Assign { onerr, .. }
            | Self::Expr { onerr, .. } => onerr.as_ref(),
            _ => None,
        }
    }
}
