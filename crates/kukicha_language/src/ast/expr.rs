//! Expression nodes.

use kukicha_base::{Span, Symbol};

use super::decl::Param;
use super::stmt::Block;
use super::types::TypeAnn;
use crate::token::StrPart;

/// Identity of a call-like expression, assigned by the parser.
///
/// The analyzer keys its return-count side table by this id; the code
/// generator reads the table back when deciding how an `onerr` attachment
/// destructures. Ids are dense and unique within one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    /// Membership test: `x in xs`.
    In,
}

impl BinaryOp {
    /// The Go operator, or `None` for `in`, which lowers to a call.
    pub fn go_symbol(self) -> Option<&'static str> {
        Some(match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::In => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `not x` / `!x`
    Not,
    /// `-x`
    Neg,
}

/// One call argument, optionally named (`f(limit: 10)`).
#[derive(Debug)]
pub struct Arg<'a> {
    pub name: Option<Symbol>,
    pub value: &'a Expr<'a>,
}

/// Body of an arrow lambda: a single expression or an indented block.
#[derive(Debug)]
pub enum LambdaBody<'a> {
    Expr(&'a Expr<'a>),
    Block(Block<'a>),
}

#[derive(Debug)]
pub enum Expr<'a> {
    Identifier {
        name: Symbol,
        span: Span,
    },
    IntLit {
        text: Symbol,
        value: Option<i64>,
        span: Span,
    },
    FloatLit {
        text: Symbol,
        span: Span,
    },
    /// A string literal. `parts` is `Some` when the literal contains
    /// interpolation holes; `text` then holds the raw literal for display
    /// and `parts` the decoded segments.
    StringLit {
        text: Symbol,
        parts: Option<Vec<StrPart>>,
        span: Span,
    },
    RuneLit {
        text: Symbol,
        span: Span,
    },
    BoolLit {
        value: bool,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: &'a Expr<'a>,
        span: Span,
    },
    /// `lhs |> rhs` where `rhs` is call-like or a bare callee.
    Pipe {
        id: ExprId,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
        span: Span,
    },
    Call {
        id: ExprId,
        callee: &'a Expr<'a>,
        args: Vec<Arg<'a>>,
        /// `f(many xs)` — spread the final list argument into a variadic
        /// parameter.
        spread: bool,
        span: Span,
    },
    /// `recv.method(args)`. Also covers package-qualified calls
    /// (`strings.Split(..)`); the analyzer tells the two apart by resolving
    /// the receiver.
    MethodCall {
        id: ExprId,
        recv: &'a Expr<'a>,
        method: Symbol,
        args: Vec<Arg<'a>>,
        spread: bool,
        span: Span,
    },
    Index {
        base: &'a Expr<'a>,
        index: &'a Expr<'a>,
        span: Span,
    },
    Slice {
        base: &'a Expr<'a>,
        start: Option<&'a Expr<'a>>,
        end: Option<&'a Expr<'a>>,
        span: Span,
    },
    Selector {
        base: &'a Expr<'a>,
        field: Symbol,
        span: Span,
    },
    StructLit {
        package: Option<Symbol>,
        name: Symbol,
        fields: Vec<(Symbol, &'a Expr<'a>)>,
        span: Span,
    },
    ListLit {
        elem_type: Option<&'a TypeAnn<'a>>,
        elems: Vec<&'a Expr<'a>>,
        span: Span,
    },
    MapLit {
        key_type: Option<&'a TypeAnn<'a>>,
        value_type: Option<&'a TypeAnn<'a>>,
        entries: Vec<(&'a Expr<'a>, &'a Expr<'a>)>,
        span: Span,
    },
    FunctionLit {
        params: Vec<Param<'a>>,
        returns: Vec<&'a TypeAnn<'a>>,
        body: Block<'a>,
        span: Span,
    },
    /// `(x, y) => x + y`, or with an indented block body.
    ArrowLambda {
        params: Vec<Param<'a>>,
        body: LambdaBody<'a>,
        span: Span,
    },
    Make {
        ty: &'a TypeAnn<'a>,
        args: Vec<&'a Expr<'a>>,
        span: Span,
    },
    /// `receive ch` in expression position.
    Receive {
        chan: &'a Expr<'a>,
        span: Span,
    },
    /// `reference of x`.
    AddressOf {
        operand: &'a Expr<'a>,
        span: Span,
    },
    /// `dereference p`.
    Dereference {
        operand: &'a Expr<'a>,
        span: Span,
    },
    /// `empty` or `empty TYPE` — the zero value.
    Empty {
        ty: Option<&'a TypeAnn<'a>>,
        span: Span,
    },
    Panic {
        value: &'a Expr<'a>,
        span: Span,
    },
    /// `error EXPR` — constructs an error value from a message.
    ErrorNew {
        message: &'a Expr<'a>,
        span: Span,
    },
    Recover {
        span: Span,
    },
    Close {
        chan: &'a Expr<'a>,
        span: Span,
    },
    /// `x.(T)`.
    TypeAssertion {
        base: &'a Expr<'a>,
        ty: &'a TypeAnn<'a>,
        span: Span,
    },
    /// `x as T`.
    TypeCast {
        base: &'a Expr<'a>,
        ty: &'a TypeAnn<'a>,
        span: Span,
    },
}

impl<'a> Expr<'a> {
    pub fn span(&self) -> Span {
        match self {
            Self::Identifier { span, .. }
            | Self::IntLit { span, .. }
            | Self::FloatLit { span, .. }
            | Self::StringLit { span, .. }
            | Self::RuneLit { span, .. }
            | Self::BoolLit { span, .. }
            | Self::Binary { span, .. }
            | Self::Unary { span, .. }
            | Self::Pipe { span, .. }
            | Self::Call { span, .. }
            | Self::MethodCall { span, .. }
            | Self::Index { span, .. }
            | Self::Slice { span, .. }
            | Self::Selector { span, .. }
            | Self::StructLit { span, .. }
            | Self::ListLit { span, .. }
            | Self::MapLit { span, .. }
            | Self::FunctionLit { span, .. }
            | Self::ArrowLambda { span, .. }
            | Self::Make { span, .. }
            | Self::Receive { span, .. }
            | Self::AddressOf { span, .. }
            | Self::Dereference { span, .. }
            | Self::Empty { span, .. }
            | Self::Panic { span, .. }
            | Self::ErrorNew { span, .. }
            | Self::Recover { span }
            | Self::Close { span, .. }
            | Self::TypeAssertion { span, .. }
            | Self::TypeCast { span, .. } => *span,
        }
    }

    /// The side-table id for call-like expressions.
    pub fn call_id(&self) -> Option<ExprId> {
        match self {
            Self::Call { id, .. } | Self::MethodCall { id, .. } | Self::Pipe { id, .. } => {
                Some(*id)
            }
            _ => None,
        }
    }

    /// True for the `_` placeholder identifier.
    pub fn is_placeholder(&self, interner: &kukicha_base::Interner) -> bool {
        matches!(self, Self::Identifier { name, .. } if interner.resolve(*name) == "_")
    }
}
