//! Top-level declarations and the program node.

use kukicha_base::{Span, Symbol};

use super::expr::Expr;
use super::stmt::Block;
use super::types::TypeAnn;

/// `petiole NAME` — the package declaration.
#[derive(Debug, Clone, Copy)]
pub struct PackageDecl {
    pub name: Symbol,
    pub span: Span,
}

/// `import "PATH" [as NAME]`.
#[derive(Debug, Clone, Copy)]
pub struct ImportDecl {
    pub path: Symbol,
    pub alias: Option<Symbol>,
    pub span: Span,
}

/// One `key: "value"` line of a skill block.
#[derive(Debug, Clone, Copy)]
pub struct SkillOption {
    pub key: Symbol,
    pub value: Symbol,
    pub span: Span,
}

/// `skill NAME` with its indented option lines.
#[derive(Debug, Clone)]
pub struct SkillDecl {
    pub name: Symbol,
    pub options: Vec<SkillOption>,
    pub span: Span,
}

/// One function parameter. `ty` is `None` only while recovering from a
/// missing-annotation parse error (arrow lambdas keep their own untyped
/// parameter representation).
#[derive(Debug)]
pub struct Param<'a> {
    pub name: Symbol,
    pub ty: Option<&'a TypeAnn<'a>>,
    pub default: Option<&'a Expr<'a>>,
    /// `many T` — variadic; must be the final parameter.
    pub variadic: bool,
    pub span: Span,
}

/// `on NAME [reference] TYPE` — the method receiver.
#[derive(Debug, Clone, Copy)]
pub struct Receiver {
    pub name: Symbol,
    pub type_name: Symbol,
    pub reference: bool,
    pub span: Span,
}

#[derive(Debug)]
pub struct FunctionDecl<'a> {
    pub name: Symbol,
    pub receiver: Option<Receiver>,
    pub params: Vec<Param<'a>>,
    pub returns: Vec<&'a TypeAnn<'a>>,
    pub body: Block<'a>,
    pub span: Span,
}

/// One `name TYPE` field of a struct declaration.
#[derive(Debug)]
pub struct Field<'a> {
    pub name: Symbol,
    pub ty: &'a TypeAnn<'a>,
    pub span: Span,
}

/// The two bodies a `type` declaration can have.
#[derive(Debug)]
pub enum TypeDeclKind<'a> {
    /// Indented field lines — a struct.
    Struct(Vec<Field<'a>>),
    /// `type Celsius float` — a named type over an existing one.
    Alias(&'a TypeAnn<'a>),
}

/// One method signature inside an interface declaration.
#[derive(Debug)]
pub struct MethodSig<'a> {
    pub name: Symbol,
    pub params: Vec<Param<'a>>,
    pub returns: Vec<&'a TypeAnn<'a>>,
    pub span: Span,
}

#[derive(Debug)]
pub struct InterfaceDecl<'a> {
    pub name: Symbol,
    pub methods: Vec<MethodSig<'a>>,
    pub span: Span,
}

#[derive(Debug)]
pub enum Decl<'a> {
    Function(FunctionDecl<'a>),
    Type {
        name: Symbol,
        kind: TypeDeclKind<'a>,
        span: Span,
    },
    Interface(InterfaceDecl<'a>),
    GlobalVar {
        name: Symbol,
        ty: Option<&'a TypeAnn<'a>>,
        value: Option<&'a Expr<'a>>,
        span: Span,
    },
}

impl<'a> Decl<'a> {
    pub fn span(&self) -> Span {
        match self {
            Self::Function(f) => f.span,
            Self::Type { span, .. } => *span,
            Self::Interface(i) => i.span,
            Self::GlobalVar { span, .. } => *span,
        }
    }
}

/// The parser's top-level artifact.
#[derive(Debug)]
pub struct Program<'a> {
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub skill: Option<SkillDecl>,
    pub decls: Vec<Decl<'a>>,
}

impl<'a> Program<'a> {
    pub fn is_empty(&self) -> bool {
        self.package.is_none()
            && self.imports.is_empty()
            && self.skill.is_none()
            && self.decls.is_empty()
    }
}
