//! Surface type annotations.
//!
//! These are the types as written in source (`list of int`,
//! `map of string to User`, `reference Point`), distinct from the
//! analyzer's inferred [`TypeInfo`] view. The code generator lowers them
//! to Go type syntax.
//!
//! [`TypeInfo`]: https://docs.rs/kukicha-compile

use kukicha_base::{Span, Symbol};

/// The closed set of primitive type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Int,
    Float,
    String,
    Bool,
    Byte,
    Rune,
    Error,
    Any,
}

impl PrimitiveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int" => Self::Int,
            "float" => Self::Float,
            "string" => Self::String,
            "bool" => Self::Bool,
            "byte" => Self::Byte,
            "rune" => Self::Rune,
            "error" => Self::Error,
            "any" => Self::Any,
            _ => return None,
        })
    }

    /// The Go spelling of this primitive. `float` widens to `float64`.
    pub fn go_name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float64",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Rune => "rune",
            Self::Error => "error",
            Self::Any => "any",
        }
    }

    pub fn source_name(self) -> &'static str {
        match self {
            Self::Float => "float",
            other => other.go_name(),
        }
    }
}

/// A type annotation as written in source.
#[derive(Debug)]
pub enum TypeAnn<'a> {
    Primitive {
        kind: PrimitiveKind,
        span: Span,
    },
    /// `Name` or `pkg.Name`.
    Named {
        package: Option<Symbol>,
        name: Symbol,
        span: Span,
    },
    /// `reference T` — a pointer in the target language.
    Reference {
        inner: &'a TypeAnn<'a>,
        span: Span,
    },
    /// `list of T`.
    List {
        elem: &'a TypeAnn<'a>,
        span: Span,
    },
    /// `map of K to V`.
    Map {
        key: &'a TypeAnn<'a>,
        value: &'a TypeAnn<'a>,
        span: Span,
    },
    /// `channel of T`.
    Channel {
        elem: &'a TypeAnn<'a>,
        span: Span,
    },
    /// `func(T1, T2) R` or `func(T1) (R1, R2)`.
    Function {
        params: Vec<&'a TypeAnn<'a>>,
        returns: Vec<&'a TypeAnn<'a>>,
        span: Span,
    },
}

impl<'a> TypeAnn<'a> {
    pub fn span(&self) -> Span {
        match self {
            Self::Primitive { span, .. }
            | Self::Named { span, .. }
            | Self::Reference { span, .. }
            | Self::List { span, .. }
            | Self::Map { span, .. }
            | Self::Channel { span, .. }
            | Self::Function { span, .. } => *span,
        }
    }

    /// True when the annotation is exactly the `error` primitive.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Primitive { kind: PrimitiveKind::Error, .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_names_round_trip() {
        for name in ["int", "float", "string", "bool", "byte", "rune", "error", "any"] {
            let kind = PrimitiveKind::from_name(name).unwrap();
            assert_eq!(kind.source_name(), name);
        }
        assert_eq!(PrimitiveKind::from_name("uint32"), None);
    }

    #[test]
    fn float_widens_in_go() {
        assert_eq!(PrimitiveKind::Float.go_name(), "float64");
        assert_eq!(PrimitiveKind::Int.go_name(), "int");
    }

    #[test]
    fn is_error_only_matches_the_error_primitive() {
        let err = TypeAnn::Primitive { kind: PrimitiveKind::Error, span: Span::default() };
        let int = TypeAnn::Primitive { kind: PrimitiveKind::Int, span: Span::default() };
        assert!(err.is_error());
        assert!(!int.is_error());
    }
}
