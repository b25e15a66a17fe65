//! The analyzer's view of types.
//!
//! [`TypeInfo`] is orthogonal to the surface `TypeAnn`: it is what the
//! analyzer infers and checks against, with [`TypeInfo::Unknown`] as the
//! widest type so analysis stays useful in the presence of earlier errors.

use std::fmt;

use kukicha_base::Interner;
use kukicha_language::ast::{PrimitiveKind, TypeAnn};

/// Signature information for function-typed symbols.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub params: Vec<TypeInfo>,
    pub returns: Vec<TypeInfo>,
    pub variadic: bool,
    pub param_names: Vec<String>,
    /// Trailing parameters carrying default values.
    pub default_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeInfo {
    /// Widest type: compatible with everything. Keeps error-tolerant
    /// analysis from cascading.
    Unknown,
    Int,
    Float,
    Str,
    Bool,
    List(Box<TypeInfo>),
    Map(Box<TypeInfo>, Box<TypeInfo>),
    Channel(Box<TypeInfo>),
    Reference(Box<TypeInfo>),
    /// A named type: program-declared, imported, or one of the builtin
    /// named types (`error`, `any`). External names are trusted when the
    /// package is imported.
    Named(String),
    Struct(String),
    Interface(String),
    Function(Box<FunctionType>),
}

impl TypeInfo {
    pub fn from_annotation(ann: &TypeAnn<'_>, interner: &Interner) -> TypeInfo {
        match ann {
            TypeAnn::Primitive { kind, .. } => match kind {
                PrimitiveKind::Int | PrimitiveKind::Byte | PrimitiveKind::Rune => TypeInfo::Int,
                PrimitiveKind::Float => TypeInfo::Float,
                PrimitiveKind::String => TypeInfo::Str,
                PrimitiveKind::Bool => TypeInfo::Bool,
                PrimitiveKind::Error => TypeInfo::Named("error".to_string()),
                PrimitiveKind::Any => TypeInfo::Named("any".to_string()),
            },
            TypeAnn::Named { package, name, .. } => {
                let name = interner.resolve(*name);
                match package {
                    Some(pkg) => {
                        TypeInfo::Named(format!("{}.{}", interner.resolve(*pkg), name))
                    }
                    None => TypeInfo::Named(name.to_string()),
                }
            }
            TypeAnn::Reference { inner, .. } => {
                TypeInfo::Reference(Box::new(Self::from_annotation(inner, interner)))
            }
            TypeAnn::List { elem, .. } => {
                TypeInfo::List(Box::new(Self::from_annotation(elem, interner)))
            }
            TypeAnn::Map { key, value, .. } => TypeInfo::Map(
                Box::new(Self::from_annotation(key, interner)),
                Box::new(Self::from_annotation(value, interner)),
            ),
            TypeAnn::Channel { elem, .. } => {
                TypeInfo::Channel(Box::new(Self::from_annotation(elem, interner)))
            }
            TypeAnn::Function { params, returns, .. } => {
                TypeInfo::Function(Box::new(FunctionType {
                    params: params
                        .iter()
                        .map(|p| Self::from_annotation(p, interner))
                        .collect(),
                    returns: returns
                        .iter()
                        .map(|r| Self::from_annotation(r, interner))
                        .collect(),
                    variadic: false,
                    param_names: Vec::new(),
                    default_count: 0,
                }))
            }
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TypeInfo::Unknown)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeInfo::Int | TypeInfo::Float | TypeInfo::Unknown)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TypeInfo::Named(n) if n == "error")
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TypeInfo::Named(n) if n == "any" || n == "interface{}")
    }

    /// Named duration types interoperate with plain integers, so
    /// `30 * time.Second` stays a duration.
    pub fn is_duration(&self) -> bool {
        matches!(self, TypeInfo::Named(n) if n == "Duration" || n.ends_with(".Duration"))
    }

    /// Pairwise compatibility. `Unknown` and `any` are universally
    /// compatible; a named duration accepts a plain integer; everything
    /// else must agree on kind with compatible components.
    pub fn compatible(a: &TypeInfo, b: &TypeInfo) -> bool {
        if a.is_unknown() || b.is_unknown() || a.is_any() || b.is_any() {
            return true;
        }
        if (a.is_duration() && *b == TypeInfo::Int) || (b.is_duration() && *a == TypeInfo::Int) {
            return true;
        }
        match (a, b) {
            (TypeInfo::Int, TypeInfo::Int)
            | (TypeInfo::Float, TypeInfo::Float)
            | (TypeInfo::Str, TypeInfo::Str)
            | (TypeInfo::Bool, TypeInfo::Bool) => true,
            (TypeInfo::List(x), TypeInfo::List(y)) => Self::compatible(x, y),
            (TypeInfo::Map(xk, xv), TypeInfo::Map(yk, yv)) => {
                Self::compatible(xk, yk) && Self::compatible(xv, yv)
            }
            (TypeInfo::Channel(x), TypeInfo::Channel(y)) => Self::compatible(x, y),
            (TypeInfo::Reference(x), TypeInfo::Reference(y)) => Self::compatible(x, y),
            (TypeInfo::Named(x), TypeInfo::Named(y)) => x == y,
            (TypeInfo::Struct(x), TypeInfo::Struct(y)) => x == y,
            (TypeInfo::Interface(x), TypeInfo::Interface(y)) => x == y,
            // A struct satisfies its named spelling and vice versa.
            (TypeInfo::Named(x), TypeInfo::Struct(y))
            | (TypeInfo::Struct(x), TypeInfo::Named(y)) => x == y,
            (TypeInfo::Named(x), TypeInfo::Interface(y))
            | (TypeInfo::Interface(x), TypeInfo::Named(y)) => x == y,
            // Concrete types may flow into interfaces; whether the method
            // set matches is the target language's concern.
            (TypeInfo::Interface(_), _) | (_, TypeInfo::Interface(_)) => true,
            (TypeInfo::Function(x), TypeInfo::Function(y)) => {
                x.params.len() == y.params.len()
                    && x.returns.len() == y.returns.len()
                    && x.params
                        .iter()
                        .zip(&y.params)
                        .all(|(p, q)| Self::compatible(p, q))
                    && x.returns
                        .iter()
                        .zip(&y.returns)
                        .all(|(p, q)| Self::compatible(p, q))
            }
            _ => false,
        }
    }

    /// The widened result of arithmetic between two numerics.
    pub fn widen(a: &TypeInfo, b: &TypeInfo) -> TypeInfo {
        if *a == TypeInfo::Float || *b == TypeInfo::Float {
            TypeInfo::Float
        } else if a.is_unknown() || b.is_unknown() {
            TypeInfo::Unknown
        } else {
            TypeInfo::Int
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeInfo::Unknown => write!(f, "unknown"),
            TypeInfo::Int => write!(f, "int"),
            TypeInfo::Float => write!(f, "float"),
            TypeInfo::Str => write!(f, "string"),
            TypeInfo::Bool => write!(f, "bool"),
            TypeInfo::List(elem) => write!(f, "list of {}", elem),
            TypeInfo::Map(k, v) => write!(f, "map of {} to {}", k, v),
            TypeInfo::Channel(elem) => write!(f, "channel of {}", elem),
            TypeInfo::Reference(inner) => write!(f, "reference {}", inner),
            TypeInfo::Named(name) | TypeInfo::Struct(name) | TypeInfo::Interface(name) => {
                write!(f, "{}", name)
            }
            TypeInfo::Function(sig) => {
                write!(f, "func(")?;
                for (i, p) in sig.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ")")?;
                match sig.returns.len() {
                    0 => Ok(()),
                    1 => write!(f, " {}", sig.returns[0]),
                    _ => {
                        write!(f, " (")?;
                        for (i, r) in sig.returns.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", r)?;
                        }
                        write!(f, ")")
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(t: TypeInfo) -> TypeInfo {
        TypeInfo::List(Box::new(t))
    }

    #[test]
    fn compatibility_is_reflexive() {
        let samples = [
            TypeInfo::Unknown,
            TypeInfo::Int,
            TypeInfo::Float,
            TypeInfo::Str,
            TypeInfo::Bool,
            list(TypeInfo::Int),
            TypeInfo::Map(Box::new(TypeInfo::Str), Box::new(TypeInfo::Int)),
            TypeInfo::Channel(Box::new(TypeInfo::Bool)),
            TypeInfo::Reference(Box::new(TypeInfo::Int)),
            TypeInfo::Named("User".to_string()),
            TypeInfo::Struct("Point".to_string()),
        ];
        for t in &samples {
            assert!(TypeInfo::compatible(t, t), "{} not self-compatible", t);
        }
    }

    #[test]
    fn unknown_is_total() {
        let samples = [
            TypeInfo::Int,
            TypeInfo::Str,
            list(TypeInfo::Bool),
            TypeInfo::Named("User".to_string()),
        ];
        for t in &samples {
            assert!(TypeInfo::compatible(&TypeInfo::Unknown, t));
            assert!(TypeInfo::compatible(t, &TypeInfo::Unknown));
        }
    }

    #[test]
    fn compatibility_is_symmetric() {
        let pairs = [
            (TypeInfo::Int, TypeInfo::Float),
            (TypeInfo::Named("Duration".to_string()), TypeInfo::Int),
            (list(TypeInfo::Int), list(TypeInfo::Unknown)),
            (TypeInfo::Str, TypeInfo::Str),
            (TypeInfo::Named("any".to_string()), TypeInfo::Bool),
        ];
        for (a, b) in &pairs {
            assert_eq!(
                TypeInfo::compatible(a, b),
                TypeInfo::compatible(b, a),
                "asymmetry between {} and {}",
                a,
                b
            );
        }
    }

    #[test]
    fn duration_accepts_int() {
        let duration = TypeInfo::Named("time.Duration".to_string());
        assert!(TypeInfo::compatible(&duration, &TypeInfo::Int));
        assert!(!TypeInfo::compatible(&duration, &TypeInfo::Str));
    }

    #[test]
    fn mismatched_kinds_are_incompatible() {
        assert!(!TypeInfo::compatible(&TypeInfo::Int, &TypeInfo::Str));
        assert!(!TypeInfo::compatible(&list(TypeInfo::Int), &TypeInfo::Int));
        assert!(!TypeInfo::compatible(
            &list(TypeInfo::Int),
            &list(TypeInfo::Str)
        ));
    }

    #[test]
    fn widen_prefers_float() {
        assert_eq!(TypeInfo::widen(&TypeInfo::Int, &TypeInfo::Float), TypeInfo::Float);
        assert_eq!(TypeInfo::widen(&TypeInfo::Int, &TypeInfo::Int), TypeInfo::Int);
        assert_eq!(
            TypeInfo::widen(&TypeInfo::Unknown, &TypeInfo::Int),
            TypeInfo::Unknown
        );
    }

    #[test]
    fn display_reads_like_source() {
        assert_eq!(list(TypeInfo::Int).to_string(), "list of int");
        assert_eq!(
            TypeInfo::Map(Box::new(TypeInfo::Str), Box::new(TypeInfo::Int)).to_string(),
            "map of string to int"
        );
    }
}
