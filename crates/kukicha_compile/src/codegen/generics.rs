//! Generic placeholder emission for stdlib sources.
//!
//! Kukicha stdlib functions express element-type genericity with the
//! placeholder annotations `any` and `any2`. When the compiler is run over
//! stdlib sources, a function whose signature mentions a placeholder is
//! emitted with a Go type-parameter clause and every placeholder site
//! substituted:
//!
//! ```text
//! func Filter(xs list of any, pred func(any) bool) list of any
//!     ──▶ func Filter[T any](xs []T, pred func(T) bool) []T
//! ```
//!
//! `any` maps to `T` and `any2` to `K`. Whether a placeholder needs the
//! `comparable` constraint is a per-function property (membership tests
//! and map keys compare their elements); the table below lists those
//! functions.

use std::collections::BTreeMap;

use kukicha_base::Interner;
use kukicha_language::ast::{FunctionDecl, PrimitiveKind, TypeAnn};

/// Functions whose placeholder(s) require `comparable`, with the
/// placeholder names that need it.
const COMPARABLE: &[(&str, &[&str])] = &[
    ("Contains", &["any"]),
    ("Entries", &["any"]),
    ("Get", &["any"]),
    ("IndexOf", &["any"]),
    ("Keys", &["any"]),
    ("Merge", &["any"]),
    ("Unique", &["any"]),
    ("Values", &["any"]),
    ("Zip", &["any2"]),
];

fn ann_mentions(ann: &TypeAnn<'_>, placeholder: &str, interner: &Interner) -> bool {
    match ann {
        TypeAnn::Primitive { kind, .. } => {
            *kind == PrimitiveKind::Any && placeholder == "any"
        }
        TypeAnn::Named { package: None, name, .. } => {
            interner.resolve(*name) == placeholder
        }
        TypeAnn::Named { .. } => false,
        TypeAnn::Reference { inner, .. } => ann_mentions(inner, placeholder, interner),
        TypeAnn::List { elem, .. } => ann_mentions(elem, placeholder, interner),
        TypeAnn::Map { key, value, .. } => {
            ann_mentions(key, placeholder, interner)
                || ann_mentions(value, placeholder, interner)
        }
        TypeAnn::Channel { elem, .. } => ann_mentions(elem, placeholder, interner),
        TypeAnn::Function { params, returns, .. } => {
            params.iter().any(|p| ann_mentions(p, placeholder, interner))
                || returns.iter().any(|r| ann_mentions(r, placeholder, interner))
        }
    }
}

/// Builds the placeholder substitution for a function, or `None` when its
/// signature uses no placeholders.
pub(super) fn placeholder_map(
    f: &FunctionDecl<'_>,
    interner: &Interner,
) -> Option<BTreeMap<&'static str, &'static str>> {
    let mut map = BTreeMap::new();
    if signature_mentions(f, "any", interner) {
        map.insert("any", "T");
    }
    if signature_mentions(f, "any2", interner) {
        map.insert("any2", "K");
    }
    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

fn signature_mentions(f: &FunctionDecl<'_>, placeholder: &str, interner: &Interner) -> bool {
    f.params
        .iter()
        .filter_map(|p| p.ty)
        .any(|t| ann_mentions(t, placeholder, interner))
        || f.returns.iter().any(|r| ann_mentions(r, placeholder, interner))
}

/// The `[T any]` / `[T any, K comparable]` clause for a function.
pub(super) fn type_param_clause(
    fn_name: &str,
    map: &BTreeMap<&'static str, &'static str>,
) -> String {
    let comparable: &[&str] = COMPARABLE
        .iter()
        .find(|(name, _)| *name == fn_name)
        .map(|(_, list)| *list)
        .unwrap_or(&[]);
    let mut parts = Vec::new();
    for (placeholder, param) in map {
        let constraint = if comparable.contains(placeholder) {
            "comparable"
        } else {
            "any"
        };
        parts.push(format!("{} {}", param, constraint));
    }
    format!("[{}]", parts.join(", "))
}
