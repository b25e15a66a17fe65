//! Symbol tables.
//!
//! A [`ScopeStack`] is a stack of name → [`SymbolInfo`] maps. The global
//! scope is created with the stack and can never be exited; every
//! structural boundary (function body, block of an `if`/`for`/case, function
//! literal body) pushes and pops one scope. `define` rejects duplicates in
//! the current scope; `resolve` walks outward.

use kukicha_base::Span;
use std::collections::HashMap;

use super::types::TypeInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Type,
    Interface,
    Import,
}

#[derive(Debug, Clone)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: TypeInfo,
    pub span: Span,
    pub mutable: bool,
    pub exported: bool,
}

impl SymbolInfo {
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: TypeInfo, span: Span) -> Self {
        let name = name.into();
        let exported = name.chars().next().is_some_and(|c| c.is_uppercase());
        SymbolInfo { name, kind, ty, span, mutable: kind == SymbolKind::Variable, exported }
    }
}

#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<HashMap<String, SymbolInfo>>,
}

impl ScopeStack {
    /// Creates the stack with its permanent global scope.
    pub fn new() -> Self {
        ScopeStack { scopes: vec![HashMap::new()] }
    }

    pub fn enter(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Leaves the innermost scope. The global scope stays.
    pub fn exit(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Defines `symbol` in the innermost scope. Returns the previous
    /// definition's span when the name already exists there.
    pub fn define(&mut self, symbol: SymbolInfo) -> Result<(), Span> {
        let scope = self.scopes.last_mut().expect("global scope always present");
        if let Some(existing) = scope.get(&symbol.name) {
            return Err(existing.span);
        }
        scope.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Defines or replaces without a duplicate check; used for builtins and
    /// for error-recovery redefinition.
    pub fn define_unchecked(&mut self, symbol: SymbolInfo) {
        let scope = self.scopes.last_mut().expect("global scope always present");
        scope.insert(symbol.name.clone(), symbol);
    }

    pub fn resolve(&self, name: &str) -> Option<&SymbolInfo> {
        for scope in self.scopes.iter().rev() {
            if let Some(symbol) = scope.get(name) {
                return Some(symbol);
            }
        }
        None
    }

    /// Resolution restricted to the innermost scope.
    pub fn resolve_local(&self, name: &str) -> Option<&SymbolInfo> {
        self.scopes.last().and_then(|scope| scope.get(name))
    }

    /// Every visible name, for did-you-mean suggestions.
    pub fn visible_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .scopes
            .iter()
            .flat_map(|scope| scope.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> SymbolInfo {
        SymbolInfo::new(name, SymbolKind::Variable, TypeInfo::Int, Span::default())
    }

    #[test]
    fn resolve_walks_outward() {
        let mut scopes = ScopeStack::new();
        scopes.define(var("outer")).unwrap();
        scopes.enter();
        scopes.define(var("inner")).unwrap();
        assert!(scopes.resolve("outer").is_some());
        assert!(scopes.resolve("inner").is_some());
        scopes.exit();
        assert!(scopes.resolve("inner").is_none());
    }

    #[test]
    fn duplicate_in_same_scope_is_rejected() {
        let mut scopes = ScopeStack::new();
        scopes.define(var("x")).unwrap();
        assert!(scopes.define(var("x")).is_err());
    }

    #[test]
    fn shadowing_in_inner_scope_is_allowed() {
        let mut scopes = ScopeStack::new();
        scopes.define(var("x")).unwrap();
        scopes.enter();
        assert!(scopes.define(var("x")).is_ok());
    }

    #[test]
    fn global_scope_cannot_be_exited() {
        let mut scopes = ScopeStack::new();
        scopes.exit();
        scopes.exit();
        assert_eq!(scopes.depth(), 1);
        scopes.define(var("still_works")).unwrap();
        assert!(scopes.resolve("still_works").is_some());
    }

    #[test]
    fn exported_follows_capitalization() {
        let exported = SymbolInfo::new("Public", SymbolKind::Function, TypeInfo::Unknown, Span::default());
        let private = SymbolInfo::new("private", SymbolKind::Function, TypeInfo::Unknown, Span::default());
        assert!(exported.exported);
        assert!(!private.exported);
    }
}
