//! Go code generation.
//!
//! Walks an analyzed program and emits Go source text. The generator is
//! deterministic: identical input produces byte-identical output, so every
//! emission-order-relevant collection here is a `BTreeSet`/`BTreeMap`.
//!
//! ```text
//! Program + side tables
//!        │
//!        ▼
//! ┌──────────────┐   declarations, statements, expressions
//! │  Generator   │ ─────────────────────────────────────────▶ body text
//! └──────────────┘
//!        │ auto_imports gathered on demand during lowering
//!        ▼
//! package header + import block + body
//! ```
//!
//! The import block is assembled *after* the body is lowered, so a
//! late-discovered need (an interpolation deep inside a handler block,
//! say) still lands in the header. Imports are grouped standard →
//! third-party → module-local and sorted within each group.
//!
//! Lowering assumes the program passed semantic analysis; inconsistencies
//! found here are compiler bugs, surfaced as [`GenError`] rather than
//! panics.

mod expr;
mod generics;
mod stmt;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use kukicha_base::{Interner, Span};
use kukicha_language::ast::{
    Decl, ExprId, FunctionDecl, PrimitiveKind, Program, TypeAnn, TypeDeclKind,
};

use crate::analysis::{import_local_name, remap_import_path, STDLIB_VENDOR_PREFIX};

/// An internal code-generation failure. The source must have been rejected
/// by the analyzer for one of these to surface.
#[derive(Debug, Clone)]
pub struct GenError {
    pub message: String,
    pub span: Span,
}

impl GenError {
    fn new(message: impl Into<String>, span: Span) -> Self {
        GenError { message: message.into(), span }
    }
}

#[derive(Debug, Clone)]
pub struct GenOptions {
    pub filename: String,
    /// Emit `// line <file>:<line>` markers at statement boundaries so the
    /// driver can map Go errors back to kukicha positions.
    pub line_directives: bool,
    /// Compiling stdlib sources: `any`/`any2` annotations become type
    /// parameters (see [`generics`]).
    pub is_stdlib: bool,
}

impl Default for GenOptions {
    fn default() -> Self {
        GenOptions {
            filename: "main.kuki".to_string(),
            line_directives: true,
            is_stdlib: false,
        }
    }
}

/// What a top-level `type` declaration turned out to be; drives zero-value
/// emission.
#[derive(Debug, Clone, Copy)]
enum LocalType<'a> {
    Struct,
    Interface,
    Alias(&'a TypeAnn<'a>),
}

pub struct Generator<'a, 'int> {
    pub(crate) interner: &'int mut Interner,
    options: GenOptions,
    counts: &'a HashMap<ExprId, usize>,
    out: String,
    indent: usize,
    pub(crate) auto_imports: BTreeSet<&'static str>,
    declared_imports: Vec<(String, Option<String>)>,
    /// Import local name → alias used in output, for names that collide
    /// with a program symbol (`json` → `kukijson`).
    pkg_aliases: BTreeMap<String, String>,
    pub(crate) import_names: HashSet<String>,
    local_funcs: HashMap<String, &'a FunctionDecl<'a>>,
    local_methods: HashMap<String, &'a FunctionDecl<'a>>,
    local_types: HashMap<String, LocalType<'a>>,
    /// Go-side name of the caught error while emitting an onerr handler.
    pub(crate) onerr_var: Option<String>,
    /// Active generic substitution (`any` → `T`, `any2` → `K`).
    placeholders: Option<BTreeMap<&'static str, &'static str>>,
    current_returns: Vec<&'a TypeAnn<'a>>,
    /// Index of the return position being emitted, for lowering a bare
    /// `empty` to the right zero value.
    current_return_index: Option<usize>,
    receiver_name: Option<String>,
    line_starts: Vec<usize>,
    last_directive_line: usize,
    package_name: String,
}

/// Lowers `program` to Go source text.
pub fn generate<'a>(
    program: &'a Program<'a>,
    interner: &mut Interner,
    source: &'a str,
    counts: &'a HashMap<ExprId, usize>,
    options: GenOptions,
) -> Result<String, GenError> {
    let mut generator = Generator::new(interner, source, counts, options);
    generator.scan(program);
    generator.emit_program(program)?;
    Ok(generator.assemble())
}

impl<'a, 'int> Generator<'a, 'int> {
    fn new(
        interner: &'int mut Interner,
        source: &'a str,
        counts: &'a HashMap<ExprId, usize>,
        options: GenOptions,
    ) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Generator {
            interner,
            options,
            counts,
            out: String::new(),
            indent: 0,
            auto_imports: BTreeSet::new(),
            declared_imports: Vec::new(),
            pkg_aliases: BTreeMap::new(),
            import_names: HashSet::new(),
            local_funcs: HashMap::new(),
            local_methods: HashMap::new(),
            local_types: HashMap::new(),
            onerr_var: None,
            placeholders: None,
            current_returns: Vec::new(),
            current_return_index: None,
            receiver_name: None,
            line_starts,
            last_directive_line: 0,
            package_name: "main".to_string(),
        }
    }

    /// Pre-pass: package name, local symbol tables, declared imports and
    /// collision aliases.
    fn scan(&mut self, program: &'a Program<'a>) {
        if let Some(pkg) = &program.package {
            self.package_name = self.interner.resolve(pkg.name).to_string();
        }

        let mut top_level: HashSet<String> = HashSet::new();
        for decl in &program.decls {
            match decl {
                Decl::Function(f) => {
                    let name = self.interner.resolve(f.name).to_string();
                    if f.receiver.is_some() {
                        self.local_methods.insert(name, f);
                    } else {
                        top_level.insert(name.clone());
                        self.local_funcs.insert(name, f);
                    }
                }
                Decl::Type { name, kind, .. } => {
                    let name = self.interner.resolve(*name).to_string();
                    top_level.insert(name.clone());
                    let local = match kind {
                        TypeDeclKind::Struct(_) => LocalType::Struct,
                        TypeDeclKind::Alias(ty) => LocalType::Alias(ty),
                    };
                    self.local_types.insert(name, local);
                }
                Decl::Interface(i) => {
                    let name = self.interner.resolve(i.name).to_string();
                    top_level.insert(name.clone());
                    self.local_types.insert(name, LocalType::Interface);
                }
                Decl::GlobalVar { name, .. } => {
                    top_level.insert(self.interner.resolve(*name).to_string());
                }
            }
        }

        for import in &program.imports {
            let path = remap_import_path(self.interner.resolve(import.path));
            let explicit = import.alias.map(|a| self.interner.resolve(a).to_string());
            let local = explicit
                .clone()
                .unwrap_or_else(|| import_local_name(&path));
            self.import_names.insert(local.clone());
            let alias = if top_level.contains(&local) {
                let alias = format!("kuki{}", local);
                self.pkg_aliases.insert(local.clone(), alias.clone());
                Some(alias)
            } else {
                explicit
            };
            self.declared_imports.push((path, alias));
        }
    }

    fn emit_program(&mut self, program: &'a Program<'a>) -> Result<(), GenError> {
        let mut first = true;
        for decl in &program.decls {
            if !first {
                self.out.push('\n');
            }
            first = false;
            self.emit_decl(decl)?;
        }
        Ok(())
    }

    fn emit_decl(&mut self, decl: &'a Decl<'a>) -> Result<(), GenError> {
        match decl {
            Decl::Function(f) => self.emit_function(f),
            Decl::Type { name, kind, span } => {
                self.line_directive(*span);
                let name = self.interner.resolve(*name).to_string();
                match kind {
                    TypeDeclKind::Struct(fields) => {
                        self.write_line(&format!("type {} struct {{", name));
                        self.indent += 1;
                        for field in fields {
                            let field_name = self.interner.resolve(field.name).to_string();
                            let ty = self.gen_type(field.ty);
                            self.write_line(&format!("{} {}", field_name, ty));
                        }
                        self.indent -= 1;
                        self.write_line("}");
                    }
                    TypeDeclKind::Alias(ty) => {
                        let ty = self.gen_type(ty);
                        self.write_line(&format!("type {} {}", name, ty));
                    }
                }
                Ok(())
            }
            Decl::Interface(i) => {
                self.line_directive(i.span);
                let name = self.interner.resolve(i.name).to_string();
                self.write_line(&format!("type {} interface {{", name));
                self.indent += 1;
                for sig in &i.methods {
                    let method = self.interner.resolve(sig.name).to_string();
                    let params = self.gen_params(&sig.params);
                    let returns = self.gen_returns(&sig.returns);
                    self.write_line(&format!("{}({}){}", method, params, returns));
                }
                self.indent -= 1;
                self.write_line("}");
                Ok(())
            }
            Decl::GlobalVar { name, ty, value, span } => {
                self.line_directive(*span);
                let name = self.interner.resolve(*name).to_string();
                let line = match (ty, value) {
                    (Some(ty), Some(value)) => {
                        let ty = self.gen_type(ty);
                        let value = self.gen_expr(value)?;
                        format!("var {} {} = {}", name, ty, value)
                    }
                    (Some(ty), None) => format!("var {} {}", name, self.gen_type(ty)),
                    (None, Some(value)) => {
                        let value = self.gen_expr(value)?;
                        format!("var {} = {}", name, value)
                    }
                    (None, None) => format!("var {} any", name),
                };
                self.write_line(&line);
                Ok(())
            }
        }
    }

    fn emit_function(&mut self, f: &'a FunctionDecl<'a>) -> Result<(), GenError> {
        self.line_directive(f.span);
        let name = self.interner.resolve(f.name).to_string();

        self.placeholders = if self.options.is_stdlib {
            generics::placeholder_map(f, self.interner)
        } else {
            None
        };
        let type_params = match &self.placeholders {
            Some(map) => generics::type_param_clause(&name, map),
            None => String::new(),
        };

        let receiver = match &f.receiver {
            Some(recv) => {
                let recv_name = self.interner.resolve(recv.name).to_string();
                let type_name = self.interner.resolve(recv.type_name).to_string();
                self.receiver_name = Some(recv_name.clone());
                let star = if recv.reference { "*" } else { "" };
                format!("({} {}{}) ", recv_name, star, type_name)
            }
            None => String::new(),
        };

        let params = self.gen_params(&f.params);
        let returns = self.gen_returns(&f.returns);
        self.write_line(&format!(
            "func {}{}{}({}){} {{",
            receiver, name, type_params, params, returns
        ));

        self.current_returns = f.returns.clone();
        self.indent += 1;
        for stmt in f.body {
            self.gen_stmt(stmt)?;
        }
        self.indent -= 1;
        self.write_line("}");

        self.current_returns = Vec::new();
        self.receiver_name = None;
        self.placeholders = None;
        Ok(())
    }

    // =========================================================================
    // Types and signatures
    // =========================================================================

    pub(crate) fn gen_params(&mut self, params: &[kukicha_language::ast::Param<'_>]) -> String {
        let mut parts = Vec::new();
        for param in params {
            let name = self.interner.resolve(param.name).to_string();
            let ty = match param.ty {
                Some(ty) => self.gen_type(ty),
                None => "any".to_string(),
            };
            if param.variadic {
                parts.push(format!("{} ...{}", name, ty));
            } else {
                parts.push(format!("{} {}", name, ty));
            }
        }
        parts.join(", ")
    }

    pub(crate) fn gen_returns(&mut self, returns: &[&TypeAnn<'_>]) -> String {
        match returns.len() {
            0 => String::new(),
            1 => format!(" {}", self.gen_type(returns[0])),
            _ => {
                let types: Vec<String> = returns.iter().map(|r| self.gen_type(r)).collect();
                format!(" ({})", types.join(", "))
            }
        }
    }

    pub(crate) fn gen_type(&mut self, ann: &TypeAnn<'_>) -> String {
        match ann {
            TypeAnn::Primitive { kind, .. } => {
                if *kind == PrimitiveKind::Any {
                    if let Some(map) = &self.placeholders {
                        if let Some(param) = map.get("any") {
                            return (*param).to_string();
                        }
                    }
                }
                kind.go_name().to_string()
            }
            TypeAnn::Named { package, name, .. } => {
                let name = self.interner.resolve(*name).to_string();
                match package {
                    Some(pkg) => {
                        let pkg = self.interner.resolve(*pkg).to_string();
                        let pkg = self.package_ref(&pkg);
                        format!("{}.{}", pkg, name)
                    }
                    None => {
                        if name == "any2" {
                            if let Some(map) = &self.placeholders {
                                if let Some(param) = map.get("any2") {
                                    return (*param).to_string();
                                }
                            }
                        }
                        name
                    }
                }
            }
            TypeAnn::Reference { inner, .. } => format!("*{}", self.gen_type(inner)),
            TypeAnn::List { elem, .. } => format!("[]{}", self.gen_type(elem)),
            TypeAnn::Map { key, value, .. } => {
                format!("map[{}]{}", self.gen_type(key), self.gen_type(value))
            }
            TypeAnn::Channel { elem, .. } => format!("chan {}", self.gen_type(elem)),
            TypeAnn::Function { params, returns, .. } => {
                let params: Vec<String> = params.iter().map(|p| self.gen_type(p)).collect();
                let returns = self.gen_returns(returns);
                format!("func({}){}", params.join(", "), returns)
            }
        }
    }

    /// The zero value of a surface type, used by `empty` and by padded
    /// `return` positions in onerr handlers.
    pub(crate) fn zero_value(&mut self, ann: &TypeAnn<'_>) -> String {
        match ann {
            TypeAnn::Primitive { kind, .. } => match kind {
                PrimitiveKind::Int | PrimitiveKind::Byte | PrimitiveKind::Rune => "0".to_string(),
                PrimitiveKind::Float => "0".to_string(),
                PrimitiveKind::String => "\"\"".to_string(),
                PrimitiveKind::Bool => "false".to_string(),
                PrimitiveKind::Error => "nil".to_string(),
                PrimitiveKind::Any => {
                    if self.placeholders.is_some() {
                        // Generic position: the zero value of the type
                        // parameter, not the untyped nil.
                        let ty = self.gen_type(ann);
                        format!("*new({})", ty)
                    } else {
                        "nil".to_string()
                    }
                }
            },
            TypeAnn::Named { package: None, name, .. } => {
                let name = self.interner.resolve(*name).to_string();
                if name == "any2" && self.placeholders.is_some() {
                    let ty = self.gen_type(ann);
                    return format!("*new({})", ty);
                }
                match self.local_types.get(name.as_str()).copied() {
                    Some(LocalType::Struct) => format!("{}{{}}", name),
                    Some(LocalType::Interface) => "nil".to_string(),
                    Some(LocalType::Alias(underlying)) => {
                        let inner = self.zero_value(underlying);
                        if inner == "nil" {
                            "nil".to_string()
                        } else {
                            format!("{}({})", name, inner)
                        }
                    }
                    None => format!("*new({})", name),
                }
            }
            TypeAnn::Named { .. } => {
                let ty = self.gen_type(ann);
                format!("*new({})", ty)
            }
            TypeAnn::Reference { .. }
            | TypeAnn::List { .. }
            | TypeAnn::Map { .. }
            | TypeAnn::Channel { .. }
            | TypeAnn::Function { .. } => "nil".to_string(),
        }
    }

    /// Resolves a package reference through the collision-alias table.
    pub(crate) fn package_ref(&self, name: &str) -> String {
        self.pkg_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    // =========================================================================
    // Output plumbing
    // =========================================================================

    pub(crate) fn write_line(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
        self.out.push_str(line);
        self.out.push('\n');
    }

    /// Renders nested statements (function literals, go blocks) into a
    /// string at the current indent level.
    pub(crate) fn render_block(
        &mut self,
        block: &[kukicha_language::ast::Stmt<'_>],
    ) -> Result<String, GenError> {
        let saved = std::mem::take(&mut self.out);
        self.indent += 1;
        let result = (|| {
            for stmt in block {
                self.gen_stmt(stmt)?;
            }
            Ok(())
        })();
        self.indent -= 1;
        let rendered = std::mem::replace(&mut self.out, saved);
        result.map(|_| rendered)
    }

    pub(crate) fn indent_prefix(&self) -> String {
        "\t".repeat(self.indent)
    }

    fn line_of(&self, span: Span) -> usize {
        self.line_starts.partition_point(|start| *start <= span.start)
    }

    /// `// line <file>:<line>` at statement-level boundaries, skipping
    /// repeats for the same source line.
    pub(crate) fn line_directive(&mut self, span: Span) {
        if !self.options.line_directives {
            return;
        }
        let line = self.line_of(span);
        if line != self.last_directive_line {
            self.last_directive_line = line;
            let marker = format!("// line {}:{}", self.options.filename, line);
            self.write_line(&marker);
        }
    }

    pub(crate) fn local_function(&self, name: &str) -> Option<&'a FunctionDecl<'a>> {
        self.local_funcs
            .get(name)
            .or_else(|| self.local_methods.get(name))
            .copied()
    }

    pub(crate) fn count_of(&self, id: ExprId) -> Option<usize> {
        self.counts.get(&id).copied()
    }

    pub(crate) fn return_annotation(&self, index: usize) -> Option<&'a TypeAnn<'a>> {
        self.current_returns.get(index).copied()
    }

    pub(crate) fn set_return_index(&mut self, index: Option<usize>) {
        self.current_return_index = index;
    }

    pub(crate) fn return_index(&self) -> Option<usize> {
        self.current_return_index
    }

    pub(crate) fn returns_len(&self) -> usize {
        self.current_returns.len()
    }

    // =========================================================================
    // Header assembly
    // =========================================================================

    fn assemble(mut self) -> String {
        let mut header = format!("package {}\n", self.package_name);

        // Merge declared imports with the on-demand set.
        let mut entries: BTreeMap<String, Option<String>> = BTreeMap::new();
        for (path, alias) in &self.declared_imports {
            entries.insert(path.clone(), alias.clone());
        }
        for path in &self.auto_imports {
            entries.entry((*path).to_string()).or_insert(None);
        }

        if !entries.is_empty() {
            let mut std_group: Vec<String> = Vec::new();
            let mut third_party: Vec<String> = Vec::new();
            let mut module_local: Vec<String> = Vec::new();
            for (path, alias) in &entries {
                let line = match alias {
                    Some(alias) => format!("\t{} \"{}\"", alias, path),
                    None => format!("\t\"{}\"", path),
                };
                if path.starts_with(STDLIB_VENDOR_PREFIX) {
                    module_local.push(line);
                } else if path.split('/').next().is_some_and(|seg| seg.contains('.')) {
                    third_party.push(line);
                } else {
                    std_group.push(line);
                }
            }
            header.push_str("\nimport (\n");
            let mut first_group = true;
            for group in [std_group, third_party, module_local] {
                if group.is_empty() {
                    continue;
                }
                if !first_group {
                    header.push('\n');
                }
                first_group = false;
                for line in group {
                    header.push_str(&line);
                    header.push('\n');
                }
            }
            header.push_str(")\n");
        }

        if self.out.is_empty() {
            header
        } else {
            header.push('\n');
            header.push_str(&self.out);
            header
        }
    }
}
