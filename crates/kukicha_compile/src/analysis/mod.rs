//! Semantic analysis.
//!
//! Two passes over the parsed program:
//!
//! 1. **Collection** — registers every top-level name (functions with full
//!    signature info, types with their fields, interfaces, imports, global
//!    variables) in the global scope before any body is looked at, so
//!    mutually recursive functions and forward references work.
//! 2. **Analysis** — walks each body with a scope stack, the enclosing
//!    function's return types, loop/switch depth counters and the `onerr`
//!    context, emitting errors and warnings and filling the
//!    per-expression return-count side table the code generator reads.
//!
//! The analyzer never mutates the AST; everything it learns lives in
//! [`Analysis`].

pub mod lints;
pub mod registry;
pub mod scope;
pub mod types;

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};

use kukicha_base::{Interner, Span};
use kukicha_language::ast::{
    Arg, BinaryOp, Decl, Expr, ExprId, FunctionDecl, LambdaBody, OnErr, OnErrHandler, Program,
    Stmt, TypeAnn, TypeDeclKind, UnaryOp,
};
use kukicha_language::suggest::find_similar;
use kukicha_language::token::StrPart;

use crate::diagnostic::Diagnostic;
use scope::{ScopeStack, SymbolInfo, SymbolKind};
use types::{FunctionType, TypeInfo};

/// Module path under which the kukicha stdlib is vendored.
pub const STDLIB_VENDOR_PREFIX: &str = "github.com/kukicha/stdlib";

/// Go standard library package names that top-level bindings shouldn't
/// shadow; generated code imports several of them.
const GO_STDLIB_PACKAGES: &[&str] = &[
    "bufio", "bytes", "context", "errors", "exec", "filepath", "fmt", "http", "io", "json",
    "maps", "math", "os", "path", "rand", "regexp", "slices", "sort", "strconv", "strings",
    "sync", "time",
];

/// Builtin functions visible when no user symbol shadows them, with their
/// value arity.
const BUILTINS: &[(&str, usize)] = &[
    ("print", 0),
    ("len", 1),
    ("append", 1),
    ("min", 1),
    ("max", 1),
];

/// Remaps `stdlib/...` import paths onto the vendored module path.
/// `stdlib/iter` moved to `stdlib/iterator`; the old spelling is kept
/// working here.
pub fn remap_import_path(path: &str) -> String {
    if path == "stdlib/iter" {
        return format!("{}/iterator", STDLIB_VENDOR_PREFIX);
    }
    if let Some(rest) = path.strip_prefix("stdlib/") {
        return format!("{}/{}", STDLIB_VENDOR_PREFIX, rest);
    }
    path.to_string()
}

/// The local name an import binds without an explicit alias: the last path
/// segment, skipping a `vN` major-version suffix, and trimming a `.vN`
/// dot-version.
pub fn import_local_name(path: &str) -> String {
    let path = remap_import_path(path);
    let segments: Vec<&str> = path.split('/').collect();
    let mut name = *segments.last().unwrap_or(&"");
    let is_major_suffix = name.len() > 1
        && name.starts_with('v')
        && name[1..].chars().all(|c| c.is_ascii_digit());
    if is_major_suffix && segments.len() >= 2 {
        name = segments[segments.len() - 2];
    }
    if let Some(i) = name.find(".v") {
        let digits = &name[i + 2..];
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            name = &name[..i];
        }
    }
    name.to_string()
}

/// Everything the analyzer learned, handed to the code generator.
#[derive(Debug, Default)]
pub struct Analysis {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    /// Value arity of call-like expressions, keyed by [`ExprId`].
    /// Absent entries mean 1.
    pub expr_return_counts: HashMap<ExprId, usize>,
}

pub struct Analyzer<'int> {
    interner: &'int Interner,
    scopes: ScopeStack,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    counts: HashMap<ExprId, usize>,
    /// Calls whose count fell back to the default because the callee is
    /// unknown; an attached `onerr` clause may override these.
    defaulted: HashSet<ExprId>,
    imports: HashMap<String, String>,
    struct_fields: HashMap<String, Vec<(String, TypeInfo)>>,
    methods: HashMap<(String, String), FunctionType>,
    package_name: Option<String>,
    current_returns: Vec<TypeInfo>,
    in_function: bool,
    loop_depth: u32,
    switch_depth: u32,
    in_onerr: bool,
    onerr_binding: String,
    in_http_handler: bool,
    is_test_file: bool,
    is_stdlib_file: bool,
}

/// Runs both analyzer passes over `program`.
pub fn analyze(program: &Program<'_>, interner: &Interner, filename: &str) -> Analysis {
    let mut analyzer = Analyzer::new(interner, filename);
    analyzer.collect(program);
    analyzer.check(program);
    Analysis {
        errors: analyzer.errors,
        warnings: analyzer.warnings,
        expr_return_counts: analyzer.counts,
    }
}

impl<'int> Analyzer<'int> {
    fn new(interner: &'int Interner, filename: &str) -> Self {
        Analyzer {
            interner,
            scopes: ScopeStack::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            counts: HashMap::new(),
            defaulted: HashSet::new(),
            imports: HashMap::new(),
            struct_fields: HashMap::new(),
            methods: HashMap::new(),
            package_name: None,
            current_returns: Vec::new(),
            in_function: false,
            loop_depth: 0,
            switch_depth: 0,
            in_onerr: false,
            onerr_binding: "error".to_string(),
            in_http_handler: false,
            is_test_file: filename.ends_with("_test.kuki"),
            is_stdlib_file: filename.starts_with("stdlib/") || filename.contains("/stdlib/"),
        }
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.errors.push(Diagnostic::error(message, span));
    }

    fn warn(&mut self, message: impl Into<String>, span: Span) {
        self.warnings.push(Diagnostic::warning(message, span));
    }

    fn resolve_str(&self, sym: kukicha_base::Symbol) -> &str {
        self.interner.resolve(sym)
    }

    fn lookup(&self, name: &str) -> Option<SymbolInfo> {
        self.scopes.resolve(name).cloned()
    }

    // =========================================================================
    // Pass 1: collection
    // =========================================================================

    fn collect(&mut self, program: &Program<'_>) {
        if let Some(pkg) = &program.package {
            self.package_name = Some(self.resolve_str(pkg.name).to_string());
        }

        for import in &program.imports {
            let path = self.resolve_str(import.path).to_string();
            let local = import
                .alias
                .map(|a| self.resolve_str(a).to_string())
                .unwrap_or_else(|| import_local_name(&path));
            self.imports.insert(local.clone(), path);
            self.scopes.define_unchecked(SymbolInfo::new(
                local,
                SymbolKind::Import,
                TypeInfo::Unknown,
                import.span,
            ));
        }

        for decl in &program.decls {
            match decl {
                Decl::Function(f) => self.collect_function(f),
                Decl::Type { name, kind, span } => {
                    let name_str = self.resolve_str(*name).to_string();
                    self.check_stdlib_shadow(&name_str, *span);
                    if let TypeDeclKind::Struct(fields) = kind {
                        let field_types: Vec<(String, TypeInfo)> = fields
                            .iter()
                            .map(|f| {
                                (
                                    self.resolve_str(f.name).to_string(),
                                    TypeInfo::from_annotation(f.ty, self.interner),
                                )
                            })
                            .collect();
                        self.struct_fields.insert(name_str.clone(), field_types);
                    }
                    let ty = match kind {
                        TypeDeclKind::Struct(_) => TypeInfo::Struct(name_str.clone()),
                        TypeDeclKind::Alias(_) => TypeInfo::Named(name_str.clone()),
                    };
                    self.define_top_level(name_str, SymbolKind::Type, ty, *span);
                }
                Decl::Interface(i) => {
                    let name_str = self.resolve_str(i.name).to_string();
                    self.check_stdlib_shadow(&name_str, i.span);
                    for sig in &i.methods {
                        let method = self.resolve_str(sig.name).to_string();
                        let ftype = FunctionType {
                            params: sig
                                .params
                                .iter()
                                .map(|p| self.param_type(p))
                                .collect(),
                            returns: sig
                                .returns
                                .iter()
                                .map(|r| TypeInfo::from_annotation(r, self.interner))
                                .collect(),
                            variadic: sig.params.iter().any(|p| p.variadic),
                            param_names: sig
                                .params
                                .iter()
                                .map(|p| self.resolve_str(p.name).to_string())
                                .collect(),
                            default_count: 0,
                        };
                        self.methods.insert((name_str.clone(), method), ftype);
                    }
                    self.define_top_level(
                        name_str.clone(),
                        SymbolKind::Interface,
                        TypeInfo::Interface(name_str),
                        i.span,
                    );
                }
                Decl::GlobalVar { name, ty, span, .. } => {
                    let name_str = self.resolve_str(*name).to_string();
                    self.check_stdlib_shadow(&name_str, *span);
                    let ty = ty
                        .map(|t| TypeInfo::from_annotation(t, self.interner))
                        .unwrap_or(TypeInfo::Unknown);
                    self.define_top_level(name_str, SymbolKind::Variable, ty, *span);
                }
            }
        }

        if let Some(skill) = &program.skill {
            self.check_skill(skill, program);
        }
    }

    fn collect_function(&mut self, f: &FunctionDecl<'_>) {
        let name = self.resolve_str(f.name).to_string();
        let ftype = self.function_type(f);
        match &f.receiver {
            Some(recv) => {
                let type_name = self.resolve_str(recv.type_name).to_string();
                self.methods.insert((type_name, name), ftype);
            }
            None => {
                self.check_stdlib_shadow(&name, f.span);
                self.define_top_level(
                    name,
                    SymbolKind::Function,
                    TypeInfo::Function(Box::new(ftype)),
                    f.span,
                );
            }
        }
    }

    fn function_type(&self, f: &FunctionDecl<'_>) -> FunctionType {
        FunctionType {
            params: f.params.iter().map(|p| self.param_type(p)).collect(),
            returns: f
                .returns
                .iter()
                .map(|r| TypeInfo::from_annotation(r, self.interner))
                .collect(),
            variadic: f.params.iter().any(|p| p.variadic),
            param_names: f
                .params
                .iter()
                .map(|p| self.resolve_str(p.name).to_string())
                .collect(),
            default_count: f.params.iter().filter(|p| p.default.is_some()).count(),
        }
    }

    fn param_type(&self, p: &kukicha_language::ast::Param<'_>) -> TypeInfo {
        p.ty
            .map(|t| TypeInfo::from_annotation(t, self.interner))
            .unwrap_or(TypeInfo::Unknown)
    }

    fn define_top_level(&mut self, name: String, kind: SymbolKind, ty: TypeInfo, span: Span) {
        if let Some(existing) = self.scopes.resolve_local(&name) {
            if existing.kind == SymbolKind::Import {
                // A declaration shadowing an imported package name is
                // legal; the code generator re-aliases the import.
                self.scopes.define_unchecked(SymbolInfo::new(name, kind, ty, span));
                return;
            }
            self.error(format!("duplicate name '{}' in this scope", name), span);
            return;
        }
        self.scopes.define_unchecked(SymbolInfo::new(name, kind, ty, span));
    }

    fn check_stdlib_shadow(&mut self, name: &str, span: Span) {
        if !self.is_stdlib_file && GO_STDLIB_PACKAGES.contains(&name) {
            self.warn(
                format!(
                    "name '{}' shadows the Go standard library package of the same name",
                    name
                ),
                span,
            );
        }
    }

    fn check_skill(&mut self, skill: &kukicha_language::ast::SkillDecl, program: &Program<'_>) {
        let name = self.resolve_str(skill.name).to_string();
        if program.package.is_none() {
            self.error(
                format!("skill '{}' requires a package declaration", name),
                skill.span,
            );
        }
        if !name.chars().next().is_some_and(|c| c.is_uppercase()) {
            self.error(
                format!("skill name '{}' must be exported (start with an uppercase letter)", name),
                skill.span,
            );
        }
        let mut has_description = false;
        for option in &skill.options {
            let key = self.resolve_str(option.key).to_string();
            match key.as_str() {
                "description" => has_description = true,
                "version" => {
                    let version = self.resolve_str(option.value).to_string();
                    if !is_basic_semver(&version) {
                        self.warn(
                            format!("skill version '{}' is not MAJOR.MINOR[.PATCH]", version),
                            option.span,
                        );
                    }
                }
                _ => {}
            }
        }
        if !has_description {
            self.warn(format!("skill '{}' is missing a description", name), skill.span);
        }
    }

    // =========================================================================
    // Pass 2: analysis
    // =========================================================================

    fn check(&mut self, program: &Program<'_>) {
        for decl in &program.decls {
            match decl {
                Decl::Function(f) => self.check_function(f),
                Decl::GlobalVar { name, ty, value, span } => {
                    if let Some(value) = value {
                        let value_ty = self.infer_expr(value);
                        if let Some(ann) = ty {
                            let ann_ty = TypeInfo::from_annotation(ann, self.interner);
                            if !TypeInfo::compatible(&ann_ty, &value_ty) {
                                self.error(
                                    format!(
                                        "type mismatch: '{}' is declared {} but initialized with {}",
                                        self.resolve_str(*name),
                                        ann_ty,
                                        value_ty
                                    ),
                                    *span,
                                );
                            }
                        }
                    }
                    if let Some(ann) = ty {
                        self.validate_type(ann);
                    }
                }
                Decl::Type { kind, .. } => match kind {
                    TypeDeclKind::Struct(fields) => {
                        for field in fields {
                            self.validate_type(field.ty);
                        }
                    }
                    TypeDeclKind::Alias(ty) => self.validate_type(ty),
                },
                Decl::Interface(i) => {
                    for sig in &i.methods {
                        for p in &sig.params {
                            if let Some(ty) = p.ty {
                                self.validate_type(ty);
                            }
                        }
                        for r in &sig.returns {
                            self.validate_type(r);
                        }
                    }
                }
            }
        }
    }

    fn check_function(&mut self, f: &FunctionDecl<'_>) {
        for p in &f.params {
            if let Some(ty) = p.ty {
                self.validate_type(ty);
            }
        }
        for r in &f.returns {
            self.validate_type(r);
        }

        let saved_returns = std::mem::replace(
            &mut self.current_returns,
            f.returns
                .iter()
                .map(|r| TypeInfo::from_annotation(r, self.interner))
                .collect(),
        );
        let saved_in_function = std::mem::replace(&mut self.in_function, true);
        let saved_handler = self.in_http_handler;
        self.in_http_handler = f
            .params
            .iter()
            .any(|p| p.ty.is_some_and(|t| lints::is_response_writer(t, self.interner)));

        self.scopes.enter();
        if let Some(recv) = &f.receiver {
            let type_name = self.resolve_str(recv.type_name).to_string();
            if self.scopes.resolve(&type_name).is_none() {
                self.error(
                    format!("invalid receiver: undefined type '{}'", type_name),
                    recv.span,
                );
            }
            let recv_ty = if recv.reference {
                TypeInfo::Reference(Box::new(TypeInfo::Named(type_name.clone())))
            } else {
                TypeInfo::Named(type_name)
            };
            let recv_name = self.resolve_str(recv.name).to_string();
            self.scopes.define_unchecked(SymbolInfo::new(
                recv_name,
                SymbolKind::Parameter,
                recv_ty.clone(),
                recv.span,
            ));
            self.scopes.define_unchecked(SymbolInfo::new(
                "this",
                SymbolKind::Parameter,
                recv_ty,
                recv.span,
            ));
        }
        for p in &f.params {
            let mut ty = self.param_type(p);
            if p.variadic {
                ty = TypeInfo::List(Box::new(ty));
            }
            if let Some(default) = p.default {
                let default_ty = self.infer_expr(default);
                if !TypeInfo::compatible(&ty, &default_ty) {
                    self.error(
                        format!(
                            "type mismatch: default for '{}' is {}, parameter is {}",
                            self.resolve_str(p.name),
                            default_ty,
                            ty
                        ),
                        p.span,
                    );
                }
            }
            let name = self.resolve_str(p.name).to_string();
            let symbol = SymbolInfo::new(name.clone(), SymbolKind::Parameter, ty, p.span);
            if self.scopes.define(symbol).is_err() {
                self.error(format!("duplicate name '{}' in this scope", name), p.span);
            }
        }

        self.check_block(f.body);
        self.scopes.exit();

        self.current_returns = saved_returns;
        self.in_function = saved_in_function;
        self.in_http_handler = saved_handler;
    }

    fn check_block(&mut self, block: &[Stmt<'_>]) {
        self.scopes.enter();
        for stmt in block {
            self.check_stmt(stmt);
        }
        self.scopes.exit();
    }

    fn check_stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Block { body, .. } => self.check_block(body),
            Stmt::VarDecl { names, ty, value, onerr, span } => {
                self.check_var_decl(names, *ty, *value, onerr.as_ref(), *span);
            }
            Stmt::Assign { targets, value, onerr, span } => {
                let target_tys: Vec<TypeInfo> =
                    targets.iter().map(|t| self.infer_expr(t)).collect();
                let value_ty = self.infer_expr(value);
                let expected = targets.len() + usize::from(onerr.is_some());
                self.settle_call_arity(value, expected, targets.len(), *span);
                if targets.len() == 1 && onerr.is_none() {
                    if !TypeInfo::compatible(&target_tys[0], &value_ty) {
                        self.error(
                            format!(
                                "type mismatch: cannot assign {} to {}",
                                value_ty, target_tys[0]
                            ),
                            *span,
                        );
                    }
                }
                if let Some(onerr) = onerr {
                    self.check_onerr(onerr, value, *span);
                }
            }
            Stmt::Return { values, span } => self.check_return(values, *span),
            Stmt::If { cond, then_block, else_branch, .. } => {
                self.require_bool(cond);
                self.check_block(then_block);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch);
                }
            }
            Stmt::Switch { subject, cases, .. } => {
                let subject_ty = subject.map(|s| self.infer_expr(s));
                self.switch_depth += 1;
                let mut seen_default = false;
                for case in cases {
                    if case.values.is_empty() {
                        seen_default = true;
                    } else {
                        if seen_default {
                            self.error(
                                "'when' branch after 'otherwise' is unreachable",
                                case.span,
                            );
                        }
                        for value in &case.values {
                            let value_ty = self.infer_expr(value);
                            match &subject_ty {
                                Some(subject_ty) => {
                                    if !TypeInfo::compatible(subject_ty, &value_ty) {
                                        self.error(
                                            format!(
                                                "type mismatch: 'when' value is {}, switch subject is {}",
                                                value_ty, subject_ty
                                            ),
                                            value.span(),
                                        );
                                    }
                                }
                                None => {
                                    if !matches!(value_ty, TypeInfo::Bool | TypeInfo::Unknown) {
                                        self.error(
                                            format!(
                                                "condition must be a bool, found {}",
                                                value_ty
                                            ),
                                            value.span(),
                                        );
                                    }
                                }
                            }
                        }
                    }
                    self.check_block(case.body);
                }
                self.switch_depth -= 1;
            }
            Stmt::TypeSwitch { subject, binding, cases, .. } => {
                self.infer_expr(subject);
                self.switch_depth += 1;
                let mut seen_default = false;
                for case in cases {
                    match case.ty {
                        Some(ty) => {
                            if seen_default {
                                self.error(
                                    "'when' branch after 'otherwise' is unreachable",
                                    case.span,
                                );
                            }
                            self.validate_type(ty);
                        }
                        None => seen_default = true,
                    }
                    self.scopes.enter();
                    let name = self.resolve_str(*binding).to_string();
                    self.scopes.define_unchecked(SymbolInfo::new(
                        name,
                        SymbolKind::Variable,
                        TypeInfo::Unknown,
                        case.span,
                    ));
                    for s in case.body {
                        self.check_stmt(s);
                    }
                    self.scopes.exit();
                }
                self.switch_depth -= 1;
            }
            Stmt::ForRange { index, item, collection, body, span } => {
                let coll_ty = self.infer_expr(collection);
                let elem_ty = match &coll_ty {
                    TypeInfo::List(elem) => (**elem).clone(),
                    _ => TypeInfo::Unknown,
                };
                self.scopes.enter();
                if let Some(index) = index {
                    let name = self.resolve_str(*index).to_string();
                    if name != "_" {
                        self.scopes.define_unchecked(SymbolInfo::new(
                            name,
                            SymbolKind::Variable,
                            TypeInfo::Int,
                            *span,
                        ));
                    }
                }
                let item_name = self.resolve_str(*item).to_string();
                if item_name != "_" {
                    self.scopes.define_unchecked(SymbolInfo::new(
                        item_name,
                        SymbolKind::Variable,
                        elem_ty,
                        *span,
                    ));
                }
                self.loop_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
                self.scopes.exit();
            }
            Stmt::ForNumeric { var, start, end, body, span, .. } => {
                let start_ty = self.infer_expr(start);
                let end_ty = self.infer_expr(end);
                for (ty, expr) in [(start_ty, start), (end_ty, end)] {
                    if !ty.is_numeric() {
                        self.error(
                            format!("loop bound must be numeric, found {}", ty),
                            expr.span(),
                        );
                    }
                }
                self.scopes.enter();
                let name = self.resolve_str(*var).to_string();
                self.scopes.define_unchecked(SymbolInfo::new(
                    name,
                    SymbolKind::Variable,
                    TypeInfo::Int,
                    *span,
                ));
                self.loop_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
                self.scopes.exit();
            }
            Stmt::ForCondition { cond, body, .. } => {
                self.require_bool(cond);
                self.loop_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
            }
            Stmt::ForInfinite { body, .. } => {
                self.loop_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
            }
            Stmt::Defer { call, .. } => {
                if call.call_id().is_none() {
                    self.error("'defer' requires a function call", call.span());
                }
                self.infer_expr(call);
            }
            Stmt::Go { call, block, .. } => {
                if let Some(call) = call {
                    if call.call_id().is_none() {
                        self.error("'go' requires a function call", call.span());
                    }
                    self.infer_expr(call);
                }
                if let Some(block) = block {
                    let saved_loop = std::mem::take(&mut self.loop_depth);
                    let saved_switch = std::mem::take(&mut self.switch_depth);
                    self.check_block(block);
                    self.loop_depth = saved_loop;
                    self.switch_depth = saved_switch;
                }
            }
            Stmt::Send { value, chan, span } => {
                let value_ty = self.infer_expr(value);
                let chan_ty = self.infer_expr(chan);
                match chan_ty {
                    TypeInfo::Channel(elem) => {
                        if !TypeInfo::compatible(&elem, &value_ty) {
                            self.error(
                                format!(
                                    "type mismatch: cannot send {} on channel of {}",
                                    value_ty, elem
                                ),
                                *span,
                            );
                        }
                    }
                    TypeInfo::Unknown => {}
                    other => {
                        self.error(format!("'send' requires a channel, found {}", other), *span)
                    }
                }
            }
            Stmt::Receive { name, chan, span } => {
                let chan_ty = self.infer_expr(chan);
                let elem_ty = match chan_ty {
                    TypeInfo::Channel(elem) => *elem,
                    TypeInfo::Unknown => TypeInfo::Unknown,
                    other => {
                        self.error(
                            format!("'receive' requires a channel, found {}", other),
                            *span,
                        );
                        TypeInfo::Unknown
                    }
                };
                let name = self.resolve_str(*name).to_string();
                if name != "_" {
                    self.scopes.define_unchecked(SymbolInfo::new(
                        name,
                        SymbolKind::Variable,
                        elem_ty,
                        *span,
                    ));
                }
            }
            Stmt::Select { cases, .. } => {
                for case in cases {
                    match &case.op {
                        Some(kukicha_language::ast::SelectOp::Receive { name, chan }) => {
                            let chan_ty = self.infer_expr(chan);
                            let elem_ty = match chan_ty {
                                TypeInfo::Channel(elem) => *elem,
                                _ => TypeInfo::Unknown,
                            };
                            self.scopes.enter();
                            let name = self.resolve_str(*name).to_string();
                            if name != "_" {
                                self.scopes.define_unchecked(SymbolInfo::new(
                                    name,
                                    SymbolKind::Variable,
                                    elem_ty,
                                    case.span,
                                ));
                            }
                            for s in case.body {
                                self.check_stmt(s);
                            }
                            self.scopes.exit();
                        }
                        Some(kukicha_language::ast::SelectOp::Send { value, chan }) => {
                            self.infer_expr(value);
                            self.infer_expr(chan);
                            self.check_block(case.body);
                        }
                        None => self.check_block(case.body),
                    }
                }
            }
            Stmt::Break { span } => {
                if self.loop_depth == 0 && self.switch_depth == 0 {
                    self.error("'break' outside a loop or switch", *span);
                }
            }
            Stmt::Continue { span } => {
                if self.loop_depth == 0 {
                    self.error("'continue' outside a loop", *span);
                }
            }
            Stmt::IncDec { target, span, .. } => {
                let ty = self.infer_expr(target);
                if !ty.is_numeric() {
                    self.error(format!("'++'/'--' requires a numeric target, found {}", ty), *span);
                }
            }
            Stmt::Expr { expr, onerr, span } => {
                self.infer_expr(expr);
                if let Some(onerr) = onerr {
                    // Any arity works as a statement (value positions are
                    // discarded), as long as there is an error to catch.
                    match expr.call_id() {
                        Some(id) => {
                            let k = self.counts.get(&id).copied().unwrap_or(1);
                            if !self.defaulted.contains(&id) {
                                let single_non_error = k == 1
                                    && self.call_return_types(expr).is_some_and(|rets| {
                                        rets.len() == 1
                                            && !rets[0].is_error()
                                            && !rets[0].is_unknown()
                                    });
                                if k == 0 || single_non_error {
                                    self.error(
                                        "`onerr` requires an error-returning expression",
                                        *span,
                                    );
                                }
                            }
                        }
                        None => {
                            self.error("`onerr` requires a call expression", *span);
                        }
                    }
                    self.check_onerr(onerr, expr, *span);
                }
            }
        }
    }

    fn check_var_decl(
        &mut self,
        names: &[kukicha_base::Symbol],
        ty: Option<&TypeAnn<'_>>,
        value: Option<&Expr<'_>>,
        onerr: Option<&OnErr<'_>>,
        span: Span,
    ) {
        if let Some(ann) = ty {
            self.validate_type(ann);
        }
        let ann_ty = ty.map(|t| TypeInfo::from_annotation(t, self.interner));

        let mut position_types: Vec<TypeInfo> = Vec::new();
        if let Some(value) = value {
            let value_ty = self.infer_expr(value);
            let expected = names.len() + usize::from(onerr.is_some());
            self.settle_call_arity(value, expected, names.len(), span);
            position_types = self
                .call_return_types(value)
                .unwrap_or_else(|| vec![value_ty.clone()]);

            if let (Some(ann_ty), true) = (&ann_ty, names.len() == 1 && onerr.is_none()) {
                if !TypeInfo::compatible(ann_ty, &value_ty) {
                    self.error(
                        format!("type mismatch: expected {}, found {}", ann_ty, value_ty),
                        span,
                    );
                }
            }
        }

        for (i, name) in names.iter().enumerate() {
            let name = self.resolve_str(*name).to_string();
            if name == "_" {
                continue;
            }
            let ty = ann_ty
                .clone()
                .or_else(|| position_types.get(i).cloned())
                .unwrap_or(TypeInfo::Unknown);
            let symbol = SymbolInfo::new(name.clone(), SymbolKind::Variable, ty, span);
            if self.scopes.define(symbol).is_err() {
                self.error(format!("duplicate name '{}' in this scope", name), span);
            }
        }

        if let (Some(onerr), Some(value)) = (onerr, value) {
            self.check_onerr(onerr, value, span);
        }
    }

    /// Reconciles a call's inferred arity with what the binding expects.
    /// Known counts must match exactly; defaulted (unknown-callee) counts
    /// are overridden so the side table agrees with the lowering.
    fn settle_call_arity(
        &mut self,
        value: &Expr<'_>,
        expected: usize,
        bound_names: usize,
        span: Span,
    ) {
        let Some(id) = value.call_id() else {
            if expected > 1 && bound_names > 1 {
                self.error(
                    format!(
                        "expression yields 1 value but {} names are bound",
                        bound_names
                    ),
                    span,
                );
            }
            return;
        };
        let current = self.counts.get(&id).copied().unwrap_or(1);
        if self.defaulted.contains(&id) {
            if expected != current {
                self.counts.insert(id, expected);
            }
            return;
        }
        if expected != current {
            if expected > bound_names {
                // An onerr clause consumes the trailing error value.
                if current == 1 {
                    self.error("`onerr` requires an error-returning expression", span);
                } else {
                    self.error(
                        format!(
                            "expression yields {} values but {} names and an error handler are bound",
                            current, bound_names
                        ),
                        span,
                    );
                }
            } else {
                self.error(
                    format!(
                        "expression yields {} values but {} names are bound",
                        current, bound_names
                    ),
                    span,
                );
            }
        }
    }

    fn check_return(&mut self, values: &[&Expr<'_>], span: Span) {
        let value_tys: Vec<TypeInfo> = values.iter().map(|v| self.infer_expr(v)).collect();
        if !self.in_function {
            return;
        }
        let returns = self.current_returns.clone();
        if values.is_empty() {
            if !returns.is_empty() {
                self.error(
                    format!("missing return values: function returns {}", returns.len()),
                    span,
                );
            }
            return;
        }
        if returns.is_empty() {
            self.error("function has no return values", span);
            return;
        }
        if values.len() == returns.len() {
            for (i, (value_ty, ret_ty)) in value_tys.iter().zip(&returns).enumerate() {
                if !TypeInfo::compatible(value_ty, ret_ty) {
                    self.error(
                        format!(
                            "type mismatch: return value {} is {}, expected {}",
                            i + 1,
                            value_ty,
                            ret_ty
                        ),
                        values[i].span(),
                    );
                }
            }
            return;
        }
        if values.len() == 1 {
            if let Some(id) = values[0].call_id() {
                let count = self.counts.get(&id).copied().unwrap_or(1);
                if count == returns.len() || self.defaulted.contains(&id) {
                    return;
                }
            }
        }
        self.error(
            format!(
                "return value count mismatch: got {}, function returns {}",
                values.len(),
                returns.len()
            ),
            span,
        );
    }

    fn check_onerr(&mut self, onerr: &OnErr<'_>, _value: &Expr<'_>, span: Span) {
        let binding = onerr
            .alias
            .map(|a| self.resolve_str(a).to_string())
            .unwrap_or_else(|| "error".to_string());

        let saved_in_onerr = std::mem::replace(&mut self.in_onerr, true);
        let saved_binding = std::mem::replace(&mut self.onerr_binding, binding.clone());

        match &onerr.handler {
            OnErrHandler::Return(values) => {
                if values.is_empty() {
                    // Bare `onerr return` propagates the caught error; the
                    // enclosing function's last return must be error-typed.
                    // A function with no returns at all simply returns.
                    let ok = self.current_returns.is_empty()
                        || self.current_returns.last().is_some_and(|t| {
                            t.is_error() || t.is_unknown()
                        });
                    if !ok {
                        self.error(
                            "`onerr return` requires the enclosing function to return an error",
                            span,
                        );
                    }
                } else {
                    for value in values {
                        self.infer_expr(value);
                    }
                }
            }
            OnErrHandler::Panic(value) => {
                self.infer_expr(value);
                let package = self.package_name.clone().unwrap_or_else(|| "main".to_string());
                if package != "main" {
                    self.warn(
                        format!(
                            "`onerr panic` in package '{}' will terminate the calling program; return an error instead",
                            package
                        ),
                        span,
                    );
                }
            }
            OnErrHandler::Discard => {
                if !self.is_test_file {
                    self.warn(
                        "`onerr discard` silently swallows the error; handle or propagate it outside tests",
                        span,
                    );
                }
            }
            OnErrHandler::ErrorValue(value) => {
                let ty = self.infer_expr(value);
                if !TypeInfo::compatible(&ty, &TypeInfo::Str) {
                    self.error(
                        format!("'error' requires a string message, found {}", ty),
                        value.span(),
                    );
                }
            }
            OnErrHandler::Fallback(value) => {
                self.infer_expr(value);
            }
            OnErrHandler::Block(block) => {
                self.scopes.enter();
                self.scopes.define_unchecked(SymbolInfo::new(
                    binding,
                    SymbolKind::Variable,
                    TypeInfo::Named("error".to_string()),
                    span,
                ));
                for stmt in *block {
                    self.check_stmt(stmt);
                }
                self.scopes.exit();
            }
        }

        if let Some(explain) = onerr.explain {
            let ty = self.infer_expr(explain);
            if !TypeInfo::compatible(&ty, &TypeInfo::Str) {
                self.error(
                    format!("'explain' requires a string message, found {}", ty),
                    explain.span(),
                );
            }
        }

        self.in_onerr = saved_in_onerr;
        self.onerr_binding = saved_binding;
    }

    fn require_bool(&mut self, cond: &Expr<'_>) {
        let ty = self.infer_expr(cond);
        if !matches!(ty, TypeInfo::Bool | TypeInfo::Unknown) {
            self.error(format!("condition must be a bool, found {}", ty), cond.span());
        }
    }

    fn validate_type(&mut self, ann: &TypeAnn<'_>) {
        match ann {
            TypeAnn::Primitive { .. } => {}
            TypeAnn::Named { package, name, span } => {
                if package.is_some() {
                    // Qualified names are trusted when the package is
                    // imported; a missing import surfaces at the use site.
                    return;
                }
                let name = self.resolve_str(*name).to_string();
                if name == "any2" {
                    // Generic placeholder in stdlib sources.
                    return;
                }
                if self.scopes.resolve(&name).is_none() {
                    self.error(format!("undefined type '{}'", name), *span);
                }
            }
            TypeAnn::Reference { inner, .. } => self.validate_type(inner),
            TypeAnn::List { elem, .. } => self.validate_type(elem),
            TypeAnn::Map { key, value, .. } => {
                self.validate_type(key);
                self.validate_type(value);
            }
            TypeAnn::Channel { elem, .. } => self.validate_type(elem),
            TypeAnn::Function { params, returns, .. } => {
                for p in params {
                    self.validate_type(p);
                }
                for r in returns {
                    self.validate_type(r);
                }
            }
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn infer_expr(&mut self, expr: &Expr<'_>) -> TypeInfo {
        match expr {
            Expr::Identifier { name, span } => self.infer_identifier(*name, *span),
            Expr::IntLit { .. } => TypeInfo::Int,
            Expr::FloatLit { .. } => TypeInfo::Float,
            Expr::RuneLit { .. } => TypeInfo::Int,
            Expr::BoolLit { .. } => TypeInfo::Bool,
            Expr::StringLit { parts, span, .. } => {
                if let Some(parts) = parts {
                    self.check_interpolation(parts, *span);
                }
                TypeInfo::Str
            }
            Expr::Binary { op, lhs, rhs, span } => self.infer_binary(*op, lhs, rhs, *span),
            Expr::Unary { op, operand, span } => {
                let operand_ty = self.infer_expr(operand);
                match op {
                    UnaryOp::Not => {
                        if !matches!(operand_ty, TypeInfo::Bool | TypeInfo::Unknown) {
                            self.error(
                                format!("'not' requires a bool, found {}", operand_ty),
                                *span,
                            );
                        }
                        TypeInfo::Bool
                    }
                    UnaryOp::Neg => {
                        if !operand_ty.is_numeric() {
                            self.error(
                                format!("negation requires a number, found {}", operand_ty),
                                *span,
                            );
                        }
                        operand_ty
                    }
                }
            }
            Expr::Pipe { id, lhs, rhs, span } => {
                let piped_ty = self.infer_expr(lhs);
                let (result, count, defaulted) =
                    self.infer_call_like(rhs, Some(&piped_ty), *span);
                self.counts.insert(*id, count);
                if defaulted {
                    self.defaulted.insert(*id);
                }
                result
            }
            Expr::Call { .. } | Expr::MethodCall { .. } => {
                let (result, _, _) = self.infer_call_like(expr, None, expr.span());
                result
            }
            Expr::Index { base, index, span } => {
                let base_ty = self.infer_expr(base);
                let index_ty = self.infer_expr(index);
                match base_ty {
                    TypeInfo::List(elem) => {
                        if !TypeInfo::compatible(&index_ty, &TypeInfo::Int) {
                            self.error(
                                format!("list index must be an int, found {}", index_ty),
                                *span,
                            );
                        }
                        *elem
                    }
                    TypeInfo::Map(key, value) => {
                        if !TypeInfo::compatible(&index_ty, &key) {
                            self.error(
                                format!("map key must be {}, found {}", key, index_ty),
                                *span,
                            );
                        }
                        *value
                    }
                    TypeInfo::Str => TypeInfo::Int,
                    _ => TypeInfo::Unknown,
                }
            }
            Expr::Slice { base, start, end, .. } => {
                if let Some(start) = start {
                    self.infer_expr(start);
                }
                if let Some(end) = end {
                    self.infer_expr(end);
                }
                self.infer_expr(base)
            }
            Expr::Selector { base, field, .. } => {
                let base_ty = self.infer_expr(base);
                let field = self.resolve_str(*field).to_string();
                let struct_name = match &base_ty {
                    TypeInfo::Struct(name) | TypeInfo::Named(name) => Some(name.clone()),
                    TypeInfo::Reference(inner) => match inner.as_ref() {
                        TypeInfo::Struct(name) | TypeInfo::Named(name) => Some(name.clone()),
                        _ => None,
                    },
                    _ => None,
                };
                struct_name
                    .and_then(|name| {
                        self.struct_fields.get(&name).and_then(|fields| {
                            fields.iter().find(|(f, _)| *f == field).map(|(_, t)| t.clone())
                        })
                    })
                    .unwrap_or(TypeInfo::Unknown)
            }
            Expr::StructLit { package, name, fields, span } => {
                let name_str = self.resolve_str(*name).to_string();
                for (_, value) in fields {
                    self.infer_expr(value);
                }
                if package.is_none() {
                    if let Some(known) = self.struct_fields.get(&name_str).cloned() {
                        for (field, _) in fields {
                            let field = self.resolve_str(*field).to_string();
                            if !known.iter().any(|(f, _)| *f == field) {
                                self.error(
                                    format!(
                                        "unknown field '{}' on struct '{}'",
                                        field, name_str
                                    ),
                                    *span,
                                );
                            }
                        }
                        return TypeInfo::Struct(name_str);
                    }
                    if self.scopes.resolve(&name_str).is_none() {
                        self.error(format!("undefined type '{}'", name_str), *span);
                    }
                    return TypeInfo::Named(name_str);
                }
                TypeInfo::Named(format!(
                    "{}.{}",
                    self.resolve_str(package.unwrap()),
                    name_str
                ))
            }
            Expr::ListLit { elem_type, elems, .. } => {
                let declared =
                    elem_type.map(|t| TypeInfo::from_annotation(t, self.interner));
                let mut elem_ty = declared.clone().unwrap_or(TypeInfo::Unknown);
                for elem in elems {
                    let ty = self.infer_expr(elem);
                    if elem_ty.is_unknown() {
                        elem_ty = ty;
                    } else if !TypeInfo::compatible(&elem_ty, &ty) {
                        self.error(
                            format!("list element is {}, expected {}", ty, elem_ty),
                            elem.span(),
                        );
                    }
                }
                TypeInfo::List(Box::new(elem_ty))
            }
            Expr::MapLit { key_type, value_type, entries, .. } => {
                let mut key_ty = key_type
                    .map(|t| TypeInfo::from_annotation(t, self.interner))
                    .unwrap_or(TypeInfo::Unknown);
                let mut value_ty = value_type
                    .map(|t| TypeInfo::from_annotation(t, self.interner))
                    .unwrap_or(TypeInfo::Unknown);
                for (k, v) in entries {
                    let kt = self.infer_expr(k);
                    let vt = self.infer_expr(v);
                    if key_ty.is_unknown() {
                        key_ty = kt;
                    }
                    if value_ty.is_unknown() {
                        value_ty = vt;
                    }
                }
                TypeInfo::Map(Box::new(key_ty), Box::new(value_ty))
            }
            Expr::FunctionLit { params, returns, body, .. } => {
                let returns_ty: Vec<TypeInfo> = returns
                    .iter()
                    .map(|r| TypeInfo::from_annotation(r, self.interner))
                    .collect();
                let params_ty: Vec<TypeInfo> =
                    params.iter().map(|p| self.param_type(p)).collect();
                let saved_returns =
                    std::mem::replace(&mut self.current_returns, returns_ty.clone());
                let saved_in_function = std::mem::replace(&mut self.in_function, true);
                let saved_loop = std::mem::take(&mut self.loop_depth);
                let saved_switch = std::mem::take(&mut self.switch_depth);
                self.scopes.enter();
                for p in params {
                    let name = self.resolve_str(p.name).to_string();
                    let ty = self.param_type(p);
                    self.scopes.define_unchecked(SymbolInfo::new(
                        name,
                        SymbolKind::Parameter,
                        ty,
                        p.span,
                    ));
                }
                self.check_block(body);
                self.scopes.exit();
                self.current_returns = saved_returns;
                self.in_function = saved_in_function;
                self.loop_depth = saved_loop;
                self.switch_depth = saved_switch;
                TypeInfo::Function(Box::new(FunctionType {
                    params: params_ty,
                    returns: returns_ty,
                    variadic: false,
                    param_names: params
                        .iter()
                        .map(|p| self.resolve_str(p.name).to_string())
                        .collect(),
                    default_count: 0,
                }))
            }
            Expr::ArrowLambda { params, body, .. } => {
                let params_ty: Vec<TypeInfo> =
                    params.iter().map(|p| self.param_type(p)).collect();
                let saved_returns =
                    std::mem::replace(&mut self.current_returns, vec![TypeInfo::Unknown]);
                let saved_in_function = std::mem::replace(&mut self.in_function, true);
                self.scopes.enter();
                for p in params {
                    let name = self.resolve_str(p.name).to_string();
                    let ty = self.param_type(p);
                    self.scopes.define_unchecked(SymbolInfo::new(
                        name,
                        SymbolKind::Parameter,
                        ty,
                        p.span,
                    ));
                }
                let return_ty = match body {
                    LambdaBody::Expr(e) => self.infer_expr(e),
                    LambdaBody::Block(block) => {
                        for stmt in *block {
                            self.check_stmt(stmt);
                        }
                        TypeInfo::Unknown
                    }
                };
                self.scopes.exit();
                self.current_returns = saved_returns;
                self.in_function = saved_in_function;
                TypeInfo::Function(Box::new(FunctionType {
                    params: params_ty,
                    returns: vec![return_ty],
                    variadic: false,
                    param_names: params
                        .iter()
                        .map(|p| self.resolve_str(p.name).to_string())
                        .collect(),
                    default_count: 0,
                }))
            }
            Expr::Make { ty, args, .. } => {
                for arg in args {
                    self.infer_expr(arg);
                }
                self.validate_type(ty);
                TypeInfo::from_annotation(ty, self.interner)
            }
            Expr::Receive { chan, span } => {
                let chan_ty = self.infer_expr(chan);
                match chan_ty {
                    TypeInfo::Channel(elem) => *elem,
                    TypeInfo::Unknown => TypeInfo::Unknown,
                    other => {
                        self.error(
                            format!("'receive' requires a channel, found {}", other),
                            *span,
                        );
                        TypeInfo::Unknown
                    }
                }
            }
            Expr::AddressOf { operand, .. } => {
                TypeInfo::Reference(Box::new(self.infer_expr(operand)))
            }
            Expr::Dereference { operand, span } => {
                let ty = self.infer_expr(operand);
                match ty {
                    TypeInfo::Reference(inner) => *inner,
                    TypeInfo::Unknown => TypeInfo::Unknown,
                    other => {
                        self.error(
                            format!("'dereference' requires a reference, found {}", other),
                            *span,
                        );
                        TypeInfo::Unknown
                    }
                }
            }
            Expr::Empty { ty, .. } => ty
                .map(|t| {
                    self.validate_type(t);
                    TypeInfo::from_annotation(t, self.interner)
                })
                .unwrap_or(TypeInfo::Unknown),
            Expr::Panic { value, .. } => {
                self.infer_expr(value);
                TypeInfo::Unknown
            }
            Expr::ErrorNew { message, .. } => {
                let ty = self.infer_expr(message);
                if !TypeInfo::compatible(&ty, &TypeInfo::Str) {
                    self.error(
                        format!("'error' requires a string message, found {}", ty),
                        message.span(),
                    );
                }
                TypeInfo::Named("error".to_string())
            }
            Expr::Recover { .. } => TypeInfo::Named("any".to_string()),
            Expr::Close { chan, span } => {
                let ty = self.infer_expr(chan);
                if !matches!(ty, TypeInfo::Channel(_) | TypeInfo::Unknown) {
                    self.error(format!("'close' requires a channel, found {}", ty), *span);
                }
                TypeInfo::Unknown
            }
            Expr::TypeAssertion { base, ty, .. } => {
                self.infer_expr(base);
                self.validate_type(ty);
                TypeInfo::from_annotation(ty, self.interner)
            }
            Expr::TypeCast { base, ty, .. } => {
                self.infer_expr(base);
                self.validate_type(ty);
                TypeInfo::from_annotation(ty, self.interner)
            }
        }
    }

    fn infer_identifier(&mut self, name: kukicha_base::Symbol, span: Span) -> TypeInfo {
        let name = self.resolve_str(name).to_string();
        if name == "_" {
            return TypeInfo::Unknown;
        }
        if let Some(symbol) = self.lookup(&name) {
            return symbol.ty;
        }
        if BUILTINS.iter().any(|(b, _)| *b == name) {
            return TypeInfo::Unknown;
        }
        if self.in_onerr && name == self.onerr_binding {
            return TypeInfo::Named("error".to_string());
        }
        let mut message = format!("undefined identifier '{}'", name);
        let visible = self.scopes.visible_names();
        if let Some(suggestion) = find_similar(&name, &visible, 2) {
            message.push_str(&format!("; did you mean '{}'?", suggestion));
        }
        self.error(message, span);
        TypeInfo::Unknown
    }

    fn infer_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr<'_>,
        rhs: &Expr<'_>,
        span: Span,
    ) -> TypeInfo {
        let lhs_ty = self.infer_expr(lhs);
        let rhs_ty = self.infer_expr(rhs);
        match op {
            BinaryOp::Add => {
                if lhs_ty == TypeInfo::Str && rhs_ty == TypeInfo::Str {
                    return TypeInfo::Str;
                }
                if lhs_ty.is_numeric() && rhs_ty.is_numeric() {
                    return TypeInfo::widen(&lhs_ty, &rhs_ty);
                }
                if !TypeInfo::compatible(&lhs_ty, &rhs_ty) {
                    self.error(
                        format!("cannot add {} and {}", lhs_ty, rhs_ty),
                        span,
                    );
                }
                TypeInfo::Unknown
            }
            BinaryOp::Sub | BinaryOp::Div | BinaryOp::Mod => {
                if !lhs_ty.is_numeric() || !rhs_ty.is_numeric() {
                    self.error(
                        format!("arithmetic requires numbers, found {} and {}", lhs_ty, rhs_ty),
                        span,
                    );
                    return TypeInfo::Unknown;
                }
                TypeInfo::widen(&lhs_ty, &rhs_ty)
            }
            BinaryOp::Mul => {
                // `30 * Second`: a product with exactly one named operand
                // takes the named type, so duration math reads naturally.
                match (&lhs_ty, &rhs_ty) {
                    (TypeInfo::Named(_), other) if !matches!(other, TypeInfo::Named(_)) => {
                        return lhs_ty;
                    }
                    (other, TypeInfo::Named(_)) if !matches!(other, TypeInfo::Named(_)) => {
                        return rhs_ty;
                    }
                    _ => {}
                }
                if !lhs_ty.is_numeric() || !rhs_ty.is_numeric() {
                    self.error(
                        format!("arithmetic requires numbers, found {} and {}", lhs_ty, rhs_ty),
                        span,
                    );
                    return TypeInfo::Unknown;
                }
                TypeInfo::widen(&lhs_ty, &rhs_ty)
            }
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq
            | BinaryOp::GtEq => {
                if !TypeInfo::compatible(&lhs_ty, &rhs_ty) {
                    self.error(
                        format!("cannot compare {} with {}", lhs_ty, rhs_ty),
                        span,
                    );
                }
                TypeInfo::Bool
            }
            BinaryOp::And | BinaryOp::Or => {
                for ty in [&lhs_ty, &rhs_ty] {
                    if !matches!(ty, TypeInfo::Bool | TypeInfo::Unknown) {
                        self.error(
                            format!("logical operator requires bools, found {}", ty),
                            span,
                        );
                    }
                }
                TypeInfo::Bool
            }
            BinaryOp::In => {
                match &rhs_ty {
                    TypeInfo::List(elem) => {
                        if !TypeInfo::compatible(elem, &lhs_ty) {
                            self.error(
                                format!(
                                    "'in' requires a matching element type: {} in list of {}",
                                    lhs_ty, elem
                                ),
                                span,
                            );
                        }
                    }
                    TypeInfo::Map(key, _) => {
                        if !TypeInfo::compatible(key, &lhs_ty) {
                            self.error(
                                format!(
                                    "'in' requires a matching key type: {} in map of {}",
                                    lhs_ty, key
                                ),
                                span,
                            );
                        }
                    }
                    TypeInfo::Str | TypeInfo::Unknown => {}
                    other => {
                        self.error(
                            format!("'in' requires a list, map or string, found {}", other),
                            span,
                        );
                    }
                }
                TypeInfo::Bool
            }
        }
    }

    /// Infers a call-like expression (call, method call, or a bare pipe
    /// callee), optionally with a piped first argument. Returns the result
    /// type, the value arity, and whether the arity is a default for an
    /// unknown callee; the arity is also recorded in the side table.
    fn infer_call_like(
        &mut self,
        expr: &Expr<'_>,
        piped: Option<&TypeInfo>,
        span: Span,
    ) -> (TypeInfo, usize, bool) {
        match expr {
            Expr::Call { id, callee, args, spread, .. } => {
                let (ty, count) = self.infer_call(*id, callee, args, *spread, piped, span);
                (ty, count, self.defaulted.contains(id))
            }
            Expr::MethodCall { id, recv, method, args, spread, .. } => {
                let (ty, count) =
                    self.infer_method_call(*id, recv, *method, args, *spread, piped, span);
                (ty, count, self.defaulted.contains(id))
            }
            // A bare identifier as a pipe stage: `data |> print`.
            Expr::Identifier { name, .. } if piped.is_some() => {
                let name_str = self.resolve_str(*name).to_string();
                if let Some((_, arity)) = BUILTINS.iter().find(|(b, _)| *b == name_str) {
                    return (TypeInfo::Unknown, *arity, false);
                }
                match self.lookup(&name_str) {
                    Some(SymbolInfo { ty: TypeInfo::Function(sig), .. }) => {
                        let count = sig.returns.len();
                        let result = sig.returns.first().cloned().unwrap_or(TypeInfo::Unknown);
                        (result, count, false)
                    }
                    Some(_) => (TypeInfo::Unknown, 1, true),
                    // Unknown pipe target: tolerated like any unknown
                    // callee; it may live in another file of the package.
                    None => (TypeInfo::Unknown, 1, true),
                }
            }
            _ => {
                if piped.is_some() {
                    self.error(
                        "right side of '|>' must be a call or a function name",
                        span,
                    );
                }
                (self.infer_expr(expr), 1, false)
            }
        }
    }

    fn infer_call(
        &mut self,
        id: ExprId,
        callee: &Expr<'_>,
        args: &[Arg<'_>],
        spread: bool,
        piped: Option<&TypeInfo>,
        span: Span,
    ) -> (TypeInfo, usize) {
        for arg in args {
            self.infer_expr(arg.value);
        }

        // A pipe placeholder replaces `_` instead of prepending, so it
        // contributes no extra argument.
        let piped = if args.iter().any(|a| a.value.is_placeholder(self.interner)) {
            None
        } else {
            piped
        };

        if let Expr::Identifier { name, .. } = callee {
            let name_str = self.resolve_str(*name).to_string();
            if self.lookup(&name_str).is_none() {
                if let Some((builtin, arity)) =
                    BUILTINS.iter().find(|(b, _)| *b == name_str)
                {
                    self.counts.insert(id, *arity);
                    let result = match *builtin {
                        "len" => TypeInfo::Int,
                        "append" => args
                            .first()
                            .map(|a| self.peek_type(a.value))
                            .unwrap_or(TypeInfo::Unknown),
                        _ => TypeInfo::Unknown,
                    };
                    return (result, *arity);
                }
                // Unknown callee: tolerated, it may be declared in another
                // file of the same package. Arity defaults and an attached
                // onerr clause may override it.
                self.counts.insert(id, 1);
                self.defaulted.insert(id);
                return (TypeInfo::Unknown, 1);
            }

            let symbol = self.lookup(&name_str).unwrap();
            if let TypeInfo::Function(sig) = symbol.ty {
                self.validate_call(&name_str, &sig, args, spread, piped, true, span);
                let count = sig.returns.len();
                self.counts.insert(id, count);
                let result = sig.returns.first().cloned().unwrap_or(TypeInfo::Unknown);
                return (result, count);
            }
            // Calling a non-function symbol (a lambda variable, a value of
            // unknown type): arity unknown.
            self.counts.insert(id, 1);
            self.defaulted.insert(id);
            return (TypeInfo::Unknown, 1);
        }

        let callee_ty = self.infer_expr(callee);
        if let TypeInfo::Function(sig) = callee_ty {
            let count = sig.returns.len();
            self.counts.insert(id, count.max(1));
            return (
                sig.returns.first().cloned().unwrap_or(TypeInfo::Unknown),
                count,
            );
        }
        self.counts.insert(id, 1);
        self.defaulted.insert(id);
        (TypeInfo::Unknown, 1)
    }

    fn infer_method_call(
        &mut self,
        id: ExprId,
        recv: &Expr<'_>,
        method: kukicha_base::Symbol,
        args: &[Arg<'_>],
        spread: bool,
        piped: Option<&TypeInfo>,
        span: Span,
    ) -> (TypeInfo, usize) {
        for arg in args {
            self.infer_expr(arg.value);
        }
        let method_str = self.resolve_str(method).to_string();
        let arg_values: Vec<&Expr<'_>> = args.iter().map(|a| a.value).collect();
        let piped = if args.iter().any(|a| a.value.is_placeholder(self.interner)) {
            None
        } else {
            piped
        };

        // Package-qualified call: `strings.Split(...)`.
        if let Expr::Identifier { name, .. } = recv {
            let recv_name = self.resolve_str(*name).to_string();
            let is_import = self
                .lookup(&recv_name)
                .is_some_and(|s| s.kind == SymbolKind::Import);
            if is_import {
                let qualified = format!("{}.{}", recv_name, method_str);
                if args.iter().any(|a| a.name.is_some()) {
                    self.error(
                        format!(
                            "named arguments are only supported for locally declared functions; call '{}' with positional arguments",
                            qualified
                        ),
                        span,
                    );
                }
                if let Some(warning) = lints::check_call(
                    Some(&qualified),
                    Some(&method_str),
                    &arg_values,
                    self.in_http_handler,
                ) {
                    self.warn(warning, span);
                }
                return match registry::return_count(&qualified) {
                    Some(count) => {
                        self.counts.insert(id, count);
                        (TypeInfo::Unknown, count)
                    }
                    None => {
                        self.counts.insert(id, 1);
                        self.defaulted.insert(id);
                        (TypeInfo::Unknown, 1)
                    }
                };
            }
        }

        let recv_ty = self.infer_expr(recv);
        if let Some(warning) =
            lints::check_call(None, Some(&method_str), &arg_values, self.in_http_handler)
        {
            self.warn(warning, span);
        }

        let type_name = match &recv_ty {
            TypeInfo::Struct(name) | TypeInfo::Named(name) | TypeInfo::Interface(name) => {
                Some(name.clone())
            }
            TypeInfo::Reference(inner) => match inner.as_ref() {
                TypeInfo::Struct(name) | TypeInfo::Named(name) => Some(name.clone()),
                _ => None,
            },
            _ => None,
        };
        if let Some(type_name) = type_name {
            if let Some(sig) = self.methods.get(&(type_name.clone(), method_str.clone())).cloned()
            {
                self.validate_call(&method_str, &sig, args, spread, piped, true, span);
                let count = sig.returns.len();
                self.counts.insert(id, count);
                return (
                    sig.returns.first().cloned().unwrap_or(TypeInfo::Unknown),
                    count,
                );
            }
        }

        match registry::method_return_count(&method_str) {
            Some(count) => {
                self.counts.insert(id, count);
                (TypeInfo::Unknown, count)
            }
            None => {
                self.counts.insert(id, 1);
                self.defaulted.insert(id);
                (TypeInfo::Unknown, 1)
            }
        }
    }

    /// Arity and named-argument validation against a known signature.
    fn validate_call(
        &mut self,
        name: &str,
        sig: &FunctionType,
        args: &[Arg<'_>],
        spread: bool,
        piped: Option<&TypeInfo>,
        local: bool,
        span: Span,
    ) {
        let total = sig.params.len();
        let required = total.saturating_sub(sig.default_count);
        let positional = args.iter().filter(|a| a.name.is_none()).count()
            + usize::from(piped.is_some());
        let named = args.len() - args.iter().filter(|a| a.name.is_none()).count();
        let supplied = positional + named;

        if sig.variadic {
            let non_variadic = total.saturating_sub(1);
            if spread {
                if supplied < non_variadic + 1 {
                    self.error(
                        format!(
                            "function '{}' expects at least {} argument(s) with 'many', got {}",
                            name,
                            non_variadic + 1,
                            supplied
                        ),
                        span,
                    );
                }
            } else if supplied < required.saturating_sub(1) {
                self.error(
                    format!(
                        "function '{}' expects at least {} argument(s), got {}",
                        name,
                        required.saturating_sub(1),
                        supplied
                    ),
                    span,
                );
            }
        } else if supplied < required || supplied > total {
            if required == total {
                self.error(
                    format!(
                        "function '{}' expects {} argument(s), got {}",
                        name, total, supplied
                    ),
                    span,
                );
            } else {
                self.error(
                    format!(
                        "function '{}' expects between {} and {} argument(s), got {}",
                        name, required, total, supplied
                    ),
                    span,
                );
            }
        }

        if spread {
            if let (Some(last), TypeInfo::List(elem)) = (
                args.last(),
                sig.params.last().cloned().map(|t| TypeInfo::List(Box::new(t))).unwrap_or(TypeInfo::Unknown),
            ) {
                let last_ty = self.peek_type(last.value);
                if !TypeInfo::compatible(&last_ty, &TypeInfo::List(elem.clone())) {
                    self.error(
                        format!("spread argument must be a list of {}, found {}", elem, last_ty),
                        span,
                    );
                }
            }
        }

        // Named arguments: locals only, no duplicates, no rebinding of a
        // position already filled positionally.
        let mut seen: Vec<String> = Vec::new();
        for arg in args {
            let Some(arg_name) = arg.name else { continue };
            let arg_name = self.resolve_str(arg_name).to_string();
            if !local {
                continue;
            }
            let Some(index) = sig.param_names.iter().position(|p| *p == arg_name) else {
                self.error(
                    format!("no parameter named '{}' on function '{}'", arg_name, name),
                    span,
                );
                continue;
            };
            if seen.contains(&arg_name) {
                self.error(
                    format!("parameter '{}' bound more than once", arg_name),
                    span,
                );
            }
            if index < positional {
                self.error(
                    format!(
                        "parameter '{}' is already bound by a positional argument",
                        arg_name
                    ),
                    span,
                );
            }
            seen.push(arg_name);
        }
    }

    /// A lightweight second look at an already-analyzed expression; no
    /// diagnostics are emitted.
    fn peek_type(&mut self, expr: &Expr<'_>) -> TypeInfo {
        match expr {
            Expr::Identifier { name, .. } => {
                let name = self.resolve_str(*name).to_string();
                self.lookup(&name).map(|s| s.ty).unwrap_or(TypeInfo::Unknown)
            }
            Expr::IntLit { .. } => TypeInfo::Int,
            Expr::FloatLit { .. } => TypeInfo::Float,
            Expr::StringLit { .. } => TypeInfo::Str,
            Expr::BoolLit { .. } => TypeInfo::Bool,
            Expr::ListLit { .. } => TypeInfo::List(Box::new(TypeInfo::Unknown)),
            _ => TypeInfo::Unknown,
        }
    }

    /// Return types of a call-like expression when the callee is locally
    /// known, for positional typing of multi-name declarations.
    fn call_return_types(&mut self, expr: &Expr<'_>) -> Option<Vec<TypeInfo>> {
        match expr {
            Expr::Call { callee, .. } => {
                if let Expr::Identifier { name, .. } = callee {
                    let name = self.resolve_str(*name).to_string();
                    if let Some(SymbolInfo { ty: TypeInfo::Function(sig), .. }) =
                        self.lookup(&name)
                    {
                        return Some(sig.returns.clone());
                    }
                }
                None
            }
            Expr::Pipe { rhs, .. } => self.call_return_types(rhs),
            _ => None,
        }
    }

    fn check_interpolation(&mut self, parts: &[StrPart], span: Span) {
        for part in parts {
            if let StrPart::Hole { text, span: hole_span } = part {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    self.error("empty interpolation hole in string literal", *hole_span);
                } else if self.in_onerr && trimmed == "err" {
                    self.warn(
                        format!(
                            "interpolation hole '{{err}}' inside an onerr block: the caught error is named '{}'",
                            self.onerr_binding
                        ),
                        *hole_span,
                    );
                }
                let _ = span;
            }
        }
    }
}

fn is_basic_semver(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    (2..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}
