//! Expression lowering.
//!
//! Expressions render to strings and compose bottom-up; parentheses are
//! re-introduced from operator precedence rather than carried through the
//! AST. String interpolation re-tokenizes each hole's text as an
//! expression here, per the front end's contract: the analyzer only
//! checked that holes are non-empty.

use kukicha_base::{Arena, Span};
use kukicha_language::arena_ctx::AstContext;
use kukicha_language::ast::{Arg, BinaryOp, Expr, LambdaBody, UnaryOp};
use kukicha_language::token::StrPart;
use kukicha_language::{Lexer, Parser};

use super::{GenError, Generator};

/// Binding strength for parenthesization, mirroring Go's precedence.
fn binary_prec(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Or => 1,
        BinaryOp::And => 2,
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq
        | BinaryOp::GtEq | BinaryOp::In => 3,
        BinaryOp::Add | BinaryOp::Sub => 4,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 5,
    }
}

fn expr_prec(expr: &Expr<'_>) -> u8 {
    match expr {
        Expr::Binary { op, .. } => binary_prec(*op),
        Expr::Unary { .. } | Expr::Receive { .. } | Expr::AddressOf { .. }
        | Expr::Dereference { .. } => 6,
        _ => 7,
    }
}

impl<'a, 'int> Generator<'a, 'int> {
    pub(crate) fn gen_expr(&mut self, expr: &Expr<'_>) -> Result<String, GenError> {
        match expr {
            Expr::Identifier { name, .. } => {
                let name = self.interner.resolve(*name).to_string();
                if name == "this" {
                    if let Some(recv) = &self.receiver_name {
                        return Ok(recv.clone());
                    }
                }
                Ok(name)
            }
            Expr::IntLit { text, .. } | Expr::FloatLit { text, .. } => {
                Ok(self.interner.resolve(*text).to_string())
            }
            Expr::StringLit { text, parts, span } => match parts {
                None => {
                    let text = self.interner.resolve(*text).to_string();
                    Ok(Self::go_quote(&text))
                }
                Some(parts) => self.gen_interpolation(parts, *span),
            },
            Expr::RuneLit { text, .. } => {
                let text = self.interner.resolve(*text).to_string();
                Ok(Self::go_quote_rune(&text))
            }
            Expr::BoolLit { value, .. } => {
                Ok(if *value { "true" } else { "false" }.to_string())
            }
            Expr::Binary { op, lhs, rhs, span } => self.gen_binary(*op, lhs, rhs, *span),
            Expr::Unary { op, operand, .. } => {
                let operand_str = self.gen_operand(operand, 6)?;
                Ok(match op {
                    UnaryOp::Not => format!("!{}", operand_str),
                    UnaryOp::Neg => format!("-{}", operand_str),
                })
            }
            Expr::Pipe { lhs, rhs, span, .. } => self.gen_pipe(lhs, rhs, *span),
            Expr::Call { callee, args, spread, span, .. } => {
                self.gen_call(callee, args, *spread, None, *span)
            }
            Expr::MethodCall { recv, method, args, spread, span, .. } => {
                self.gen_method_call(recv, *method, args, *spread, None, *span)
            }
            Expr::Index { base, index, .. } => {
                let base = self.gen_operand(base, 7)?;
                let index = self.gen_expr(index)?;
                Ok(format!("{}[{}]", base, index))
            }
            Expr::Slice { base, start, end, .. } => {
                let base = self.gen_operand(base, 7)?;
                let start = match start {
                    Some(start) => self.gen_expr(start)?,
                    None => String::new(),
                };
                let end = match end {
                    Some(end) => self.gen_expr(end)?,
                    None => String::new(),
                };
                Ok(format!("{}[{}:{}]", base, start, end))
            }
            Expr::Selector { base, field, .. } => {
                let base = self.gen_qualifier(base)?;
                let field = self.interner.resolve(*field).to_string();
                Ok(format!("{}.{}", base, field))
            }
            Expr::StructLit { package, name, fields, .. } => {
                let name = self.interner.resolve(*name).to_string();
                let head = match package {
                    Some(pkg) => {
                        let pkg = self.interner.resolve(*pkg).to_string();
                        format!("{}.{}", self.package_ref(&pkg), name)
                    }
                    None => name,
                };
                let mut parts = Vec::new();
                for (field, value) in fields {
                    let field = self.interner.resolve(*field).to_string();
                    let value = self.gen_expr(value)?;
                    parts.push(format!("{}: {}", field, value));
                }
                Ok(format!("{}{{{}}}", head, parts.join(", ")))
            }
            Expr::ListLit { elem_type, elems, .. } => {
                let elem = match elem_type {
                    Some(ty) => self.gen_type(ty),
                    None => elems
                        .first()
                        .map(|e| self.literal_elem_type(e))
                        .unwrap_or_else(|| "any".to_string()),
                };
                let mut parts = Vec::new();
                for e in elems {
                    parts.push(self.gen_expr(e)?);
                }
                Ok(format!("[]{}{{{}}}", elem, parts.join(", ")))
            }
            Expr::MapLit { key_type, value_type, entries, .. } => {
                let key = match key_type {
                    Some(ty) => self.gen_type(ty),
                    None => entries
                        .first()
                        .map(|(k, _)| self.literal_elem_type(k))
                        .unwrap_or_else(|| "any".to_string()),
                };
                let value = match value_type {
                    Some(ty) => self.gen_type(ty),
                    None => entries
                        .first()
                        .map(|(_, v)| self.literal_elem_type(v))
                        .unwrap_or_else(|| "any".to_string()),
                };
                let mut parts = Vec::new();
                for (k, v) in entries {
                    let k = self.gen_expr(k)?;
                    let v = self.gen_expr(v)?;
                    parts.push(format!("{}: {}", k, v));
                }
                Ok(format!("map[{}]{}{{{}}}", key, value, parts.join(", ")))
            }
            Expr::FunctionLit { params, returns, body, .. } => {
                let params = self.gen_params(params);
                let returns = self.gen_returns(returns);
                let rendered = self.render_block(body)?;
                Ok(format!(
                    "func({}){} {{\n{}{}}}",
                    params,
                    returns,
                    rendered,
                    self.indent_prefix()
                ))
            }
            Expr::ArrowLambda { params, body, .. } => {
                let params = self.gen_params(params);
                match body {
                    LambdaBody::Expr(e) => {
                        let e = self.gen_expr(e)?;
                        Ok(format!("func({}) any {{ return {} }}", params, e))
                    }
                    LambdaBody::Block(block) => {
                        let rendered = self.render_block(block)?;
                        Ok(format!(
                            "func({}) {{\n{}{}}}",
                            params,
                            rendered,
                            self.indent_prefix()
                        ))
                    }
                }
            }
            Expr::Make { ty, args, .. } => {
                let ty = self.gen_type(ty);
                let mut parts = vec![ty];
                for arg in args {
                    parts.push(self.gen_expr(arg)?);
                }
                Ok(format!("make({})", parts.join(", ")))
            }
            Expr::Receive { chan, .. } => {
                let chan = self.gen_operand(chan, 7)?;
                Ok(format!("<-{}", chan))
            }
            Expr::AddressOf { operand, .. } => {
                let operand = self.gen_operand(operand, 7)?;
                Ok(format!("&{}", operand))
            }
            Expr::Dereference { operand, .. } => {
                let operand = self.gen_operand(operand, 7)?;
                Ok(format!("*{}", operand))
            }
            Expr::Empty { ty, .. } => match ty {
                Some(ty) => Ok(self.zero_value(ty)),
                None => {
                    if let Some(index) = self.return_index() {
                        if let Some(ann) = self.return_annotation(index) {
                            return Ok(self.zero_value(ann));
                        }
                    }
                    Ok("nil".to_string())
                }
            },
            Expr::Panic { value, .. } => {
                let value = self.gen_expr(value)?;
                Ok(format!("panic({})", value))
            }
            Expr::ErrorNew { message, .. } => self.gen_error_value(message),
            Expr::Recover { .. } => Ok("recover()".to_string()),
            Expr::Close { chan, .. } => {
                let chan = self.gen_expr(chan)?;
                Ok(format!("close({})", chan))
            }
            Expr::TypeAssertion { base, ty, .. } => {
                let base = self.gen_operand(base, 7)?;
                let ty = self.gen_type(ty);
                Ok(format!("{}.({})", base, ty))
            }
            Expr::TypeCast { base, ty, .. } => {
                let base = self.gen_expr(base)?;
                let ty = self.gen_type(ty);
                Ok(format!("{}({})", ty, base))
            }
        }
    }

    /// Renders a subexpression, parenthesizing when it binds more loosely
    /// than its context.
    fn gen_operand(&mut self, expr: &Expr<'_>, context_prec: u8) -> Result<String, GenError> {
        let rendered = self.gen_expr(expr)?;
        if expr_prec(expr) < context_prec {
            Ok(format!("({})", rendered))
        } else {
            Ok(rendered)
        }
    }

    fn gen_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr<'_>,
        rhs: &Expr<'_>,
        _span: Span,
    ) -> Result<String, GenError> {
        if op == BinaryOp::In {
            // Membership lowers to a stdlib call.
            self.auto_imports.insert("slices");
            let needle = self.gen_expr(lhs)?;
            let haystack = self.gen_expr(rhs)?;
            return Ok(format!("slices.Contains({}, {})", haystack, needle));
        }
        let prec = binary_prec(op);
        let lhs = self.gen_operand(lhs, prec)?;
        // Right operand needs parens at equal precedence to preserve
        // left-associative evaluation of - / %.
        let rhs_rendered = self.gen_expr(rhs)?;
        let rhs = if expr_prec(rhs) <= prec {
            format!("({})", rhs_rendered)
        } else {
            rhs_rendered
        };
        let symbol = op.go_symbol().expect("non-in operator has a Go spelling");
        Ok(format!("{} {} {}", lhs, symbol, rhs))
    }

    // =========================================================================
    // Calls and pipes
    // =========================================================================

    fn gen_call(
        &mut self,
        callee: &Expr<'_>,
        args: &[Arg<'_>],
        spread: bool,
        piped: Option<String>,
        span: Span,
    ) -> Result<String, GenError> {
        let _ = span;
        if let Expr::Identifier { name, .. } = callee {
            let name = self.interner.resolve(*name).to_string();
            if name == "print" && self.local_function("print").is_none() {
                self.auto_imports.insert("fmt");
                let rendered = self.render_args(args, spread, piped, None)?;
                return Ok(format!("fmt.Println({})", rendered));
            }
            let decl = self.local_function(&name);
            let rendered = self.render_args(args, spread, piped, decl)?;
            return Ok(format!("{}({})", name, rendered));
        }
        let callee = self.gen_operand(callee, 7)?;
        let rendered = self.render_args(args, spread, piped, None)?;
        Ok(format!("{}({})", callee, rendered))
    }

    fn gen_method_call(
        &mut self,
        recv: &Expr<'_>,
        method: kukicha_base::Symbol,
        args: &[Arg<'_>],
        spread: bool,
        piped: Option<String>,
        _span: Span,
    ) -> Result<String, GenError> {
        let method_str = self.interner.resolve(method).to_string();
        let recv_str = self.gen_qualifier(recv)?;
        // Named-argument reordering and default filling only apply to calls
        // on local receivers; `pkg.Func(...)` keeps its written arguments.
        let import_qualified = match recv {
            Expr::Identifier { name, .. } => {
                let name = self.interner.resolve(*name).to_string();
                self.import_names.contains(&name)
            }
            _ => false,
        };
        let decl = if import_qualified {
            None
        } else {
            self.local_function(&method_str)
        };
        let rendered = self.render_args(args, spread, piped, decl)?;
        Ok(format!("{}.{}({})", recv_str, method_str, rendered))
    }

    /// A selector/method-call base; import package names go through the
    /// collision-alias table.
    fn gen_qualifier(&mut self, base: &Expr<'_>) -> Result<String, GenError> {
        if let Expr::Identifier { name, .. } = base {
            let name = self.interner.resolve(*name).to_string();
            if self.import_names.contains(&name) {
                return Ok(self.package_ref(&name));
            }
        }
        self.gen_operand(base, 7)
    }

    /// Renders an argument list: the piped value first (or in place of the
    /// `_` placeholder), named arguments reordered to positions for local
    /// functions, omitted trailing defaults filled in, and a `...` spread
    /// suffix on the final argument.
    fn render_args(
        &mut self,
        args: &[Arg<'_>],
        spread: bool,
        piped: Option<String>,
        decl: Option<&'a kukicha_language::ast::FunctionDecl<'a>>,
    ) -> Result<String, GenError> {
        let has_placeholder = args
            .iter()
            .any(|a| a.value.is_placeholder(self.interner));

        let mut rendered: Vec<String> = Vec::new();
        let mut named: Vec<(String, String)> = Vec::new();

        if let (Some(piped), false) = (&piped, has_placeholder) {
            rendered.push(piped.clone());
        }
        for arg in args {
            let value = if arg.value.is_placeholder(self.interner) {
                match &piped {
                    Some(piped) => piped.clone(),
                    None => self.gen_expr(arg.value)?,
                }
            } else {
                self.gen_expr(arg.value)?
            };
            match arg.name {
                Some(name) => {
                    named.push((self.interner.resolve(name).to_string(), value));
                }
                None => rendered.push(value),
            }
        }

        // Positions for named arguments and defaults for omitted ones are
        // only known for locally declared functions.
        if let Some(decl) = decl {
            if !named.is_empty() || decl.params.iter().any(|p| p.default.is_some()) {
                let positional_count = rendered.len();
                for (index, param) in decl.params.iter().enumerate() {
                    if index < positional_count {
                        continue;
                    }
                    let param_name = self.interner.resolve(param.name).to_string();
                    if let Some((_, value)) =
                        named.iter().find(|(name, _)| *name == param_name)
                    {
                        rendered.push(value.clone());
                    } else if let Some(default) = param.default {
                        rendered.push(self.gen_expr(default)?);
                    }
                }
                named.clear();
            }
        }
        // Any remaining named arguments (unknown callee) keep their written
        // order; the analyzer has already reported them.
        for (_, value) in named {
            rendered.push(value);
        }

        if spread {
            if let Some(last) = rendered.last_mut() {
                last.push_str("...");
            }
        }
        Ok(rendered.join(", "))
    }

    /// `L |> R`: the piped value becomes the first argument of `R`, or
    /// replaces a `_` placeholder, or turns a bare callee into a call.
    fn gen_pipe(
        &mut self,
        lhs: &Expr<'_>,
        rhs: &Expr<'_>,
        span: Span,
    ) -> Result<String, GenError> {
        let piped = self.gen_expr(lhs)?;
        match rhs {
            Expr::Call { callee, args, spread, span, .. } => {
                self.gen_call(callee, args, *spread, Some(piped), *span)
            }
            Expr::MethodCall { recv, method, args, spread, span, .. } => {
                self.gen_method_call(recv, *method, args, *spread, Some(piped), *span)
            }
            Expr::Identifier { .. } | Expr::Selector { .. } => {
                if let Expr::Identifier { name, .. } = rhs {
                    let name = self.interner.resolve(*name).to_string();
                    if name == "print" && self.local_function("print").is_none() {
                        self.auto_imports.insert("fmt");
                        return Ok(format!("fmt.Println({})", piped));
                    }
                }
                let callee = self.gen_qualifier_or_expr(rhs)?;
                Ok(format!("{}({})", callee, piped))
            }
            other => Err(GenError::new(
                "right side of '|>' must be a call or a function name",
                other.span().merge(span),
            )),
        }
    }

    fn gen_qualifier_or_expr(&mut self, expr: &Expr<'_>) -> Result<String, GenError> {
        match expr {
            Expr::Selector { base, field, .. } => {
                let base = self.gen_qualifier(base)?;
                let field = self.interner.resolve(*field).to_string();
                Ok(format!("{}.{}", base, field))
            }
            _ => self.gen_expr(expr),
        }
    }

    // =========================================================================
    // Strings and interpolation
    // =========================================================================

    /// Lowers an interpolated literal to `fmt.Sprintf("… %v …", args…)`.
    fn gen_interpolation(
        &mut self,
        parts: &[StrPart],
        span: Span,
    ) -> Result<String, GenError> {
        self.auto_imports.insert("fmt");
        let (format_str, args) = self.interpolation_parts(parts, span)?;
        Ok(format!(
            "fmt.Sprintf({}, {})",
            Self::go_quote(&format_str),
            args.join(", ")
        ))
    }

    /// Splits interpolation parts into a `%v` format string and rendered
    /// hole expressions.
    pub(crate) fn interpolation_parts(
        &mut self,
        parts: &[StrPart],
        span: Span,
    ) -> Result<(String, Vec<String>), GenError> {
        let mut format_str = String::new();
        let mut args = Vec::new();
        for part in parts {
            match part {
                StrPart::Text(text) => {
                    format_str.push_str(&text.replace('%', "%%"));
                }
                StrPart::Hole { text, span: hole_span } => {
                    format_str.push_str("%v");
                    args.push(self.gen_hole_expr(text, *hole_span)?);
                }
            }
        }
        if args.is_empty() {
            return Err(GenError::new(
                "interpolated string has no holes",
                span,
            ));
        }
        Ok((format_str, args))
    }

    /// Re-tokenizes one hole's raw text as an expression and renders it.
    /// `{error}` (or the active alias) resolves to the Go-side error
    /// variable inside an onerr handler.
    fn gen_hole_expr(&mut self, text: &str, span: Span) -> Result<String, GenError> {
        let trimmed = text.trim();
        if trimmed == "error" {
            if let Some(err_var) = &self.onerr_var {
                return Ok(err_var.clone());
            }
        }

        let (tokens, lex_errors) = Lexer::new(trimmed, self.interner).tokenize();
        if !lex_errors.is_empty() {
            return Err(GenError::new(
                format!("cannot tokenize interpolation hole '{{{}}}'", trimmed),
                span,
            ));
        }
        let exprs = Arena::new();
        let stmts = Arena::new();
        let types = Arena::new();
        let ctx = AstContext::new(&exprs, &stmts, &types);
        let parser = Parser::new(tokens, self.interner, ctx);
        match parser.parse_single_expression() {
            Ok(expr) => self.gen_expr(expr),
            Err(_) => Err(GenError::new(
                format!("cannot parse interpolation hole '{{{}}}'", trimmed),
                span,
            )),
        }
    }

    /// `error EXPR` and the `onerr error EXPR` handler produce an error
    /// value: `errors.New` for plain messages, `fmt.Errorf` when the
    /// message interpolates.
    pub(crate) fn gen_error_value(&mut self, message: &Expr<'_>) -> Result<String, GenError> {
        match message {
            Expr::StringLit { text, parts: None, .. } => {
                self.auto_imports.insert("errors");
                let text = self.interner.resolve(*text).to_string();
                Ok(format!("errors.New({})", Self::go_quote(&text)))
            }
            Expr::StringLit { parts: Some(parts), span, .. } => {
                self.auto_imports.insert("fmt");
                let (format_str, args) = self.interpolation_parts(parts, *span)?;
                Ok(format!(
                    "fmt.Errorf({}, {})",
                    Self::go_quote(&format_str),
                    args.join(", ")
                ))
            }
            other => {
                self.auto_imports.insert("errors");
                let message = self.gen_expr(other)?;
                Ok(format!("errors.New({})", message))
            }
        }
    }

    fn literal_elem_type(&self, expr: &Expr<'_>) -> String {
        match expr {
            Expr::IntLit { .. } => "int".to_string(),
            Expr::FloatLit { .. } => "float64".to_string(),
            Expr::StringLit { .. } => "string".to_string(),
            Expr::BoolLit { .. } => "bool".to_string(),
            Expr::RuneLit { .. } => "rune".to_string(),
            _ => "any".to_string(),
        }
    }

    /// Go string literal with kukicha escapes re-encoded.
    pub(crate) fn go_quote(text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 2);
        out.push('"');
        for c in text.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 => {
                    out.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => out.push(c),
            }
        }
        out.push('"');
        out
    }

    fn go_quote_rune(text: &str) -> String {
        let c = text.chars().next().unwrap_or('\0');
        match c {
            '\'' => "'\\''".to_string(),
            '\\' => "'\\\\'".to_string(),
            '\n' => "'\\n'".to_string(),
            '\r' => "'\\r'".to_string(),
            '\t' => "'\\t'".to_string(),
            c if (c as u32) < 0x20 => format!("'\\u{:04x}'", c as u32),
            c => format!("'{}'", c),
        }
    }
}
