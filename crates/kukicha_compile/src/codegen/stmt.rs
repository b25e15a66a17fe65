//! Statement lowering.
//!
//! The interesting case is the `onerr` clause: a statement
//! `x := CALL onerr HANDLER` destructures according to the analyzer's
//! inferred arity `k`, binding user names first, padding with `_`, and
//! keeping the error in the last position:
//!
//! ```text
//! x := load("a") onerr return      x, err := load("a")
//!                            ──▶   if err != nil {
//!                                      return
//!                                  }
//! ```
//!
//! `onerr discard` needs no branch at all — the error slot is bound to
//! `_`. Assignments to existing variables wrap the lowering in a bare
//! block so the error temporary never collides.

use kukicha_language::ast::{Expr, OnErr, OnErrHandler, SelectOp, Stmt};

use super::{GenError, Generator};

impl<'a, 'int> Generator<'a, 'int> {
    pub(crate) fn gen_stmt(&mut self, stmt: &Stmt<'_>) -> Result<(), GenError> {
        self.line_directive(stmt.span());
        match stmt {
            Stmt::Block { body, .. } => {
                self.write_line("{");
                self.indent_block(body)?;
                self.write_line("}");
                Ok(())
            }
            Stmt::VarDecl { names, ty, value, onerr, .. } => {
                let names: Vec<String> = names
                    .iter()
                    .map(|n| self.interner.resolve(*n).to_string())
                    .collect();
                match (value, onerr) {
                    (Some(value), Some(onerr)) => {
                        self.gen_onerr_binding(&names, value, onerr, true)
                    }
                    (Some(value), None) => {
                        let value_str = self.gen_expr(value)?;
                        if let (Some(ty), 1) = (ty, names.len()) {
                            let ty = self.gen_type(ty);
                            self.write_line(&format!(
                                "var {} {} = {}",
                                names[0], ty, value_str
                            ));
                        } else {
                            self.write_line(&format!(
                                "{} := {}",
                                names.join(", "),
                                value_str
                            ));
                        }
                        Ok(())
                    }
                    (None, _) => {
                        let ty = match ty {
                            Some(ty) => self.gen_type(ty),
                            None => "any".to_string(),
                        };
                        self.write_line(&format!("var {} {}", names.join(", "), ty));
                        Ok(())
                    }
                }
            }
            Stmt::Assign { targets, value, onerr, .. } => {
                let mut target_strs = Vec::new();
                for target in targets {
                    target_strs.push(self.gen_expr(target)?);
                }
                match onerr {
                    Some(onerr) => self.gen_onerr_binding(&target_strs, value, onerr, false),
                    None => {
                        let value_str = self.gen_expr(value)?;
                        self.write_line(&format!(
                            "{} = {}",
                            target_strs.join(", "),
                            value_str
                        ));
                        Ok(())
                    }
                }
            }
            Stmt::Return { values, .. } => {
                if values.is_empty() {
                    self.write_line("return");
                    return Ok(());
                }
                let positional = values.len() == self.returns_len();
                let mut parts = Vec::new();
                for (i, value) in values.iter().enumerate() {
                    self.set_return_index(positional.then_some(i));
                    parts.push(self.gen_expr(value)?);
                }
                self.set_return_index(None);
                self.write_line(&format!("return {}", parts.join(", ")));
                Ok(())
            }
            Stmt::If { cond, then_block, else_branch, .. } => {
                let cond = self.gen_expr(cond)?;
                self.write_line(&format!("if {} {{", cond));
                self.indent_block(then_block)?;
                let mut branch = *else_branch;
                loop {
                    match branch {
                        None => {
                            self.write_line("}");
                            break;
                        }
                        Some(Stmt::If { cond, then_block, else_branch, .. }) => {
                            let cond = self.gen_expr(cond)?;
                            self.write_line(&format!("}} else if {} {{", cond));
                            self.indent_block(then_block)?;
                            branch = *else_branch;
                        }
                        Some(Stmt::Block { body, .. }) => {
                            self.write_line("} else {");
                            self.indent_block(body)?;
                            self.write_line("}");
                            break;
                        }
                        Some(other) => {
                            return Err(GenError::new(
                                "malformed else branch",
                                other.span(),
                            ))
                        }
                    }
                }
                Ok(())
            }
            Stmt::Switch { subject, cases, .. } => {
                let head = match subject {
                    Some(subject) => format!("switch {} {{", self.gen_expr(subject)?),
                    None => "switch {".to_string(),
                };
                self.write_line(&head);
                for case in cases {
                    if case.values.is_empty() {
                        self.write_line("default:");
                    } else {
                        let mut values = Vec::new();
                        for value in &case.values {
                            values.push(self.gen_expr(value)?);
                        }
                        self.write_line(&format!("case {}:", values.join(", ")));
                    }
                    self.indent_block(case.body)?;
                }
                self.write_line("}");
                Ok(())
            }
            Stmt::TypeSwitch { subject, binding, cases, .. } => {
                let subject = self.gen_expr(subject)?;
                let binding = self.interner.resolve(*binding).to_string();
                self.write_line(&format!("switch {} := {}.(type) {{", binding, subject));
                for case in cases {
                    match case.ty {
                        Some(ty) => {
                            let ty = self.gen_type(ty);
                            self.write_line(&format!("case {}:", ty));
                        }
                        None => self.write_line("default:"),
                    }
                    self.indent_block(case.body)?;
                }
                self.write_line("}");
                Ok(())
            }
            Stmt::ForRange { index, item, collection, body, .. } => {
                let collection = self.gen_expr(collection)?;
                let index = match index {
                    Some(index) => self.interner.resolve(*index).to_string(),
                    None => "_".to_string(),
                };
                let item = self.interner.resolve(*item).to_string();
                self.write_line(&format!(
                    "for {}, {} := range {} {{",
                    index, item, collection
                ));
                self.indent_block(body)?;
                self.write_line("}");
                Ok(())
            }
            Stmt::ForNumeric { var, start, end, inclusive, body, .. } => {
                self.gen_for_numeric(var, start, end, *inclusive, body)
            }
            Stmt::ForCondition { cond, body, .. } => {
                let cond = self.gen_expr(cond)?;
                self.write_line(&format!("for {} {{", cond));
                self.indent_block(body)?;
                self.write_line("}");
                Ok(())
            }
            Stmt::ForInfinite { body, .. } => {
                self.write_line("for {");
                self.indent_block(body)?;
                self.write_line("}");
                Ok(())
            }
            Stmt::Defer { call, .. } => {
                let call = self.gen_expr(call)?;
                self.write_line(&format!("defer {}", call));
                Ok(())
            }
            Stmt::Go { call, block, .. } => {
                if let Some(call) = call {
                    let call = self.gen_expr(call)?;
                    self.write_line(&format!("go {}", call));
                }
                if let Some(block) = block {
                    self.write_line("go func() {");
                    self.indent_block(block)?;
                    self.write_line("}()");
                }
                Ok(())
            }
            Stmt::Send { value, chan, .. } => {
                let value = self.gen_expr(value)?;
                let chan = self.gen_expr(chan)?;
                self.write_line(&format!("{} <- {}", chan, value));
                Ok(())
            }
            Stmt::Receive { name, chan, .. } => {
                let name = self.interner.resolve(*name).to_string();
                let chan = self.gen_expr(chan)?;
                if name == "_" {
                    self.write_line(&format!("<-{}", chan));
                } else {
                    self.write_line(&format!("{} := <-{}", name, chan));
                }
                Ok(())
            }
            Stmt::Select { cases, .. } => {
                self.write_line("select {");
                for case in cases {
                    match &case.op {
                        Some(SelectOp::Receive { name, chan }) => {
                            let name = self.interner.resolve(*name).to_string();
                            let chan = self.gen_expr(chan)?;
                            if name == "_" {
                                self.write_line(&format!("case <-{}:", chan));
                            } else {
                                self.write_line(&format!("case {} := <-{}:", name, chan));
                            }
                        }
                        Some(SelectOp::Send { value, chan }) => {
                            let value = self.gen_expr(value)?;
                            let chan = self.gen_expr(chan)?;
                            self.write_line(&format!("case {} <- {}:", chan, value));
                        }
                        None => self.write_line("default:"),
                    }
                    self.indent_block(case.body)?;
                }
                self.write_line("}");
                Ok(())
            }
            Stmt::Break { .. } => {
                self.write_line("break");
                Ok(())
            }
            Stmt::Continue { .. } => {
                self.write_line("continue");
                Ok(())
            }
            Stmt::IncDec { target, increment, .. } => {
                let target = self.gen_expr(target)?;
                let op = if *increment { "++" } else { "--" };
                self.write_line(&format!("{}{}", target, op));
                Ok(())
            }
            Stmt::Expr { expr, onerr, .. } => match onerr {
                Some(onerr) => self.gen_onerr_expr_stmt(expr, onerr),
                None => {
                    let expr = self.gen_expr(expr)?;
                    self.write_line(&expr);
                    Ok(())
                }
            },
        }
    }

    fn indent_block(&mut self, block: &[Stmt<'_>]) -> Result<(), GenError> {
        self.indent += 1;
        for stmt in block {
            self.gen_stmt(stmt)?;
        }
        self.indent -= 1;
        Ok(())
    }

    // =========================================================================
    // Numeric for
    // =========================================================================

    fn static_int(expr: &Expr<'_>) -> Option<i64> {
        match expr {
            Expr::IntLit { value, .. } => *value,
            Expr::Unary { op: kukicha_language::ast::UnaryOp::Neg, operand, .. } => {
                Self::static_int(operand).map(|v| -v)
            }
            _ => None,
        }
    }

    /// `for i from A to B` iterates in whichever direction reaches B. When
    /// both bounds are literals the direction is decided here; otherwise a
    /// step variable handles both at runtime.
    fn gen_for_numeric(
        &mut self,
        var: &kukicha_base::Symbol,
        start: &Expr<'_>,
        end: &Expr<'_>,
        inclusive: bool,
        body: &[Stmt<'_>],
    ) -> Result<(), GenError> {
        let var = self.interner.resolve(*var).to_string();
        let start_str = self.gen_expr(start)?;
        let end_str = self.gen_expr(end)?;

        if let (Some(a), Some(b)) = (Self::static_int(start), Self::static_int(end)) {
            let line = if a <= b {
                let cmp = if inclusive { "<=" } else { "<" };
                format!(
                    "for {} := {}; {} {} {}; {}++ {{",
                    var, start_str, var, cmp, end_str, var
                )
            } else {
                let cmp = if inclusive { ">=" } else { ">" };
                format!(
                    "for {} := {}; {} {} {}; {}-- {{",
                    var, start_str, var, cmp, end_str, var
                )
            };
            self.write_line(&line);
            self.indent_block(body)?;
            self.write_line("}");
            return Ok(());
        }

        let (up, down) = if inclusive { ("<=", ">=") } else { ("<", ">") };
        self.write_line("{");
        self.indent += 1;
        self.write_line(&format!("kukStart, kukEnd := {}, {}", start_str, end_str));
        self.write_line("kukStep := 1");
        self.write_line("if kukStart > kukEnd {");
        self.indent += 1;
        self.write_line("kukStep = -1");
        self.indent -= 1;
        self.write_line("}");
        self.write_line(&format!(
            "for {} := kukStart; (kukStep > 0 && {} {} kukEnd) || (kukStep < 0 && {} {} kukEnd); {} += kukStep {{",
            var, var, up, var, down, var
        ));
        self.indent_block(body)?;
        self.write_line("}");
        self.indent -= 1;
        self.write_line("}");
        Ok(())
    }

    // =========================================================================
    // OnErr lowering
    // =========================================================================

    fn onerr_error_name(&mut self, onerr: &OnErr<'_>) -> String {
        onerr
            .alias
            .map(|a| self.interner.resolve(a).to_string())
            .unwrap_or_else(|| "err".to_string())
    }

    /// Arity of the bound call: the analyzer's side table, clamped so the
    /// lowering always has room for the user names plus the error.
    fn onerr_arity(&self, value: &Expr<'_>, bound: usize) -> usize {
        let inferred = value
            .call_id()
            .and_then(|id| self.count_of(id))
            .unwrap_or(bound + 1);
        inferred.max(bound + 1)
    }

    /// `names := CALL` (or `names = CALL` inside a scoping block) followed
    /// by the error check and handler.
    fn gen_onerr_binding(
        &mut self,
        names: &[String],
        value: &Expr<'_>,
        onerr: &OnErr<'_>,
        declare: bool,
    ) -> Result<(), GenError> {
        let k = self.onerr_arity(value, names.len());
        let err_var = self.onerr_error_name(onerr);
        let value_str = self.gen_expr(value)?;

        let mut binds: Vec<String> = names.to_vec();
        while binds.len() < k - 1 {
            binds.push("_".to_string());
        }

        if matches!(onerr.handler, OnErrHandler::Discard) {
            binds.push("_".to_string());
            let op = if declare { ":=" } else { "=" };
            self.write_line(&format!("{} {} {}", binds.join(", "), op, value_str));
            return Ok(());
        }

        binds.push(err_var.clone());
        if declare {
            self.write_line(&format!("{} := {}", binds.join(", "), value_str));
            self.write_line(&format!("if {} != nil {{", err_var));
            self.indent += 1;
            self.gen_onerr_body(names, &err_var, onerr)?;
            self.indent -= 1;
            self.write_line("}");
        } else {
            // Assignment to existing targets: scope the error temporary.
            self.write_line("{");
            self.indent += 1;
            self.write_line(&format!("var {} error", err_var));
            self.write_line(&format!("{} = {}", binds.join(", "), value_str));
            self.write_line(&format!("if {} != nil {{", err_var));
            self.indent += 1;
            self.gen_onerr_body(names, &err_var, onerr)?;
            self.indent -= 1;
            self.write_line("}");
            self.indent -= 1;
            self.write_line("}");
        }
        Ok(())
    }

    /// `CALL onerr H` as a statement: every value position is discarded.
    fn gen_onerr_expr_stmt(
        &mut self,
        value: &Expr<'_>,
        onerr: &OnErr<'_>,
    ) -> Result<(), GenError> {
        if matches!(onerr.handler, OnErrHandler::Discard) {
            // Calling and ignoring all results discards the error too.
            let value = self.gen_expr(value)?;
            self.write_line(&value);
            return Ok(());
        }

        let k = self.onerr_arity(value, 0);
        let err_var = self.onerr_error_name(onerr);
        let value_str = self.gen_expr(value)?;

        let mut binds: Vec<String> = Vec::new();
        while binds.len() < k - 1 {
            binds.push("_".to_string());
        }
        binds.push(err_var.clone());

        self.write_line(&format!(
            "if {} := {}; {} != nil {{",
            binds.join(", "),
            value_str,
            err_var
        ));
        self.indent += 1;
        self.gen_onerr_body(&[], &err_var, onerr)?;
        self.indent -= 1;
        self.write_line("}");
        Ok(())
    }

    fn gen_onerr_body(
        &mut self,
        names: &[String],
        err_var: &str,
        onerr: &OnErr<'_>,
    ) -> Result<(), GenError> {
        let saved_onerr = std::mem::replace(&mut self.onerr_var, Some(err_var.to_string()));

        if let Some(explain) = onerr.explain {
            let wrapped = self.gen_explain_wrap(explain, err_var)?;
            self.write_line(&format!("{} = {}", err_var, wrapped));
        }

        let result = (|| {
            match &onerr.handler {
                OnErrHandler::Return(values) if values.is_empty() => {
                    // Shorthand propagation: zero values for the data
                    // positions, the caught error last.
                    if self.returns_len() == 0 {
                        self.write_line("return");
                    } else {
                        let mut parts = Vec::new();
                        for i in 0..self.returns_len() {
                            if i + 1 == self.returns_len() {
                                parts.push(err_var.to_string());
                            } else {
                                let ann = self.return_annotation(i).ok_or_else(|| {
                                    GenError::new("missing return annotation", onerr.span)
                                })?;
                                parts.push(self.zero_value(ann));
                            }
                        }
                        self.write_line(&format!("return {}", parts.join(", ")));
                    }
                    Ok(())
                }
                OnErrHandler::Return(values) => {
                    let positional = values.len() == self.returns_len();
                    let mut parts = Vec::new();
                    for (i, value) in values.iter().enumerate() {
                        self.set_return_index(positional.then_some(i));
                        parts.push(self.gen_expr(value)?);
                    }
                    self.set_return_index(None);
                    self.write_line(&format!("return {}", parts.join(", ")));
                    Ok(())
                }
                OnErrHandler::Panic(value) => {
                    let value = self.gen_expr(value)?;
                    self.write_line(&format!("panic({})", value));
                    Ok(())
                }
                OnErrHandler::ErrorValue(message) => {
                    let error_value = self.gen_error_value(message)?;
                    if self.returns_len() == 0 {
                        self.write_line(&format!("panic({})", error_value));
                        return Ok(());
                    }
                    let mut parts = Vec::new();
                    for i in 0..self.returns_len() {
                        if i + 1 == self.returns_len() {
                            parts.push(error_value.clone());
                        } else {
                            let ann = self.return_annotation(i).ok_or_else(|| {
                                GenError::new("missing return annotation", onerr.span)
                            })?;
                            parts.push(self.zero_value(ann));
                        }
                    }
                    self.write_line(&format!("return {}", parts.join(", ")));
                    Ok(())
                }
                OnErrHandler::Fallback(value) => {
                    let value = self.gen_expr(value)?;
                    let target = names.first().cloned().unwrap_or_else(|| "_".to_string());
                    self.write_line(&format!("{} = {}", target, value));
                    Ok(())
                }
                OnErrHandler::Discard => Ok(()),
                OnErrHandler::Block(block) => {
                    for stmt in *block {
                        self.gen_stmt(stmt)?;
                    }
                    Ok(())
                }
            }
        })();

        self.onerr_var = saved_onerr;
        result
    }

    /// `explain "hint"` wraps the caught error before the handler runs.
    fn gen_explain_wrap(
        &mut self,
        explain: &Expr<'_>,
        err_var: &str,
    ) -> Result<String, GenError> {
        self.auto_imports.insert("fmt");
        match explain {
            Expr::StringLit { text, parts: None, .. } => {
                let hint = self.interner.resolve(*text).to_string();
                Ok(format!(
                    "fmt.Errorf({}, {})",
                    Self::go_quote(&format!("{}: %w", hint)),
                    err_var
                ))
            }
            Expr::StringLit { parts: Some(parts), span, .. } => {
                let (format_str, mut args) = self.interpolation_parts(parts, *span)?;
                args.push(err_var.to_string());
                Ok(format!(
                    "fmt.Errorf({}, {})",
                    Self::go_quote(&format!("{}: %w", format_str)),
                    args.join(", ")
                ))
            }
            other => {
                let hint = self.gen_expr(other)?;
                Ok(format!("fmt.Errorf(\"%v: %w\", {}, {})", hint, err_var))
            }
        }
    }
}
