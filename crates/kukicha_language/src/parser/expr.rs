//! Expression parsing.
//!
//! Precedence, lowest binding first:
//!
//! 1. `or` / `||`
//! 2. `and` / `&&`
//! 3. `== != equals in`
//! 4. `< <= > >=`
//! 5. `+ -`
//! 6. `* / %`
//! 7. unary `not ! -`
//! 8. pipe chains `|>`
//! 9. postfix: call, index, slice, selector, `.(T)` assertion, `as` cast
//!
//! A pipe chain binds tighter than any binary operator and is
//! left-associative; its stages are postfix expressions.

use kukicha_base::Span;

use crate::ast::{Arg, BinaryOp, Expr, LambdaBody, Param, TypeAnn, UnaryOp};
use crate::error::{ParseError, ParseErrorKind};
use crate::token::{Token, TokenKind};

use super::{ParseResult, Parser};

impl<'a, 'int> Parser<'a, 'int> {
    /// Parses an expression while keeping a trailing `as` unconsumed, so
    /// `switch EXPR as NAME` can read the binding.
    pub(super) fn parse_expression_no_cast(&mut self) -> ParseResult<&'a Expr<'a>> {
        self.suppress_cast = true;
        let result = self.parse_expression();
        self.suppress_cast = false;
        result
    }

    pub(crate) fn parse_expression(&mut self) -> ParseResult<&'a Expr<'a>> {
        // Single-parameter arrow lambda without parentheses: `x => x + 1`.
        if matches!(self.peek_kind(), TokenKind::Ident)
            && self.peek_ahead(1) == TokenKind::FatArrow
        {
            let (name, span) = self.expect_ident()?;
            self.advance();
            let params = vec![Param { name, ty: None, default: None, variadic: false, span }];
            let body = self.parse_lambda_body()?;
            return Ok(self.ctx.alloc_expr(Expr::ArrowLambda { params, body, span }));
        }
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek_kind(), TokenKind::KwOr | TokenKind::OrOr) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = self.binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut lhs = self.parse_equality()?;
        while matches!(self.peek_kind(), TokenKind::KwAnd | TokenKind::AndAnd) {
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = self.binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq | TokenKind::KwEquals => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::KwIn => BinaryOp::In,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_relational()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = self.binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> ParseResult<&'a Expr<'a>> {
        let op = match self.peek_kind() {
            TokenKind::KwNot | TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().span;
            let operand = self.parse_unary()?;
            return Ok(self.ctx.alloc_expr(Expr::Unary {
                op,
                operand,
                span: start.merge(operand.span()),
            }));
        }
        self.parse_pipe()
    }

    /// Pipe chains: `a |> f(x) |> g`. Left-associative; each stage is a
    /// postfix expression. An `onerr` clause never belongs to the pipe
    /// itself — the statement parser attaches it afterwards.
    fn parse_pipe(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut lhs = self.parse_postfix()?;
        while self.check(TokenKind::PipeArrow) {
            self.advance();
            let rhs = self.parse_postfix()?;
            let id = self.fresh_id();
            let span = lhs.span().merge(rhs.span());
            lhs = self.ctx.alloc_expr(Expr::Pipe { id, lhs, rhs, span });
        }
        Ok(lhs)
    }

    fn parse_postfix(&mut self) -> ParseResult<&'a Expr<'a>> {
        let mut e = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::LParen => {
                    self.advance();
                    let (args, spread) = self.parse_call_args()?;
                    let close = self.expect(TokenKind::RParen)?.span;
                    let id = self.fresh_id();
                    let span = e.span().merge(close);
                    e = if let Expr::Selector { base, field, .. } = e {
                        self.ctx.alloc_expr(Expr::MethodCall {
                            id,
                            recv: *base,
                            method: *field,
                            args,
                            spread,
                            span,
                        })
                    } else {
                        self.ctx.alloc_expr(Expr::Call { id, callee: e, args, spread, span })
                    };
                }
                TokenKind::Dot => {
                    if self.peek_ahead(1) == TokenKind::LParen {
                        // Type assertion: `x.(T)`.
                        self.advance();
                        self.advance();
                        let ty = self.parse_type()?;
                        let close = self.expect(TokenKind::RParen)?.span;
                        let span = e.span().merge(close);
                        e = self.ctx.alloc_expr(Expr::TypeAssertion { base: e, ty, span });
                    } else {
                        self.advance();
                        let (field, field_span) = self.expect_ident()?;
                        let span = e.span().merge(field_span);
                        e = self.ctx.alloc_expr(Expr::Selector { base: e, field, span });
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    e = self.parse_index_or_slice(e)?;
                }
                TokenKind::KwAs => {
                    // `x as T` cast. In `switch EXPR as NAME` the statement
                    // parser claims the `as` before expressions ever see it.
                    if self.suppress_cast {
                        break;
                    }
                    self.advance();
                    let ty = self.parse_type()?;
                    let span = e.span().merge(ty.span());
                    e = self.ctx.alloc_expr(Expr::TypeCast { base: e, ty, span });
                }
                TokenKind::LBrace => {
                    let Some((package, name)) = Self::struct_lit_head(e) else {
                        break;
                    };
                    self.advance();
                    e = self.parse_struct_lit_body(package, name, e.span())?;
                }
                _ => break,
            }
        }
        Ok(e)
    }

    /// `Name{...}` and `pkg.Name{...}` are struct literals; any other
    /// expression followed by `{` is left alone.
    fn struct_lit_head(
        e: &'a Expr<'a>,
    ) -> Option<(Option<kukicha_base::Symbol>, kukicha_base::Symbol)> {
        match e {
            Expr::Identifier { name, .. } => Some((None, *name)),
            Expr::Selector { base, field, .. } => match base {
                Expr::Identifier { name, .. } => Some((Some(*name), *field)),
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_index_or_slice(&mut self, base: &'a Expr<'a>) -> ParseResult<&'a Expr<'a>> {
        if self.eat(TokenKind::Colon).is_some() {
            // `xs[:end]` or `xs[:]`.
            let end = if self.check(TokenKind::RBracket) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            let close = self.expect(TokenKind::RBracket)?.span;
            return Ok(self.ctx.alloc_expr(Expr::Slice {
                base,
                start: None,
                end,
                span: base.span().merge(close),
            }));
        }

        let first = self.parse_expression()?;
        if self.eat(TokenKind::Colon).is_some() {
            let end = if self.check(TokenKind::RBracket) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            let close = self.expect(TokenKind::RBracket)?.span;
            return Ok(self.ctx.alloc_expr(Expr::Slice {
                base,
                start: Some(first),
                end,
                span: base.span().merge(close),
            }));
        }

        let close = self.expect(TokenKind::RBracket)?.span;
        Ok(self.ctx.alloc_expr(Expr::Index {
            base,
            index: first,
            span: base.span().merge(close),
        }))
    }

    /// Arguments after `(`, stopping in front of `)`.
    pub(super) fn parse_call_args(&mut self) -> ParseResult<(Vec<Arg<'a>>, bool)> {
        let mut args = Vec::new();
        let mut spread = false;
        let mut seen_named = false;

        while !self.check(TokenKind::RParen) && !self.at_end() {
            if self.eat(TokenKind::KwMany).is_some() {
                spread = true;
            }

            let name = if matches!(self.peek_kind(), TokenKind::Ident)
                && self.peek_ahead(1) == TokenKind::Colon
            {
                let (name, _) = self.expect_ident()?;
                self.advance();
                seen_named = true;
                Some(name)
            } else {
                if seen_named {
                    self.record_error(ParseError::new(
                        ParseErrorKind::MixedNamedPositional,
                        self.peek_span(),
                    ));
                }
                None
            };

            let value = self.parse_expression()?;
            args.push(Arg { name, value });

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        Ok((args, spread))
    }

    fn parse_primary(&mut self) -> ParseResult<&'a Expr<'a>> {
        match self.peek_kind() {
            TokenKind::Int => {
                let token = self.advance();
                let value = Self::int_value(self.interner.resolve(token.lexeme));
                Ok(self.ctx.alloc_expr(Expr::IntLit {
                    text: token.lexeme,
                    value,
                    span: token.span,
                }))
            }
            TokenKind::Float => {
                let token = self.advance();
                Ok(self
                    .ctx
                    .alloc_expr(Expr::FloatLit { text: token.lexeme, span: token.span }))
            }
            TokenKind::Str | TokenKind::RawStr => {
                let token = self.advance();
                Ok(self.ctx.alloc_expr(Expr::StringLit {
                    text: token.lexeme,
                    parts: token.parts,
                    span: token.span,
                }))
            }
            TokenKind::Rune => {
                let token = self.advance();
                Ok(self
                    .ctx
                    .alloc_expr(Expr::RuneLit { text: token.lexeme, span: token.span }))
            }
            TokenKind::KwTrue | TokenKind::KwFalse => {
                let token = self.advance();
                Ok(self.ctx.alloc_expr(Expr::BoolLit {
                    value: token.kind == TokenKind::KwTrue,
                    span: token.span,
                }))
            }
            TokenKind::Ident => {
                let token = self.advance();
                Ok(self
                    .ctx
                    .alloc_expr(Expr::Identifier { name: token.lexeme, span: token.span }))
            }
            TokenKind::KwThis => {
                let token = self.advance();
                let name = self.interner.intern("this");
                Ok(self.ctx.alloc_expr(Expr::Identifier { name, span: token.span }))
            }
            TokenKind::LParen => {
                if self.lambda_ahead() {
                    return self.parse_paren_lambda();
                }
                self.advance();
                let e = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(e)
            }
            TokenKind::LBracket => self.parse_list_literal(None),
            TokenKind::LBrace => self.parse_map_literal(None, None),
            TokenKind::KwFunc => self.parse_function_literal(),
            TokenKind::KwMake => {
                let start = self.advance().span;
                self.expect(TokenKind::LParen)?;
                let ty = self.parse_type()?;
                let mut args = Vec::new();
                while self.eat(TokenKind::Comma).is_some() {
                    args.push(self.parse_expression()?);
                }
                let close = self.expect(TokenKind::RParen)?.span;
                Ok(self.ctx.alloc_expr(Expr::Make { ty, args, span: start.merge(close) }))
            }
            TokenKind::KwReceive => {
                let start = self.advance().span;
                let chan = self.parse_postfix()?;
                Ok(self
                    .ctx
                    .alloc_expr(Expr::Receive { chan, span: start.merge(chan.span()) }))
            }
            TokenKind::KwReference => {
                let start = self.advance().span;
                self.expect(TokenKind::KwOf)?;
                let operand = self.parse_postfix()?;
                Ok(self
                    .ctx
                    .alloc_expr(Expr::AddressOf { operand, span: start.merge(operand.span()) }))
            }
            TokenKind::KwDereference => {
                let start = self.advance().span;
                let operand = self.parse_postfix()?;
                Ok(self
                    .ctx
                    .alloc_expr(Expr::Dereference { operand, span: start.merge(operand.span()) }))
            }
            TokenKind::KwEmpty => {
                let start = self.advance().span;
                let ty = if matches!(
                    self.peek_kind(),
                    TokenKind::KwList
                        | TokenKind::KwMap
                        | TokenKind::KwChannel
                        | TokenKind::KwReference
                        | TokenKind::KwFunc
                        | TokenKind::KwError
                        | TokenKind::Ident
                ) {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                let span = ty.map(|t| start.merge(t.span())).unwrap_or(start);
                Ok(self.ctx.alloc_expr(Expr::Empty { ty, span }))
            }
            TokenKind::KwPanic => {
                let start = self.advance().span;
                let value = self.parse_expression()?;
                Ok(self
                    .ctx
                    .alloc_expr(Expr::Panic { value, span: start.merge(value.span()) }))
            }
            TokenKind::KwError => {
                let start = self.advance().span;
                let message = self.parse_expression()?;
                Ok(self
                    .ctx
                    .alloc_expr(Expr::ErrorNew { message, span: start.merge(message.span()) }))
            }
            TokenKind::KwRecover => {
                let start = self.advance().span;
                let mut span = start;
                if self.check(TokenKind::LParen) && self.peek_ahead(1) == TokenKind::RParen {
                    self.advance();
                    span = span.merge(self.advance().span);
                }
                Ok(self.ctx.alloc_expr(Expr::Recover { span }))
            }
            TokenKind::KwClose => {
                let start = self.advance().span;
                let chan = self.parse_postfix()?;
                Ok(self
                    .ctx
                    .alloc_expr(Expr::Close { chan, span: start.merge(chan.span()) }))
            }
            kind => {
                if let Some(text) = kind.soft_ident_text() {
                    let token = self.advance();
                    let name = self.interner.intern(text);
                    return Ok(self
                        .ctx
                        .alloc_expr(Expr::Identifier { name, span: token.span }));
                }
                Err(ParseError::new(
                    ParseErrorKind::ExpectedExpression { found: kind },
                    self.peek_span(),
                ))
            }
        }
    }

    fn int_value(text: &str) -> Option<i64> {
        let clean: String = text.chars().filter(|c| *c != '_').collect();
        if let Some(hex) = clean.strip_prefix("0x").or_else(|| clean.strip_prefix("0X")) {
            return i64::from_str_radix(hex, 16).ok();
        }
        if let Some(oct) = clean.strip_prefix("0o").or_else(|| clean.strip_prefix("0O")) {
            return i64::from_str_radix(oct, 8).ok();
        }
        if let Some(bin) = clean.strip_prefix("0b").or_else(|| clean.strip_prefix("0B")) {
            return i64::from_str_radix(bin, 2).ok();
        }
        clean.parse().ok()
    }

    // =========================================================================
    // Literals
    // =========================================================================

    pub(super) fn parse_list_literal(
        &mut self,
        elem_type: Option<&'a TypeAnn<'a>>,
    ) -> ParseResult<&'a Expr<'a>> {
        let start = self.expect(TokenKind::LBracket)?.span;
        let mut elems = Vec::new();
        while !self.check(TokenKind::RBracket) && !self.at_end() {
            elems.push(self.parse_expression()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(TokenKind::RBracket)?.span;
        Ok(self.ctx.alloc_expr(Expr::ListLit {
            elem_type,
            elems,
            span: start.merge(close),
        }))
    }

    pub(super) fn parse_map_literal(
        &mut self,
        key_type: Option<&'a TypeAnn<'a>>,
        value_type: Option<&'a TypeAnn<'a>>,
    ) -> ParseResult<&'a Expr<'a>> {
        let start = self.expect(TokenKind::LBrace)?.span;
        let mut entries = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            let key = self.parse_expression()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(TokenKind::RBrace)?.span;
        Ok(self.ctx.alloc_expr(Expr::MapLit {
            key_type,
            value_type,
            entries,
            span: start.merge(close),
        }))
    }

    /// The `field: value, …}` tail of an inline struct literal; the `{` is
    /// already consumed.
    fn parse_struct_lit_body(
        &mut self,
        package: Option<kukicha_base::Symbol>,
        name: kukicha_base::Symbol,
        start: Span,
    ) -> ParseResult<&'a Expr<'a>> {
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            let (field, _) = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression()?;
            fields.push((field, value));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let close = self.expect(TokenKind::RBrace)?.span;
        Ok(self.ctx.alloc_expr(Expr::StructLit {
            package,
            name,
            fields,
            span: start.merge(close),
        }))
    }

    fn parse_function_literal(&mut self) -> ParseResult<&'a Expr<'a>> {
        let start = self.expect(TokenKind::KwFunc)?.span;
        self.expect(TokenKind::LParen)?;
        let params = self.parse_params()?;
        let returns = self.parse_return_types()?;
        let body = self.parse_block()?;
        Ok(self
            .ctx
            .alloc_expr(Expr::FunctionLit { params, returns, body, span: start }))
    }

    // =========================================================================
    // Arrow lambdas
    // =========================================================================

    /// Lookahead from a `(`: does a `=>` (or `->`) follow the matching `)`?
    fn lambda_ahead(&self) -> bool {
        let mut depth = 0usize;
        let mut offset = 0usize;
        loop {
            match self.peek_ahead(offset) {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(
                            self.peek_ahead(offset + 1),
                            TokenKind::FatArrow | TokenKind::Arrow
                        );
                    }
                }
                TokenKind::Eof | TokenKind::Newline => return false,
                _ => {}
            }
            offset += 1;
        }
    }

    fn parse_paren_lambda(&mut self) -> ParseResult<&'a Expr<'a>> {
        let start = self.expect(TokenKind::LParen)?.span;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.at_end() {
            let (name, span) = self.expect_ident()?;
            let ty = if !matches!(self.peek_kind(), TokenKind::Comma | TokenKind::RParen) {
                Some(self.parse_type()?)
            } else {
                None
            };
            params.push(Param { name, ty, default: None, variadic: false, span });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        if self.eat(TokenKind::FatArrow).is_none() {
            self.expect(TokenKind::Arrow)?;
        }
        let body = self.parse_lambda_body()?;
        Ok(self.ctx.alloc_expr(Expr::ArrowLambda { params, body, span: start }))
    }

    fn parse_lambda_body(&mut self) -> ParseResult<LambdaBody<'a>> {
        if self.check(TokenKind::Newline) && self.peek_ahead(1) == TokenKind::Indent {
            Ok(LambdaBody::Block(self.parse_block()?))
        } else {
            Ok(LambdaBody::Expr(self.parse_expression()?))
        }
    }

    // =========================================================================
    // Initializers (indented literal forms)
    // =========================================================================

    /// Parses the right-hand side of a binding. Beyond plain expressions,
    /// three indented literal forms are recognized:
    ///
    /// ```text
    /// p := Point            xs := list of int      m := map of string to int
    ///     x: 1                  1                      one: 1
    ///     y: 2                  2                      two: 2
    /// ```
    ///
    /// Returns the expression and whether an indented body was consumed
    /// (in which case the statement terminator is already gone).
    pub(super) fn parse_initializer(&mut self) -> ParseResult<&'a Expr<'a>> {
        let (expr, _) = self.parse_initializer_full()?;
        Ok(expr)
    }

    pub(super) fn parse_initializer_full(&mut self) -> ParseResult<(&'a Expr<'a>, bool)> {
        // Typed collection heads: `list of T …` / `map of K to V …`.
        if self.check(TokenKind::KwList) && self.peek_ahead(1) == TokenKind::KwOf {
            let start = self.advance().span;
            self.expect(TokenKind::KwOf)?;
            let elem = self.parse_type()?;
            if self.check(TokenKind::LBracket) {
                return Ok((self.parse_list_literal(Some(elem))?, false));
            }
            if self.check(TokenKind::Newline) && self.peek_ahead(1) == TokenKind::Indent {
                return Ok((self.parse_indented_list(elem, start)?, true));
            }
            return Ok((
                self.ctx.alloc_expr(Expr::ListLit {
                    elem_type: Some(elem),
                    elems: Vec::new(),
                    span: start.merge(elem.span()),
                }),
                false,
            ));
        }

        if self.check(TokenKind::KwMap) && self.peek_ahead(1) == TokenKind::KwOf {
            let start = self.advance().span;
            self.expect(TokenKind::KwOf)?;
            let key = self.parse_type()?;
            self.expect(TokenKind::KwTo)?;
            let value = self.parse_type()?;
            if self.check(TokenKind::LBrace) {
                return Ok((self.parse_map_literal(Some(key), Some(value))?, false));
            }
            if self.check(TokenKind::Newline) && self.peek_ahead(1) == TokenKind::Indent {
                return Ok((self.parse_indented_map(key, value, start)?, true));
            }
            return Ok((
                self.ctx.alloc_expr(Expr::MapLit {
                    key_type: Some(key),
                    value_type: Some(value),
                    entries: Vec::new(),
                    span: start.merge(value.span()),
                }),
                false,
            ));
        }

        let expr = self.parse_expression()?;

        // `p := Point` + indented `field: value` lines.
        if self.check(TokenKind::Newline)
            && self.peek_ahead(1) == TokenKind::Indent
            && self.peek_ahead(3) == TokenKind::Colon
        {
            if let Some((package, name)) = Self::struct_lit_head(expr) {
                return Ok((
                    self.parse_indented_struct(package, name, expr.span())?,
                    true,
                ));
            }
        }

        Ok((expr, false))
    }

    fn parse_indented_list(
        &mut self,
        elem: &'a TypeAnn<'a>,
        start: Span,
    ) -> ParseResult<&'a Expr<'a>> {
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let mut elems = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            if self.eat(TokenKind::Newline).is_some() {
                continue;
            }
            elems.push(self.parse_expression()?);
            self.end_of_line()?;
        }
        let close = self.expect(TokenKind::Dedent)?.span;
        Ok(self.ctx.alloc_expr(Expr::ListLit {
            elem_type: Some(elem),
            elems,
            span: start.merge(close),
        }))
    }

    fn parse_indented_map(
        &mut self,
        key: &'a TypeAnn<'a>,
        value: &'a TypeAnn<'a>,
        start: Span,
    ) -> ParseResult<&'a Expr<'a>> {
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let mut entries = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            if self.eat(TokenKind::Newline).is_some() {
                continue;
            }
            let k = self.parse_expression()?;
            self.expect(TokenKind::Colon)?;
            let v = self.parse_expression()?;
            entries.push((k, v));
            self.end_of_line()?;
        }
        let close = self.expect(TokenKind::Dedent)?.span;
        Ok(self.ctx.alloc_expr(Expr::MapLit {
            key_type: Some(key),
            value_type: Some(value),
            entries,
            span: start.merge(close),
        }))
    }

    fn parse_indented_struct(
        &mut self,
        package: Option<kukicha_base::Symbol>,
        name: kukicha_base::Symbol,
        start: Span,
    ) -> ParseResult<&'a Expr<'a>> {
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            if self.eat(TokenKind::Newline).is_some() {
                continue;
            }
            let (field, _) = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression()?;
            fields.push((field, value));
            self.end_of_line()?;
        }
        let close = self.expect(TokenKind::Dedent)?.span;
        Ok(self.ctx.alloc_expr(Expr::StructLit {
            package,
            name,
            fields,
            span: start.merge(close),
        }))
    }

    fn binary(&mut self, op: BinaryOp, lhs: &'a Expr<'a>, rhs: &'a Expr<'a>) -> &'a Expr<'a> {
        let span = lhs.span().merge(rhs.span());
        self.ctx.alloc_expr(Expr::Binary { op, lhs, rhs, span })
    }

    #[allow(dead_code)]
    pub(super) fn token_text(&self, token: &Token) -> String {
        self.interner.resolve(token.lexeme).to_string()
    }
}
