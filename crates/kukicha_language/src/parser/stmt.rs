//! Statement parsing.
//!
//! Statements dispatch on their leading keyword; anything else is an
//! expression-leading statement (`x := …`, `a, b = …`, `x++`, or a bare
//! call). The `onerr` clause is parsed here as an optional attachment to
//! var-decls, assignments and expression statements — never as a
//! free-standing construct.

use crate::ast::{
    Block, Expr, OnErr, OnErrHandler, SelectCase, SelectOp, Stmt, SwitchCase, TypeSwitchCase,
};
use crate::error::{ParseError, ParseErrorKind};
use crate::token::TokenKind;

use super::{ParseResult, Parser};

impl<'a, 'int> Parser<'a, 'int> {
    /// NEWLINE INDENT statement* DEDENT.
    pub(super) fn parse_block(&mut self) -> ParseResult<Block<'a>> {
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            if self.eat(TokenKind::Newline).is_some() {
                continue;
            }
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => self.recover(e),
            }
        }
        self.eat(TokenKind::Dedent);
        Ok(self.ctx.alloc_block(stmts))
    }

    pub(super) fn parse_statement(&mut self) -> ParseResult<Stmt<'a>> {
        match self.peek_kind() {
            TokenKind::KwVar => self.parse_var_statement(),
            TokenKind::KwIf => self.parse_if_statement(),
            TokenKind::KwFor => self.parse_for_statement(),
            TokenKind::KwSwitch => self.parse_switch_statement(),
            TokenKind::KwReturn => self.parse_return_statement(),
            TokenKind::KwBreak => {
                let span = self.advance().span;
                self.end_of_line()?;
                Ok(Stmt::Break { span })
            }
            TokenKind::KwContinue => {
                let span = self.advance().span;
                self.end_of_line()?;
                Ok(Stmt::Continue { span })
            }
            TokenKind::KwDefer => {
                let start = self.advance().span;
                let call = self.parse_expression()?;
                self.end_of_line()?;
                Ok(Stmt::Defer { call, span: start.merge(call.span()) })
            }
            TokenKind::KwGo => self.parse_go_statement(),
            TokenKind::KwSelect => self.parse_select_statement(),
            TokenKind::KwSend => self.parse_send_statement(),
            TokenKind::KwReceive
                if self.peek_ahead(1) == TokenKind::Ident
                    && self.peek_ahead(2) == TokenKind::KwFrom =>
            {
                self.parse_receive_statement()
            }
            _ => self.parse_simple_statement(),
        }
    }

    /// `var NAME [TYPE] [= INIT] [onerr …]`.
    fn parse_var_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenKind::KwVar)?.span;
        let (name, name_span) = self.expect_ident()?;
        let mut span = start.merge(name_span);

        let ty = if !matches!(
            self.peek_kind(),
            TokenKind::Assign | TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent
        ) {
            let ty = self.parse_type()?;
            span = span.merge(ty.span());
            Some(ty)
        } else {
            None
        };

        let mut block_form = false;
        let value = if self.eat(TokenKind::Assign).is_some() {
            let (value, consumed_block) = self.parse_initializer_full()?;
            block_form = consumed_block;
            span = span.merge(value.span());
            Some(value)
        } else {
            None
        };

        let onerr = if block_form { None } else { self.parse_onerr_clause()? };
        if !block_form && !Self::onerr_has_block(&onerr) {
            self.end_of_line()?;
        }

        Ok(Stmt::VarDecl { names: vec![name], ty, value, onerr, span })
    }

    fn parse_if_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenKind::KwIf)?.span;
        let cond = self.parse_expression()?;
        let then_block = self.parse_block()?;

        let else_branch = if self.eat(TokenKind::KwElse).is_some() {
            if self.check(TokenKind::KwIf) {
                let nested = self.parse_if_statement()?;
                Some(self.ctx.alloc_stmt(nested))
            } else {
                let body = self.parse_block()?;
                Some(self.ctx.alloc_stmt(Stmt::Block { body, span: start }))
            }
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_block,
            else_branch,
            span: start.merge(cond.span()),
        })
    }

    /// Four forms, told apart by lookahead after `for`:
    /// range (`item in xs`, `i, item in xs`), numeric (`i from a to b`),
    /// condition (trailing boolean expression) and infinite (bare).
    fn parse_for_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenKind::KwFor)?.span;

        if self.check(TokenKind::Newline) {
            let body = self.parse_block()?;
            return Ok(Stmt::ForInfinite { body, span: start });
        }

        if self.check(TokenKind::Ident) {
            match (self.peek_ahead(1), self.peek_ahead(2), self.peek_ahead(3)) {
                (TokenKind::KwIn, _, _) => {
                    let (item, _) = self.expect_ident()?;
                    self.expect(TokenKind::KwIn)?;
                    let collection = self.parse_expression()?;
                    let body = self.parse_block()?;
                    return Ok(Stmt::ForRange {
                        index: None,
                        item,
                        collection,
                        body,
                        span: start.merge(collection.span()),
                    });
                }
                (TokenKind::Comma, TokenKind::Ident, TokenKind::KwIn) => {
                    let (index, _) = self.expect_ident()?;
                    self.expect(TokenKind::Comma)?;
                    let (item, _) = self.expect_ident()?;
                    self.expect(TokenKind::KwIn)?;
                    let collection = self.parse_expression()?;
                    let body = self.parse_block()?;
                    return Ok(Stmt::ForRange {
                        index: Some(index),
                        item,
                        collection,
                        body,
                        span: start.merge(collection.span()),
                    });
                }
                (TokenKind::KwFrom, _, _) => {
                    let (var, _) = self.expect_ident()?;
                    self.expect(TokenKind::KwFrom)?;
                    let from = self.parse_expression()?;
                    let inclusive = match self.peek_kind() {
                        TokenKind::KwTo => {
                            self.advance();
                            false
                        }
                        TokenKind::KwThrough => {
                            self.advance();
                            true
                        }
                        _ => return Err(self.unexpected("'to' or 'through'")),
                    };
                    let until = self.parse_expression()?;
                    let body = self.parse_block()?;
                    return Ok(Stmt::ForNumeric {
                        var,
                        start: from,
                        end: until,
                        inclusive,
                        body,
                        span: start.merge(until.span()),
                    });
                }
                _ => {}
            }
        }

        let cond = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Stmt::ForCondition { cond, body, span: start.merge(cond.span()) })
    }

    /// Value switch, condition switch (no head expression), and type
    /// switch (`switch EXPR as NAME`).
    fn parse_switch_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenKind::KwSwitch)?.span;

        if self.check(TokenKind::Newline) {
            let cases = self.parse_switch_cases()?;
            return Ok(Stmt::Switch { subject: None, cases, span: start });
        }

        let subject = self.parse_switch_subject()?;

        if self.eat(TokenKind::KwAs).is_some() {
            let (binding, _) = self.expect_ident()?;
            let cases = self.parse_type_switch_cases()?;
            return Ok(Stmt::TypeSwitch {
                subject,
                binding,
                cases,
                span: start.merge(subject.span()),
            });
        }

        let cases = self.parse_switch_cases()?;
        Ok(Stmt::Switch {
            subject: Some(subject),
            cases,
            span: start.merge(subject.span()),
        })
    }

    /// The switch head expression. Postfix `as`-casts stop in front of the
    /// head's trailing `as`, which introduces a type-switch binding instead.
    fn parse_switch_subject(&mut self) -> ParseResult<&'a Expr<'a>> {
        // A cast in a switch head would be ambiguous with the type-switch
        // form; the binding interpretation wins, so parse up to `as`.
        self.parse_expression_no_cast()
    }

    fn parse_switch_cases(&mut self) -> ParseResult<Vec<SwitchCase<'a>>> {
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let mut cases = Vec::new();
        loop {
            if self.eat(TokenKind::Newline).is_some() {
                continue;
            }
            match self.peek_kind() {
                TokenKind::KwWhen => {
                    let when_span = self.advance().span;
                    let mut values = vec![self.parse_expression()?];
                    while self.eat(TokenKind::Comma).is_some() {
                        values.push(self.parse_expression()?);
                    }
                    let body = self.parse_block()?;
                    cases.push(SwitchCase { values, body, span: when_span });
                }
                TokenKind::KwOtherwise | TokenKind::KwDefault => {
                    let span = self.advance().span;
                    let body = self.parse_block()?;
                    cases.push(SwitchCase { values: Vec::new(), body, span });
                }
                TokenKind::Dedent | TokenKind::Eof => break,
                _ => return Err(self.unexpected("'when' or 'otherwise'")),
            }
        }
        self.eat(TokenKind::Dedent);
        Ok(cases)
    }

    fn parse_type_switch_cases(&mut self) -> ParseResult<Vec<TypeSwitchCase<'a>>> {
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let mut cases = Vec::new();
        loop {
            if self.eat(TokenKind::Newline).is_some() {
                continue;
            }
            match self.peek_kind() {
                TokenKind::KwWhen => {
                    let when_span = self.advance().span;
                    let ty = self.parse_type()?;
                    let body = self.parse_block()?;
                    cases.push(TypeSwitchCase { ty: Some(ty), body, span: when_span });
                }
                TokenKind::KwOtherwise | TokenKind::KwDefault => {
                    let span = self.advance().span;
                    let body = self.parse_block()?;
                    cases.push(TypeSwitchCase { ty: None, body, span });
                }
                TokenKind::Dedent | TokenKind::Eof => break,
                _ => return Err(self.unexpected("'when' or 'otherwise'")),
            }
        }
        self.eat(TokenKind::Dedent);
        Ok(cases)
    }

    fn parse_return_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenKind::KwReturn)?.span;
        let mut values = Vec::new();
        if !matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof
        ) {
            values.push(self.parse_expression()?);
            while self.eat(TokenKind::Comma).is_some() {
                values.push(self.parse_expression()?);
            }
        }
        self.end_of_line()?;
        let span = values
            .last()
            .map(|v| start.merge(v.span()))
            .unwrap_or(start);
        Ok(Stmt::Return { values, span })
    }

    /// `go CALL`, or `go` followed by an indented block (which lowers to
    /// launching an anonymous function).
    fn parse_go_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenKind::KwGo)?.span;
        if self.check(TokenKind::Newline) && self.peek_ahead(1) == TokenKind::Indent {
            let block = self.parse_block()?;
            return Ok(Stmt::Go { call: None, block: Some(block), span: start });
        }
        let call = self.parse_expression()?;
        self.end_of_line()?;
        Ok(Stmt::Go {
            call: Some(call),
            block: None,
            span: start.merge(call.span()),
        })
    }

    /// `send VALUE to CHANNEL`.
    fn parse_send_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenKind::KwSend)?.span;
        let value = self.parse_expression()?;
        self.expect(TokenKind::KwTo)?;
        let chan = self.parse_expression()?;
        self.end_of_line()?;
        Ok(Stmt::Send { value, chan, span: start.merge(chan.span()) })
    }

    /// `receive NAME from CHANNEL`.
    fn parse_receive_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenKind::KwReceive)?.span;
        let (name, _) = self.expect_ident()?;
        self.expect(TokenKind::KwFrom)?;
        let chan = self.parse_expression()?;
        self.end_of_line()?;
        Ok(Stmt::Receive { name, chan, span: start.merge(chan.span()) })
    }

    /// `select` with `receive`/`send` cases and an optional `otherwise`.
    fn parse_select_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let start = self.expect(TokenKind::KwSelect)?.span;
        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        let mut cases = Vec::new();
        loop {
            if self.eat(TokenKind::Newline).is_some() {
                continue;
            }
            match self.peek_kind() {
                TokenKind::KwReceive => {
                    let case_span = self.advance().span;
                    let (name, _) = self.expect_ident()?;
                    self.expect(TokenKind::KwFrom)?;
                    let chan = self.parse_expression()?;
                    let body = self.parse_block()?;
                    cases.push(SelectCase {
                        op: Some(SelectOp::Receive { name, chan }),
                        body,
                        span: case_span,
                    });
                }
                TokenKind::KwSend => {
                    let case_span = self.advance().span;
                    let value = self.parse_expression()?;
                    self.expect(TokenKind::KwTo)?;
                    let chan = self.parse_expression()?;
                    let body = self.parse_block()?;
                    cases.push(SelectCase {
                        op: Some(SelectOp::Send { value, chan }),
                        body,
                        span: case_span,
                    });
                }
                TokenKind::KwOtherwise | TokenKind::KwDefault => {
                    let span = self.advance().span;
                    let body = self.parse_block()?;
                    cases.push(SelectCase { op: None, body, span });
                }
                TokenKind::Dedent | TokenKind::Eof => break,
                _ => return Err(self.unexpected("'receive', 'send' or 'otherwise'")),
            }
        }
        self.eat(TokenKind::Dedent);
        Ok(Stmt::Select { cases, span: start })
    }

    /// Expression-leading statements: `:=` declarations, assignments,
    /// `++`/`--`, and bare expression statements, each with an optional
    /// `onerr` clause.
    fn parse_simple_statement(&mut self) -> ParseResult<Stmt<'a>> {
        let first = self.parse_expression()?;
        let mut exprs = vec![first];
        while self.eat(TokenKind::Comma).is_some() {
            exprs.push(self.parse_expression()?);
        }

        match self.peek_kind() {
            TokenKind::Declare => {
                self.advance();
                let mut names = Vec::new();
                for target in &exprs {
                    match target {
                        Expr::Identifier { name, .. } => names.push(*name),
                        other => {
                            return Err(ParseError::new(
                                ParseErrorKind::UnexpectedToken {
                                    expected: "an identifier before ':='".to_string(),
                                    found: TokenKind::Declare,
                                },
                                other.span(),
                            ))
                        }
                    }
                }
                let (value, block_form) = self.parse_initializer_full()?;
                let onerr = if block_form { None } else { self.parse_onerr_clause()? };
                if !block_form && !Self::onerr_has_block(&onerr) {
                    self.end_of_line()?;
                }
                let span = first.span().merge(value.span());
                Ok(Stmt::VarDecl { names, ty: None, value: Some(value), onerr, span })
            }
            TokenKind::Assign => {
                self.advance();
                let (value, block_form) = self.parse_initializer_full()?;
                let onerr = if block_form { None } else { self.parse_onerr_clause()? };
                if !block_form && !Self::onerr_has_block(&onerr) {
                    self.end_of_line()?;
                }
                let span = first.span().merge(value.span());
                Ok(Stmt::Assign { targets: exprs, value, onerr, span })
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let increment = self.peek_kind() == TokenKind::PlusPlus;
                let op_span = self.advance().span;
                self.end_of_line()?;
                if exprs.len() != 1 {
                    return Err(self.unexpected("a single increment target"));
                }
                Ok(Stmt::IncDec {
                    target: first,
                    increment,
                    span: first.span().merge(op_span),
                })
            }
            _ => {
                if exprs.len() != 1 {
                    return Err(self.unexpected("':=' or '='"));
                }
                let onerr = self.parse_onerr_clause()?;
                if !Self::onerr_has_block(&onerr) {
                    self.end_of_line()?;
                }
                Ok(Stmt::Expr { expr: first, onerr, span: first.span() })
            }
        }
    }

    /// The optional `onerr` clause:
    ///
    /// ```text
    /// onerr [as NAME] return [vals] | panic E | discard | error E | VALUE
    /// onerr [as NAME] explain "hint"          (shorthand return, wrapped)
    /// onerr [as NAME]                          (indented handler block)
    /// ```
    ///
    /// A value handler may be followed by `explain "hint"`.
    fn parse_onerr_clause(&mut self) -> ParseResult<Option<OnErr<'a>>> {
        let Some(token) = self.eat(TokenKind::KwOnerr) else {
            return Ok(None);
        };
        let span = token.span;

        let alias = if self.eat(TokenKind::KwAs).is_some() {
            Some(self.expect_ident()?.0)
        } else {
            None
        };

        let handler = match self.peek_kind() {
            TokenKind::KwReturn => {
                self.advance();
                let mut values = Vec::new();
                if !matches!(
                    self.peek_kind(),
                    TokenKind::Newline
                        | TokenKind::Dedent
                        | TokenKind::Eof
                        | TokenKind::KwExplain
                ) {
                    values.push(self.parse_expression()?);
                    while self.eat(TokenKind::Comma).is_some() {
                        values.push(self.parse_expression()?);
                    }
                }
                OnErrHandler::Return(values)
            }
            TokenKind::KwPanic => {
                self.advance();
                OnErrHandler::Panic(self.parse_expression()?)
            }
            TokenKind::KwDiscard => {
                self.advance();
                OnErrHandler::Discard
            }
            TokenKind::KwError => {
                self.advance();
                OnErrHandler::ErrorValue(self.parse_expression()?)
            }
            TokenKind::KwExplain => {
                // `onerr explain "hint"` — shorthand return with wrapping.
                OnErrHandler::Return(Vec::new())
            }
            TokenKind::Newline if self.peek_ahead(1) == TokenKind::Indent => {
                OnErrHandler::Block(self.parse_block()?)
            }
            _ => OnErrHandler::Fallback(self.parse_expression()?),
        };

        let explain = if self.eat(TokenKind::KwExplain).is_some() {
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(Some(OnErr { handler, alias, explain, span }))
    }

    fn onerr_has_block(onerr: &Option<OnErr<'a>>) -> bool {
        matches!(
            onerr,
            Some(OnErr { handler: OnErrHandler::Block(_), .. })
        )
    }
}
