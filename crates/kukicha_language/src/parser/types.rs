//! Type annotation parsing.
//!
//! Grammar in type context:
//!
//! ```text
//! TYPE := "list" "of" TYPE
//!       | "map" "of" TYPE "to" TYPE
//!       | "channel" "of" TYPE
//!       | "reference" TYPE
//!       | "func" "(" [TYPE {"," TYPE}] ")" [RETURNS]
//!       | IDENT ["." IDENT]
//! ```
//!
//! Primitive names (`int`, `float`, `string`, `bool`, `byte`, `rune`,
//! `error`, `any`) resolve to [`PrimitiveKind`]; anything else is a named
//! (possibly package-qualified) type.

use crate::ast::{PrimitiveKind, TypeAnn};
use crate::error::{ParseError, ParseErrorKind};
use crate::token::TokenKind;

use super::{ParseResult, Parser};

impl<'a, 'int> Parser<'a, 'int> {
    pub(super) fn parse_type(&mut self) -> ParseResult<&'a TypeAnn<'a>> {
        match self.peek_kind() {
            TokenKind::KwList => {
                let start = self.advance().span;
                self.expect(TokenKind::KwOf)?;
                let elem = self.parse_type()?;
                Ok(self.ctx.alloc_type(TypeAnn::List { elem, span: start.merge(elem.span()) }))
            }
            TokenKind::KwMap => {
                let start = self.advance().span;
                self.expect(TokenKind::KwOf)?;
                let key = self.parse_type()?;
                self.expect(TokenKind::KwTo)?;
                let value = self.parse_type()?;
                Ok(self.ctx.alloc_type(TypeAnn::Map {
                    key,
                    value,
                    span: start.merge(value.span()),
                }))
            }
            TokenKind::KwChannel => {
                let start = self.advance().span;
                self.expect(TokenKind::KwOf)?;
                let elem = self.parse_type()?;
                Ok(self
                    .ctx
                    .alloc_type(TypeAnn::Channel { elem, span: start.merge(elem.span()) }))
            }
            TokenKind::KwReference => {
                let start = self.advance().span;
                let inner = self.parse_type()?;
                Ok(self
                    .ctx
                    .alloc_type(TypeAnn::Reference { inner, span: start.merge(inner.span()) }))
            }
            TokenKind::KwFunc => {
                let start = self.advance().span;
                self.expect(TokenKind::LParen)?;
                let mut params = Vec::new();
                while !self.check(TokenKind::RParen) && !self.at_end() {
                    params.push(self.parse_type()?);
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                let mut span = start.merge(self.expect(TokenKind::RParen)?.span);
                let returns = if self.type_starts_here() {
                    let returns = self.parse_return_types()?;
                    if let Some(last) = returns.last() {
                        span = span.merge(last.span());
                    }
                    returns
                } else {
                    Vec::new()
                };
                Ok(self.ctx.alloc_type(TypeAnn::Function { params, returns, span }))
            }
            TokenKind::KwError => {
                let span = self.advance().span;
                Ok(self
                    .ctx
                    .alloc_type(TypeAnn::Primitive { kind: PrimitiveKind::Error, span }))
            }
            TokenKind::Ident => {
                let token = self.advance();
                let text = self.interner.resolve(token.lexeme).to_string();
                if let Some(kind) = PrimitiveKind::from_name(&text) {
                    return Ok(self
                        .ctx
                        .alloc_type(TypeAnn::Primitive { kind, span: token.span }));
                }
                if self.check(TokenKind::Dot) && self.peek_ahead(1) == TokenKind::Ident {
                    self.advance();
                    let name_token = self.advance();
                    return Ok(self.ctx.alloc_type(TypeAnn::Named {
                        package: Some(token.lexeme),
                        name: name_token.lexeme,
                        span: token.span.merge(name_token.span),
                    }));
                }
                Ok(self.ctx.alloc_type(TypeAnn::Named {
                    package: None,
                    name: token.lexeme,
                    span: token.span,
                }))
            }
            found => Err(ParseError::new(
                ParseErrorKind::ExpectedTypeAnnotation { found },
                self.peek_span(),
            )),
        }
    }

    /// Lookahead: does the next token begin a type annotation?
    pub(super) fn type_starts_here(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::KwList
                | TokenKind::KwMap
                | TokenKind::KwChannel
                | TokenKind::KwReference
                | TokenKind::KwFunc
                | TokenKind::KwError
                | TokenKind::Ident
                | TokenKind::LParen
        )
    }
}
