//! Declaration parsing: package, imports, skills, types, interfaces,
//! functions and global variables.

use crate::ast::{
    Decl, Field, FunctionDecl, ImportDecl, InterfaceDecl, MethodSig, PackageDecl, Param, Receiver,
    SkillDecl, SkillOption, TypeAnn, TypeDeclKind,
};
use crate::error::{ParseError, ParseErrorKind};
use crate::token::TokenKind;

use super::{ParseResult, Parser};

impl<'a, 'int> Parser<'a, 'int> {
    /// `petiole NAME`
    pub(super) fn parse_package(&mut self) -> ParseResult<PackageDecl> {
        let start = self.expect(TokenKind::KwPetiole)?.span;
        let (name, name_span) = self.expect_ident()?;
        self.end_of_line()?;
        Ok(PackageDecl { name, span: start.merge(name_span) })
    }

    /// `import "PATH" [as NAME]`
    pub(super) fn parse_import(&mut self) -> ParseResult<ImportDecl> {
        let start = self.expect(TokenKind::KwImport)?.span;
        let path_token = self.expect(TokenKind::Str)?;
        let mut span = start.merge(path_token.span);
        let alias = if self.eat(TokenKind::KwAs).is_some() {
            let (alias, alias_span) = self.expect_ident()?;
            span = span.merge(alias_span);
            Some(alias)
        } else {
            None
        };
        self.end_of_line()?;
        Ok(ImportDecl { path: path_token.lexeme, alias, span })
    }

    /// `skill NAME` with indented `key: "value"` option lines.
    pub(super) fn parse_skill(&mut self) -> ParseResult<SkillDecl> {
        let start = self.expect(TokenKind::KwSkill)?.span;
        let (name, name_span) = self.expect_ident()?;
        let mut options = Vec::new();
        let mut span = start.merge(name_span);

        self.expect(TokenKind::Newline)?;
        if self.eat(TokenKind::Indent).is_some() {
            while !self.check(TokenKind::Dedent) && !self.at_end() {
                if self.eat(TokenKind::Newline).is_some() {
                    continue;
                }
                let (key, key_span) = self.expect_ident()?;
                self.expect(TokenKind::Colon)?;
                let value = self.expect(TokenKind::Str)?;
                span = span.merge(value.span);
                options.push(SkillOption {
                    key,
                    value: value.lexeme,
                    span: key_span.merge(value.span),
                });
                self.end_of_line()?;
            }
            self.expect(TokenKind::Dedent)?;
        }

        Ok(SkillDecl { name, options, span })
    }

    pub(super) fn parse_declaration(&mut self) -> ParseResult<Decl<'a>> {
        match self.peek_kind() {
            TokenKind::KwType => self.parse_type_decl(),
            TokenKind::KwInterface => self.parse_interface_decl(),
            TokenKind::KwFunc => self.parse_function_decl().map(Decl::Function),
            TokenKind::KwVar => self.parse_global_var(),
            found => Err(ParseError::new(
                ParseErrorKind::ExpectedDeclaration { found },
                self.peek_span(),
            )),
        }
    }

    /// `type NAME` + indented fields (struct), or `type NAME TYPE` (alias).
    fn parse_type_decl(&mut self) -> ParseResult<Decl<'a>> {
        let start = self.expect(TokenKind::KwType)?.span;
        let (name, name_span) = self.expect_ident()?;
        let mut span = start.merge(name_span);

        if self.check(TokenKind::Newline) {
            self.advance();
            self.expect(TokenKind::Indent)?;
            let mut fields = Vec::new();
            while !self.check(TokenKind::Dedent) && !self.at_end() {
                if self.eat(TokenKind::Newline).is_some() {
                    continue;
                }
                let (field_name, field_span) = self.expect_ident()?;
                let ty = self.parse_type()?;
                span = span.merge(ty.span());
                fields.push(Field {
                    name: field_name,
                    ty,
                    span: field_span.merge(ty.span()),
                });
                self.end_of_line()?;
            }
            self.expect(TokenKind::Dedent)?;
            Ok(Decl::Type { name, kind: TypeDeclKind::Struct(fields), span })
        } else {
            let ty = self.parse_type()?;
            span = span.merge(ty.span());
            self.end_of_line()?;
            Ok(Decl::Type { name, kind: TypeDeclKind::Alias(ty), span })
        }
    }

    /// `interface NAME` with indented method signatures.
    fn parse_interface_decl(&mut self) -> ParseResult<Decl<'a>> {
        let start = self.expect(TokenKind::KwInterface)?.span;
        let (name, name_span) = self.expect_ident()?;
        let mut span = start.merge(name_span);
        let mut methods = Vec::new();

        self.expect(TokenKind::Newline)?;
        self.expect(TokenKind::Indent)?;
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            if self.eat(TokenKind::Newline).is_some() {
                continue;
            }
            let (method_name, method_span) = self.expect_ident()?;
            self.expect(TokenKind::LParen)?;
            let params = self.parse_params()?;
            let returns = self.parse_return_types()?;
            let sig_end = returns.last().map(|t| t.span()).unwrap_or(method_span);
            span = span.merge(sig_end);
            methods.push(MethodSig {
                name: method_name,
                params,
                returns,
                span: method_span.merge(sig_end),
            });
            self.end_of_line()?;
        }
        self.expect(TokenKind::Dedent)?;

        Ok(Decl::Interface(InterfaceDecl { name, methods, span }))
    }

    /// `func NAME [on RECV [reference] TYPE](params) [returns]` + body.
    pub(super) fn parse_function_decl(&mut self) -> ParseResult<FunctionDecl<'a>> {
        let start = self.expect(TokenKind::KwFunc)?.span;
        let (name, name_span) = self.expect_ident()?;

        let receiver = if self.eat(TokenKind::KwOn).is_some() {
            let (recv_name, recv_span) = self.expect_ident()?;
            let reference = self.eat(TokenKind::KwReference).is_some();
            let (type_name, type_span) = self.expect_ident()?;
            Some(Receiver {
                name: recv_name,
                type_name,
                reference,
                span: recv_span.merge(type_span),
            })
        } else {
            None
        };

        self.expect(TokenKind::LParen)?;
        let params = self.parse_params()?;
        let returns = self.parse_return_types()?;
        let body = self.parse_block()?;
        let span = start.merge(name_span);

        Ok(FunctionDecl { name, receiver, params, returns, body, span })
    }

    /// The parameter list after `(`, up to and including `)`.
    ///
    /// A parameter missing its type annotation is recorded as an error and
    /// kept with `ty: None` so the rest of the signature still parses.
    pub(super) fn parse_params(&mut self) -> ParseResult<Vec<Param<'a>>> {
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.at_end() {
            let (name, name_span) = self.expect_ident()?;
            let variadic = self.eat(TokenKind::KwMany).is_some();

            let ty = if matches!(
                self.peek_kind(),
                TokenKind::Comma | TokenKind::RParen | TokenKind::Assign
            ) {
                let text = self.interner.resolve(name).to_string();
                self.record_error(ParseError::new(
                    ParseErrorKind::MissingParamType { name: text },
                    name_span,
                ));
                None
            } else {
                Some(self.parse_type()?)
            };

            let default = if self.eat(TokenKind::Assign).is_some() {
                Some(self.parse_expression()?)
            } else {
                None
            };

            params.push(Param {
                name,
                ty,
                default,
                variadic,
                span: name_span,
            });

            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    /// Return types after the parameter list: nothing, a single type, or a
    /// parenthesized list.
    pub(super) fn parse_return_types(&mut self) -> ParseResult<Vec<&'a TypeAnn<'a>>> {
        match self.peek_kind() {
            TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent => Ok(Vec::new()),
            TokenKind::LParen => {
                self.advance();
                let mut returns = Vec::new();
                while !self.check(TokenKind::RParen) && !self.at_end() {
                    returns.push(self.parse_type()?);
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                self.expect(TokenKind::RParen)?;
                Ok(returns)
            }
            _ => Ok(vec![self.parse_type()?]),
        }
    }

    /// `var NAME [TYPE] [= EXPR]` at the top level.
    fn parse_global_var(&mut self) -> ParseResult<Decl<'a>> {
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

        let value = if self.eat(TokenKind::Assign).is_some() {
            let value = self.parse_initializer()?;
            span = span.merge(value.span());
            Some(value)
        } else {
            None
        };

        self.end_of_line()?;
        Ok(Decl::GlobalVar { name, ty, value, span })
    }
}
