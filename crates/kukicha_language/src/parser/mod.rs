//! Error-tolerant recursive-descent parser.
//!
//! The parser consumes the lexer's token stream and builds a [`Program`].
//! It never aborts: when a production fails it records the error,
//! synchronizes to the next NEWLINE, DEDENT or declaration keyword, and
//! keeps going, so one typo does not hide the rest of a file's problems.
//!
//! Declarations dispatch on their leading keyword (`petiole`, `import`,
//! `type`, `interface`, `func`, `var`, `skill`); statements on theirs;
//! everything else parses through the expression grammar in
//! [`expr`](self). Context-sensitive keywords (`list`, `of`, `to`, …) are
//! converted back to identifiers wherever the grammar expects a name.

mod decl;
mod expr;
mod stmt;
mod types;


use kukicha_base::{Interner, Span, Symbol};

use crate::arena_ctx::AstContext;
use crate::ast::{ExprId, Program};
use crate::error::{ParseError, ParseErrorKind};
use crate::token::{Token, TokenKind};

pub(crate) type ParseResult<T> = Result<T, ParseError>;

pub struct Parser<'a, 'int> {
    tokens: Vec<Token>,
    current: usize,
    pub(crate) interner: &'int mut Interner,
    pub(crate) ctx: AstContext<'a>,
    errors: Vec<ParseError>,
    next_expr_id: u32,
    /// While set, postfix parsing stops in front of `as` so a switch head
    /// can claim it for the type-switch binding.
    pub(super) suppress_cast: bool,
}

impl<'a, 'int> Parser<'a, 'int> {
    /// Builds a parser over a lexed token stream. Comment tokens are
    /// dropped here; the grammar never sees them.
    pub fn new(tokens: Vec<Token>, interner: &'int mut Interner, ctx: AstContext<'a>) -> Self {
        let tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();
        Parser {
            tokens,
            current: 0,
            interner,
            ctx,
            errors: Vec::new(),
            next_expr_id: 0,
            suppress_cast: false,
        }
    }

    /// Parses the whole token stream into a program plus every error found
    /// along the way.
    pub fn parse_program(mut self) -> (Program<'a>, Vec<ParseError>) {
        let mut program = Program {
            package: None,
            imports: Vec::new(),
            skill: None,
            decls: Vec::new(),
        };

        loop {
            self.skip_newlines();
            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::KwPetiole => match self.parse_package() {
                    Ok(pkg) => {
                        if program.package.is_some() {
                            self.errors.push(ParseError::new(
                                ParseErrorKind::UnexpectedToken {
                                    expected: "a single package declaration".to_string(),
                                    found: TokenKind::KwPetiole,
                                },
                                pkg.span,
                            ));
                        } else {
                            program.package = Some(pkg);
                        }
                    }
                    Err(e) => self.recover(e),
                },
                TokenKind::KwImport => match self.parse_import() {
                    Ok(import) => program.imports.push(import),
                    Err(e) => self.recover(e),
                },
                TokenKind::KwSkill => match self.parse_skill() {
                    Ok(skill) => {
                        if program.skill.is_none() {
                            program.skill = Some(skill);
                        }
                    }
                    Err(e) => self.recover(e),
                },
                TokenKind::KwType
                | TokenKind::KwInterface
                | TokenKind::KwFunc
                | TokenKind::KwVar => match self.parse_declaration() {
                    Ok(decl) => program.decls.push(decl),
                    Err(e) => self.recover(e),
                },
                // Stray layout tokens can be left behind by recovery from a
                // malformed declaration; skip them without a second error.
                TokenKind::Indent | TokenKind::Dedent => {
                    self.advance();
                }
                found => {
                    let span = self.peek_span();
                    self.recover(ParseError::new(
                        ParseErrorKind::ExpectedDeclaration { found },
                        span,
                    ));
                }
            }
        }

        (program, self.errors)
    }

    /// Parses the token stream as a single expression. Used by the code
    /// generator to re-tokenize string-interpolation holes.
    pub fn parse_single_expression(mut self) -> Result<&'a crate::ast::Expr<'a>, ParseError> {
        self.skip_newlines();
        let expr = self.parse_expression()?;
        Ok(expr)
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn peek_span(&self) -> Span {
        self.peek().span
    }

    /// Kind of the token `offset` positions ahead, saturating at EOF.
    pub(crate) fn peek_ahead(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.current + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    pub(crate) fn at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.current + 1 < self.tokens.len() {
            self.current += 1;
        }
        token
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// Consumes and returns the next token when it matches.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::new(
            ParseErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: self.peek_kind(),
            },
            self.peek_span(),
        )
    }

    /// Consumes an identifier, accepting the context-sensitive keywords
    /// that double as names (`list`, `of`, `to`, …).
    pub(crate) fn expect_ident(&mut self) -> ParseResult<(Symbol, Span)> {
        let kind = self.peek_kind();
        if kind == TokenKind::Ident {
            let token = self.advance();
            return Ok((token.lexeme, token.span));
        }
        if let Some(text) = kind.soft_ident_text() {
            let token = self.advance();
            let sym = self.interner.intern(text);
            return Ok((sym, token.span));
        }
        Err(ParseError::new(
            ParseErrorKind::ExpectedIdentifier { found: kind },
            self.peek_span(),
        ))
    }

    /// Consumes the statement terminator. DEDENT and EOF terminate without
    /// being consumed, so enclosing blocks still see them. A statement
    /// whose final expression carried its own indented block (a function
    /// literal, say) has already consumed its DEDENT and is terminated too.
    pub(crate) fn end_of_line(&mut self) -> ParseResult<()> {
        match self.peek_kind() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Dedent | TokenKind::Eof => Ok(()),
            _ => {
                if self.current > 0 && self.tokens[self.current - 1].kind == TokenKind::Dedent {
                    return Ok(());
                }
                Err(self.unexpected("end of line"))
            }
        }
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    pub(crate) fn fresh_id(&mut self) -> ExprId {
        let id = ExprId(self.next_expr_id);
        self.next_expr_id += 1;
        id
    }

    // =========================================================================
    // Error recovery
    // =========================================================================

    /// Records `error` and skips to the next synchronization point: just
    /// past a NEWLINE, or in front of a DEDENT, declaration keyword or EOF.
    /// Always makes progress so a stuck production cannot loop.
    pub(crate) fn recover(&mut self, error: ParseError) {
        self.errors.push(error);
        let before = self.current;
        self.synchronize();
        if self.current == before
            && !matches!(self.peek_kind(), TokenKind::Dedent | TokenKind::Eof)
        {
            self.advance();
        }
    }

    pub(crate) fn synchronize(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Newline => {
                    self.advance();
                    return;
                }
                TokenKind::Dedent | TokenKind::Eof => return,
                kind if kind.starts_declaration() => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    pub(crate) fn record_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }
}
