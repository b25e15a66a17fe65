//! Indentation-sensitive lexer.
//!
//! Transforms a UTF-8 source buffer into a token stream, synthesizing the
//! block structure that kukicha expresses through layout:
//!
//! - **Indentation**: an indent stack (initially `[0]`) turns 4-space level
//!   changes into INDENT/DEDENT tokens. Tabs and ragged widths are
//!   positioned errors. Blank lines and comment-only lines never touch the
//!   stack, and every INDENT is closed by exactly one DEDENT.
//! - **Newline suppression**: no NEWLINE is emitted while bracket depth
//!   (`[`/`{`) is positive, after a trailing `|>`, or when the next
//!   non-blank line begins with `|>` or `onerr` — so pipe chains and error
//!   handlers may continue across lines. Parentheses do not suppress,
//!   because function-literal bodies inside call arguments still need
//!   INDENT/DEDENT to delimit their block.
//! - **Strings**: double-quoted literals decode escapes and split on `{…}`
//!   interpolation holes (`{{`/`}}` are literal braces); each hole's raw
//!   text and span are recorded on the token. Raw strings use backticks,
//!   rune literals single quotes.
//!
//! Lexing never aborts: errors are collected and scanning continues
//! wherever recovery is possible.

use kukicha_base::{Interner, Span, Symbol};

use crate::error::{ParseError, ParseErrorKind};
use crate::token::{StrPart, Token, TokenKind};

pub struct Lexer<'s, 'int> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
    interner: &'int mut Interner,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
    indent_stack: Vec<usize>,
    /// Depth of open `[` and `{` brackets. Newlines and indentation are
    /// plain whitespace while positive.
    bracket_depth: usize,
    /// The next physical line continues the current logical line, so its
    /// leading whitespace must not be read as indentation.
    continuation: bool,
}

impl<'s, 'int> Lexer<'s, 'int> {
    pub fn new(source: &'s str, interner: &'int mut Interner) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            interner,
            tokens: Vec::new(),
            errors: Vec::new(),
            indent_stack: vec![0],
            bracket_depth: 0,
            continuation: false,
        }
    }

    /// Runs the lexer over the whole buffer.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<ParseError>) {
        self.lex_line_start();
        while self.pos < self.bytes.len() {
            self.skip_inline_whitespace();
            if self.pos >= self.bytes.len() {
                break;
            }
            match self.bytes[self.pos] {
                b'\n' => {
                    self.lex_newline();
                    self.lex_line_start();
                }
                b'\r' => {
                    // CRLF line endings: the '\n' that follows does the work.
                    self.pos += 1;
                }
                _ => self.lex_token(),
            }
        }
        self.finish();
        (self.tokens, self.errors)
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Consumes leading whitespace at the start of a physical line and
    /// updates the indent stack, skipping blank and comment-only lines.
    fn lex_line_start(&mut self) {
        if self.bracket_depth > 0 || self.continuation {
            self.continuation = false;
            self.skip_inline_whitespace();
            return;
        }

        loop {
            let line_begin = self.pos;
            let mut width = 0usize;
            let mut saw_tab = false;
            while self.pos < self.bytes.len() {
                match self.bytes[self.pos] {
                    b' ' => {
                        width += 1;
                        self.pos += 1;
                    }
                    b'\t' => {
                        saw_tab = true;
                        width += 1;
                        self.pos += 1;
                    }
                    _ => break,
                }
            }

            // Blank line or end of input: no layout effect.
            if self.pos >= self.bytes.len() {
                return;
            }
            match self.bytes[self.pos] {
                b'\n' => {
                    self.pos += 1;
                    continue;
                }
                b'\r' => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }
            // A line holding only a comment does not affect the stack.
            if self.rest().starts_with("//") {
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }

            if saw_tab {
                self.error(ParseErrorKind::TabIndentation, Span::new(line_begin, self.pos));
            }

            let top = *self.indent_stack.last().unwrap_or(&0);
            let here = Span::point(self.pos);
            if width > top {
                if width % 4 != 0 {
                    self.error(ParseErrorKind::IndentNotMultipleOfFour { width }, here);
                } else if width - top != 4 {
                    self.error(ParseErrorKind::IndentTooDeep { from: top, to: width }, here);
                }
                // Push the observed width even after an error so the
                // matching dedent still closes this block.
                self.indent_stack.push(width);
                self.push_structural(TokenKind::Indent, here);
            } else if width < top {
                while self.indent_stack.len() > 1
                    && *self.indent_stack.last().unwrap() > width
                {
                    self.indent_stack.pop();
                    self.push_structural(TokenKind::Dedent, here);
                }
                if *self.indent_stack.last().unwrap() != width {
                    self.error(ParseErrorKind::InconsistentDedent { width }, here);
                }
            }
            return;
        }
    }

    fn lex_newline(&mut self) {
        let at = self.pos;
        self.pos += 1;
        if self.bracket_depth > 0 {
            return;
        }
        if self.last_significant_kind() == Some(TokenKind::PipeArrow) {
            self.continuation = true;
            return;
        }
        if self.next_line_continues() {
            self.continuation = true;
            return;
        }
        self.push_structural(TokenKind::Newline, Span::new(at, at + 1));
    }

    /// True when the next non-blank line begins with `|>` or `onerr`.
    fn next_line_continues(&self) -> bool {
        let mut i = self.pos;
        loop {
            // Skip this line's leading whitespace.
            while i < self.bytes.len() && matches!(self.bytes[i], b' ' | b'\t' | b'\r') {
                i += 1;
            }
            if i >= self.bytes.len() {
                return false;
            }
            if self.bytes[i] == b'\n' {
                i += 1;
                continue;
            }
            let rest = &self.source[i..];
            if rest.starts_with("//") {
                while i < self.bytes.len() && self.bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            if rest.starts_with("|>") {
                return true;
            }
            if let Some(tail) = rest.strip_prefix("onerr") {
                return !tail.starts_with(|c: char| c.is_alphanumeric() || c == '_');
            }
            return false;
        }
    }

    fn finish(&mut self) {
        let end = Span::point(self.bytes.len());
        if !matches!(
            self.last_significant_kind(),
            None | Some(TokenKind::Newline) | Some(TokenKind::Dedent) | Some(TokenKind::Indent)
        ) {
            self.push_structural(TokenKind::Newline, end);
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push_structural(TokenKind::Dedent, end);
        }
        self.push_structural(TokenKind::Eof, end);
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    fn lex_token(&mut self) {
        let start = self.pos;
        let b = self.bytes[self.pos];
        match b {
            b'"' => self.lex_string(),
            b'`' => self.lex_raw_string(),
            b'\'' => self.lex_rune(),
            b'0'..=b'9' => self.lex_number(),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.lex_word(),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'[' => {
                self.bracket_depth += 1;
                self.single(TokenKind::LBracket);
            }
            b']' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                self.single(TokenKind::RBracket);
            }
            b'{' => {
                self.bracket_depth += 1;
                self.single(TokenKind::LBrace);
            }
            b'}' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                self.single(TokenKind::RBrace);
            }
            b',' => self.single(TokenKind::Comma),
            b'.' => self.single(TokenKind::Dot),
            b'*' => self.single(TokenKind::Star),
            b'%' => self.single(TokenKind::Percent),
            b'+' => self.one_or_two(TokenKind::Plus, b'+', TokenKind::PlusPlus),
            b'-' => {
                if self.peek_at(1) == Some(b'-') {
                    self.double(TokenKind::MinusMinus);
                } else if self.peek_at(1) == Some(b'>') {
                    self.double(TokenKind::Arrow);
                } else {
                    self.single(TokenKind::Minus);
                }
            }
            b'/' => {
                if self.peek_at(1) == Some(b'/') {
                    self.lex_comment();
                } else {
                    self.single(TokenKind::Slash);
                }
            }
            b':' => self.one_or_two(TokenKind::Colon, b'=', TokenKind::Declare),
            b'=' => {
                if self.peek_at(1) == Some(b'=') {
                    self.double(TokenKind::EqEq);
                } else if self.peek_at(1) == Some(b'>') {
                    self.double(TokenKind::FatArrow);
                } else {
                    self.single(TokenKind::Assign);
                }
            }
            b'!' => self.one_or_two(TokenKind::Bang, b'=', TokenKind::NotEq),
            b'<' => {
                if self.peek_at(1) == Some(b'-') {
                    self.double(TokenKind::LeftArrow);
                } else if self.peek_at(1) == Some(b'=') {
                    self.double(TokenKind::LtEq);
                } else {
                    self.single(TokenKind::Lt);
                }
            }
            b'>' => self.one_or_two(TokenKind::Gt, b'=', TokenKind::GtEq),
            b'|' => {
                if self.peek_at(1) == Some(b'>') {
                    self.double(TokenKind::PipeArrow);
                } else if self.peek_at(1) == Some(b'|') {
                    self.double(TokenKind::OrOr);
                } else {
                    let ch = self.source[self.pos..].chars().next().unwrap_or('|');
                    self.error(ParseErrorKind::UnexpectedChar { ch }, Span::new(start, start + 1));
                    self.pos += 1;
                }
            }
            b'&' => {
                if self.peek_at(1) == Some(b'&') {
                    self.double(TokenKind::AndAnd);
                } else {
                    self.error(ParseErrorKind::UnexpectedChar { ch: '&' }, Span::new(start, start + 1));
                    self.pos += 1;
                }
            }
            _ => {
                let ch = self.source[self.pos..].chars().next().unwrap_or('\u{fffd}');
                self.error(ParseErrorKind::UnexpectedChar { ch }, Span::new(start, start + ch.len_utf8()));
                self.pos += ch.len_utf8();
            }
        }
    }

    fn lex_word(&mut self) {
        let start = self.pos;
        while self.pos < self.bytes.len()
            && matches!(self.bytes[self.pos], b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')
        {
            self.pos += 1;
        }
        let word = &self.source[start..self.pos];
        let kind = TokenKind::keyword(word).unwrap_or(TokenKind::Ident);
        let lexeme = self.interner.intern(word);
        self.tokens.push(Token::new(kind, lexeme, Span::new(start, self.pos)));
    }

    fn lex_comment(&mut self) {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
        let lexeme = self.interner.intern(&self.source[start..self.pos]);
        self.tokens.push(Token::new(TokenKind::Comment, lexeme, Span::new(start, self.pos)));
    }

    fn lex_number(&mut self) {
        let src = self.source;
        let start = self.pos;

        if self.bytes[self.pos] == b'0' {
            let radix = match self.peek_at(1) {
                Some(b'x') | Some(b'X') => Some(16),
                Some(b'o') | Some(b'O') => Some(8),
                Some(b'b') | Some(b'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.pos += 2;
                let digits_start = self.pos;
                while self.pos < self.bytes.len()
                    && (self.bytes[self.pos] == b'_'
                        || (self.bytes[self.pos] as char).is_digit(radix))
                {
                    self.pos += 1;
                }
                self.consume_trailing_word();
                let text = &src[start..self.pos];
                if self.pos == digits_start || !self.is_clean_int(&text[2..], radix) {
                    self.error(
                        ParseErrorKind::InvalidNumber { text: text.to_string() },
                        Span::new(start, self.pos),
                    );
                }
                let lexeme = self.interner.intern(text);
                self.tokens.push(Token::new(TokenKind::Int, lexeme, Span::new(start, self.pos)));
                return;
            }
        }

        let mut is_float = false;
        while self.pos < self.bytes.len()
            && matches!(self.bytes[self.pos], b'0'..=b'9' | b'_')
        {
            self.pos += 1;
        }
        if self.pos + 1 < self.bytes.len()
            && self.bytes[self.pos] == b'.'
            && self.bytes[self.pos + 1].is_ascii_digit()
        {
            is_float = true;
            self.pos += 1;
            while self.pos < self.bytes.len()
                && matches!(self.bytes[self.pos], b'0'..=b'9' | b'_')
            {
                self.pos += 1;
            }
        }
        if self.pos < self.bytes.len() && matches!(self.bytes[self.pos], b'e' | b'E') {
            let mut ahead = self.pos + 1;
            if ahead < self.bytes.len() && matches!(self.bytes[ahead], b'+' | b'-') {
                ahead += 1;
            }
            if ahead < self.bytes.len() && self.bytes[ahead].is_ascii_digit() {
                is_float = true;
                self.pos = ahead;
                while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
                    self.pos += 1;
                }
            }
        }

        let clean_end = self.pos;
        self.consume_trailing_word();
        let text = &src[start..self.pos];
        if self.pos != clean_end {
            self.error(
                ParseErrorKind::InvalidNumber { text: text.to_string() },
                Span::new(start, self.pos),
            );
        }
        let kind = if is_float { TokenKind::Float } else { TokenKind::Int };
        let lexeme = self.interner.intern(text);
        self.tokens.push(Token::new(kind, lexeme, Span::new(start, self.pos)));
    }

    /// Letters glued onto a number (`12abc`) make the whole word invalid;
    /// consume them so the parser does not see a phantom identifier.
    fn consume_trailing_word(&mut self) {
        while self.pos < self.bytes.len()
            && matches!(self.bytes[self.pos], b'A'..=b'Z' | b'a'..=b'z' | b'_')
        {
            self.pos += 1;
        }
    }

    fn is_clean_int(&self, digits: &str, radix: u32) -> bool {
        !digits.is_empty()
            && digits.chars().all(|c| c == '_' || c.is_digit(radix))
            && digits.chars().any(|c| c != '_')
    }

    fn lex_string(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let mut text = String::new();
        let mut parts: Vec<StrPart> = Vec::new();
        let mut has_hole = false;
        let mut terminated = false;

        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\n' => break,
                b'"' => {
                    self.pos += 1;
                    terminated = true;
                    break;
                }
                b'\\' => self.lex_escape(&mut text),
                b'{' => {
                    if self.peek_at(1) == Some(b'{') {
                        text.push('{');
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                        let hole_start = self.pos;
                        let mut depth = 1usize;
                        while self.pos < self.bytes.len() {
                            match self.bytes[self.pos] {
                                b'\n' => break,
                                b'{' => depth += 1,
                                b'}' => {
                                    depth -= 1;
                                    if depth == 0 {
                                        break;
                                    }
                                }
                                _ => {}
                            }
                            self.pos += 1;
                        }
                        if self.pos >= self.bytes.len() || self.bytes[self.pos] != b'}' {
                            break;
                        }
                        let hole_end = self.pos;
                        self.pos += 1;
                        if !text.is_empty() {
                            parts.push(StrPart::Text(std::mem::take(&mut text)));
                        }
                        parts.push(StrPart::Hole {
                            text: self.source[hole_start..hole_end].to_string(),
                            span: Span::new(hole_start, hole_end),
                        });
                        has_hole = true;
                    }
                }
                b'}' => {
                    // `}}` renders a literal brace; a lone `}` is taken
                    // literally as well.
                    if self.peek_at(1) == Some(b'}') {
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                    }
                    text.push('}');
                }
                _ => {
                    let ch = self.source[self.pos..].chars().next().unwrap();
                    text.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }

        if !terminated {
            self.error(ParseErrorKind::UnterminatedString, Span::new(start, self.pos));
        }

        let span = Span::new(start, self.pos);
        if has_hole {
            if !text.is_empty() {
                parts.push(StrPart::Text(text));
            }
            let lexeme = self.interner.intern(&self.source[start..self.pos]);
            let mut token = Token::new(TokenKind::Str, lexeme, span);
            token.parts = Some(parts);
            self.tokens.push(token);
        } else {
            let lexeme = self.interner.intern(&text);
            self.tokens.push(Token::new(TokenKind::Str, lexeme, span));
        }
    }

    fn lex_escape(&mut self, text: &mut String) {
        let esc_start = self.pos;
        self.pos += 1;
        let Some(&b) = self.bytes.get(self.pos) else {
            self.error(
                ParseErrorKind::InvalidEscape { sequence: String::new() },
                Span::new(esc_start, self.pos),
            );
            return;
        };
        match b {
            b'n' => {
                text.push('\n');
                self.pos += 1;
            }
            b'r' => {
                text.push('\r');
                self.pos += 1;
            }
            b't' => {
                text.push('\t');
                self.pos += 1;
            }
            b'\\' => {
                text.push('\\');
                self.pos += 1;
            }
            b'"' => {
                text.push('"');
                self.pos += 1;
            }
            b'\'' => {
                text.push('\'');
                self.pos += 1;
            }
            b'0'..=b'7' => {
                // Octal: up to three digits.
                let mut value = 0u32;
                let mut digits = 0;
                while digits < 3
                    && self.pos < self.bytes.len()
                    && (b'0'..=b'7').contains(&self.bytes[self.pos])
                {
                    value = value * 8 + u32::from(self.bytes[self.pos] - b'0');
                    self.pos += 1;
                    digits += 1;
                }
                match char::from_u32(value) {
                    Some(c) => text.push(c),
                    None => self.bad_escape(esc_start),
                }
            }
            b'x' | b'u' => {
                self.pos += 1;
                if self.bytes.get(self.pos) != Some(&b'{') {
                    self.bad_escape(esc_start);
                    return;
                }
                self.pos += 1;
                let digits_start = self.pos;
                while self.pos < self.bytes.len()
                    && (self.bytes[self.pos] as char).is_ascii_hexdigit()
                {
                    self.pos += 1;
                }
                let digits = &self.source[digits_start..self.pos];
                let closed = self.bytes.get(self.pos) == Some(&b'}');
                if closed {
                    self.pos += 1;
                }
                let want_four = b == b'u';
                let ok = closed
                    && !digits.is_empty()
                    && (!want_four || digits.len() == 4);
                match (ok, u32::from_str_radix(digits, 16).ok().and_then(char::from_u32)) {
                    (true, Some(c)) => text.push(c),
                    _ => self.bad_escape(esc_start),
                }
            }
            _ => {
                let ch = self.source[self.pos..].chars().next().unwrap_or('?');
                self.pos += ch.len_utf8();
                self.error(
                    ParseErrorKind::InvalidEscape { sequence: ch.to_string() },
                    Span::new(esc_start, self.pos),
                );
            }
        }
    }

    fn bad_escape(&mut self, esc_start: usize) {
        let sequence = self.source[esc_start + 1..self.pos.min(self.source.len())].to_string();
        self.error(
            ParseErrorKind::InvalidEscape { sequence },
            Span::new(esc_start, self.pos),
        );
    }

    fn lex_raw_string(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let content_start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'`' {
            self.pos += 1;
        }
        let content_end = self.pos;
        if self.pos < self.bytes.len() {
            self.pos += 1;
        } else {
            self.error(ParseErrorKind::UnterminatedRawString, Span::new(start, self.pos));
        }
        let lexeme = self.interner.intern(&self.source[content_start..content_end]);
        self.tokens.push(Token::new(TokenKind::RawStr, lexeme, Span::new(start, self.pos)));
    }

    fn lex_rune(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let mut text = String::new();
        match self.bytes.get(self.pos) {
            Some(b'\\') => self.lex_escape(&mut text),
            Some(b'\n') | None => {}
            Some(_) => {
                let ch = self.source[self.pos..].chars().next().unwrap();
                text.push(ch);
                self.pos += ch.len_utf8();
            }
        }
        if self.bytes.get(self.pos) == Some(&b'\'') {
            self.pos += 1;
        } else {
            self.error(ParseErrorKind::UnterminatedRune, Span::new(start, self.pos));
        }
        let lexeme = self.interner.intern(&text);
        self.tokens.push(Token::new(TokenKind::Rune, lexeme, Span::new(start, self.pos)));
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn rest(&self) -> &'s str {
        let src = self.source;
        &src[self.pos..]
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_inline_whitespace(&mut self) {
        while self.pos < self.bytes.len() && matches!(self.bytes[self.pos], b' ' | b'\t' | b'\r') {
            self.pos += 1;
        }
    }

    fn single(&mut self, kind: TokenKind) {
        let span = Span::new(self.pos, self.pos + 1);
        let lexeme = self.interner.intern(&self.source[self.pos..self.pos + 1]);
        self.pos += 1;
        self.tokens.push(Token::new(kind, lexeme, span));
    }

    fn double(&mut self, kind: TokenKind) {
        let span = Span::new(self.pos, self.pos + 2);
        let lexeme = self.interner.intern(&self.source[self.pos..self.pos + 2]);
        self.pos += 2;
        self.tokens.push(Token::new(kind, lexeme, span));
    }

    fn one_or_two(&mut self, one: TokenKind, second: u8, two: TokenKind) {
        if self.peek_at(1) == Some(second) {
            self.double(two);
        } else {
            self.single(one);
        }
    }

    fn push_structural(&mut self, kind: TokenKind, span: Span) {
        self.tokens.push(Token::new(kind, Symbol::EMPTY, span));
    }

    fn last_significant_kind(&self) -> Option<TokenKind> {
        self.tokens
            .iter()
            .rev()
            .find(|t| t.kind != TokenKind::Comment)
            .map(|t| t.kind)
    }

    fn error(&mut self, kind: ParseErrorKind, span: Span) {
        self.errors.push(ParseError::new(kind, span));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut interner = Interner::new();
        let (tokens, errors) = Lexer::new(source, &mut interner).tokenize();
        assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    fn lex_with_errors(source: &str) -> (Vec<Token>, Vec<ParseError>) {
        let mut interner = Interner::new();
        Lexer::new(source, &mut interner).tokenize()
    }

    #[test]
    fn flat_statement_ends_with_newline_and_eof() {
        use TokenKind::*;
        assert_eq!(
            kinds("x := 1\n"),
            vec![Ident, Declare, Int, Newline, Eof]
        );
    }

    #[test]
    fn indent_and_dedent_are_balanced() {
        let source = "func main()\n    x := 1\n    if x > 0\n        x = 2\ny := 3\n";
        let kinds = kinds(source);
        let indents = kinds.iter().filter(|k| **k == TokenKind::Indent).count();
        let dedents = kinds.iter().filter(|k| **k == TokenKind::Dedent).count();
        assert_eq!(indents, 2);
        assert_eq!(indents, dedents);
    }

    #[test]
    fn blank_and_comment_lines_do_not_dedent() {
        let source = "func f()\n    a := 1\n\n    // note\n    b := 2\n";
        let kinds = kinds(source);
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Indent).count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Dedent).count(), 1);
    }

    #[test]
    fn eof_closes_all_open_blocks() {
        let source = "func f()\n    if x\n        y := 1";
        let kinds = kinds(source);
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Dedent).count(), 2);
        assert_eq!(kinds.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn tab_indentation_is_an_error() {
        let (_, errors) = lex_with_errors("func f()\n\tx := 1\n");
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind, ParseErrorKind::TabIndentation)));
    }

    #[test]
    fn ragged_indent_width_is_an_error() {
        let (_, errors) = lex_with_errors("func f()\n   x := 1\n");
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind, ParseErrorKind::IndentNotMultipleOfFour { width: 3 })));
    }

    #[test]
    fn eight_space_jump_is_an_error() {
        let (_, errors) = lex_with_errors("func f()\n        x := 1\n");
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind, ParseErrorKind::IndentTooDeep { from: 0, to: 8 })));
    }

    #[test]
    fn newline_suppressed_inside_brackets() {
        let source = "xs := [1,\n    2,\n    3]\n";
        let kinds = kinds(source);
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
        assert!(!kinds.contains(&TokenKind::Indent));
    }

    #[test]
    fn newline_suppressed_after_trailing_pipe() {
        let source = "data |>\n    process\n";
        let kinds = kinds(source);
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
        assert!(!kinds.contains(&TokenKind::Indent));
    }

    #[test]
    fn newline_suppressed_before_leading_pipe() {
        let source = "data\n    |> process\n";
        let kinds = kinds(source);
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
        assert!(!kinds.contains(&TokenKind::Indent));
    }

    #[test]
    fn newline_suppressed_before_onerr_line() {
        let source = "x := load()\n    onerr return\n";
        let kinds = kinds(source);
        assert!(kinds.contains(&TokenKind::KwOnerr));
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
        assert!(!kinds.contains(&TokenKind::Indent));
    }

    #[test]
    fn onerrish_identifier_does_not_suppress() {
        let source = "x := 1\nonerrlike()\n";
        let kinds = kinds(source);
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Newline).count(), 2);
    }

    #[test]
    fn parens_do_not_suppress_newlines() {
        // A function literal in an argument list needs layout tokens.
        let source = "apply(func() int\n    return 1\n)\n";
        let kinds = kinds(source);
        assert!(kinds.contains(&TokenKind::Indent));
        assert!(kinds.contains(&TokenKind::Dedent));
    }

    #[test]
    fn plain_string_decodes_escapes() {
        let mut interner = Interner::new();
        let (tokens, errors) = Lexer::new(r#"s := "a\tb\n""#, &mut interner).tokenize();
        assert!(errors.is_empty());
        let s = tokens.iter().find(|t| t.kind == TokenKind::Str).unwrap();
        assert_eq!(interner.resolve(s.lexeme), "a\tb\n");
        assert!(!s.is_interpolated());
    }

    #[test]
    fn interpolated_string_records_holes() {
        let mut interner = Interner::new();
        let (tokens, errors) =
            Lexer::new(r#"m := "hi {name}, {n} left""#, &mut interner).tokenize();
        assert!(errors.is_empty());
        let s = tokens.iter().find(|t| t.kind == TokenKind::Str).unwrap();
        let parts = s.parts.as_ref().expect("interpolated");
        let holes: Vec<&str> = parts
            .iter()
            .filter_map(|p| match p {
                StrPart::Hole { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(holes, vec!["name", "n"]);
    }

    #[test]
    fn doubled_braces_are_literal() {
        let mut interner = Interner::new();
        let (tokens, errors) = Lexer::new(r#"s := "{{x}}""#, &mut interner).tokenize();
        assert!(errors.is_empty());
        let s = tokens.iter().find(|t| t.kind == TokenKind::Str).unwrap();
        assert!(!s.is_interpolated());
        assert_eq!(interner.resolve(s.lexeme), "{x}");
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (_, errors) = lex_with_errors("s := \"oops\n");
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind, ParseErrorKind::UnterminatedString)));
    }

    #[test]
    fn invalid_escape_is_reported() {
        let (_, errors) = lex_with_errors(r#"s := "a\qb""#);
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind, ParseErrorKind::InvalidEscape { .. })));
    }

    #[test]
    fn unicode_escape_decodes() {
        let mut interner = Interner::new();
        let (tokens, errors) = Lexer::new(r#"s := "\u{0041}\x{42}""#, &mut interner).tokenize();
        assert!(errors.is_empty(), "{:?}", errors);
        let s = tokens.iter().find(|t| t.kind == TokenKind::Str).unwrap();
        assert_eq!(interner.resolve(s.lexeme), "AB");
    }

    #[test]
    fn numbers_classify_int_and_float() {
        use TokenKind::*;
        assert_eq!(
            kinds("a := 42\nb := 3.5\nc := 1e9\nd := 0xff\n")
                .into_iter()
                .filter(|k| matches!(k, Int | Float))
                .collect::<Vec<_>>(),
            vec![Int, Float, Float, Int]
        );
    }

    #[test]
    fn glued_letters_make_a_number_invalid() {
        let (_, errors) = lex_with_errors("x := 12abc\n");
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind, ParseErrorKind::InvalidNumber { .. })));
    }

    #[test]
    fn raw_string_takes_no_escapes() {
        let mut interner = Interner::new();
        let (tokens, errors) = Lexer::new("s := `a\\nb`\n", &mut interner).tokenize();
        assert!(errors.is_empty());
        let s = tokens.iter().find(|t| t.kind == TokenKind::RawStr).unwrap();
        assert_eq!(interner.resolve(s.lexeme), "a\\nb");
    }

    #[test]
    fn keywords_and_identifiers_split() {
        let kinds = kinds("for item in items\n    print(item)\n");
        assert!(kinds.contains(&TokenKind::KwFor));
        assert!(kinds.contains(&TokenKind::KwIn));
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Ident).count(), 4);
    }

    #[test]
    fn lexing_continues_after_errors() {
        let (tokens, errors) = lex_with_errors("x := 12abc\ny := 2\n");
        assert!(!errors.is_empty());
        let idents = tokens.iter().filter(|t| t.kind == TokenKind::Ident).count();
        assert_eq!(idents, 2);
    }

    #[test]
    fn indent_token_marks_following_line() {
        let source = "func f()\n    x := 1\n";
        let mut interner = Interner::new();
        let (tokens, _) = Lexer::new(source, &mut interner).tokenize();
        let indent = tokens.iter().find(|t| t.kind == TokenKind::Indent).unwrap();
        assert_eq!(indent.span.start, source.find("x :=").unwrap());
    }
}
