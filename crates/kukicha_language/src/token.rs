//! Token vocabulary for the kukicha lexer and parser.
//!
//! Tokens are the atomic syntactic units of kukicha source. The set is
//! closed: every operator, structural marker, literal class and keyword the
//! language will ever produce is a variant of [`TokenKind`].
//!
//! ## Categories
//!
//! | Category | Examples | Notes |
//! |----------|----------|-------|
//! | Operators | `+ := == |> <-` | longest-match wins in the lexer |
//! | Structural | INDENT, DEDENT, NEWLINE | synthesized from layout, not text |
//! | Literals | `42`, `3.5`, `"hi {n}"` | interpolated strings carry parts |
//! | Keywords | `func`, `onerr`, `when` | closed set, some context-sensitive |
//!
//! ## Context-sensitive keywords
//!
//! `list`, `map`, `channel`, `of`, `to`, `through`, `empty` and `error` are
//! only meaningful in type context or in positions the parser requests. The
//! lexer always emits them as keyword tokens; the parser converts them back
//! to identifiers by lookahead when they appear in expression position
//! (see [`TokenKind::soft_ident_text`]).

use kukicha_base::{Span, Symbol};

/// One decoded piece of an interpolated string literal.
///
/// `"hi {name}!"` splits into `Text("hi ")`, `Hole("name")`, `Text("!")`.
/// Hole text is kept raw; the code generator re-tokenizes it as an
/// expression when lowering the literal to a format call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrPart {
    /// Literal text with escape sequences already decoded.
    Text(String),
    /// The raw source text of one `{…}` interpolation hole.
    Hole { text: String, span: Span },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Operators and punctuation
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// `=`
    Assign,
    /// `:=`
    Declare,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
    /// `|>`
    PipeArrow,
    /// `<-`
    LeftArrow,
    /// `->`
    Arrow,
    /// `=>`
    FatArrow,
    /// `!`
    Bang,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,

    // Structural
    Indent,
    Dedent,
    Newline,
    Eof,
    Comment,

    // Literals
    Int,
    Float,
    Str,
    RawStr,
    Rune,
    Ident,

    // Declaration keywords
    KwPetiole,
    KwImport,
    KwType,
    KwInterface,
    KwFunc,
    KwVar,
    KwSkill,

    // Control flow
    KwIf,
    KwElse,
    KwFor,
    KwIn,
    KwFrom,
    KwTo,
    KwThrough,
    KwSwitch,
    KwWhen,
    KwOtherwise,
    KwDefault,
    KwBreak,
    KwContinue,
    KwReturn,
    KwDefer,
    KwGo,
    KwSend,
    KwReceive,
    KwMake,
    KwClose,
    KwSelect,

    // Error handling
    KwOnerr,
    KwDiscard,
    KwPanic,
    KwRecover,
    KwError,
    KwEmpty,
    KwExplain,
    KwAs,

    // Logical
    KwAnd,
    KwOr,
    KwNot,
    KwEquals,

    // Structural types and memory
    KwList,
    KwMap,
    KwChannel,
    KwReference,
    KwOf,
    KwDereference,
    KwOn,

    // Misc
    KwMany,
    KwTrue,
    KwFalse,
    KwThis,
}

impl TokenKind {
    /// Maps an identifier-shaped word to its keyword kind, if any.
    ///
    /// `petiole`/`package`, `func`/`function` and `var`/`variable` are
    /// accepted spellings of the same keyword.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        use TokenKind::*;
        Some(match word {
            "petiole" | "package" => KwPetiole,
            "import" => KwImport,
            "type" => KwType,
            "interface" => KwInterface,
            "func" | "function" => KwFunc,
            "var" | "variable" => KwVar,
            "skill" => KwSkill,
            "if" => KwIf,
            "else" => KwElse,
            "for" => KwFor,
            "in" => KwIn,
            "from" => KwFrom,
            "to" => KwTo,
            "through" => KwThrough,
            "switch" => KwSwitch,
            "when" => KwWhen,
            "otherwise" => KwOtherwise,
            "default" => KwDefault,
            "break" => KwBreak,
            "continue" => KwContinue,
            "return" => KwReturn,
            "defer" => KwDefer,
            "go" => KwGo,
            "send" => KwSend,
            "receive" => KwReceive,
            "make" => KwMake,
            "close" => KwClose,
            "select" => KwSelect,
            "onerr" => KwOnerr,
            "discard" => KwDiscard,
            "panic" => KwPanic,
            "recover" => KwRecover,
            "error" => KwError,
            "empty" => KwEmpty,
            "explain" => KwExplain,
            "as" => KwAs,
            "and" => KwAnd,
            "or" => KwOr,
            "not" => KwNot,
            "equals" => KwEquals,
            "list" => KwList,
            "map" => KwMap,
            "channel" => KwChannel,
            "reference" => KwReference,
            "of" => KwOf,
            "dereference" => KwDereference,
            "on" => KwOn,
            "many" => KwMany,
            "true" => KwTrue,
            "false" => KwFalse,
            "this" => KwThis,
            _ => return None,
        })
    }

    /// Source text of a context-sensitive keyword that may also serve as an
    /// identifier, or `None` for hard keywords and non-keywords.
    pub fn soft_ident_text(self) -> Option<&'static str> {
        use TokenKind::*;
        Some(match self {
            KwList => "list",
            KwMap => "map",
            KwChannel => "channel",
            KwOf => "of",
            KwTo => "to",
            KwThrough => "through",
            KwEmpty => "empty",
            KwError => "error",
            KwFrom => "from",
            KwOn => "on",
            KwWhen => "when",
            KwSend => "send",
            KwReceive => "receive",
            KwSkill => "skill",
            KwExplain => "explain",
            _ => return None,
        })
    }

    /// True for keywords that can open a top-level declaration; the parser
    /// synchronizes on these after an error.
    pub fn starts_declaration(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            KwPetiole | KwImport | KwType | KwInterface | KwFunc | KwVar | KwSkill
        )
    }

    /// Human-readable name used in error messages.
    pub fn describe(self) -> &'static str {
        use TokenKind::*;
        match self {
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            Assign => "'='",
            Declare => "':='",
            EqEq => "'=='",
            NotEq => "'!='",
            Lt => "'<'",
            Gt => "'>'",
            LtEq => "'<='",
            GtEq => "'>='",
            PlusPlus => "'++'",
            MinusMinus => "'--'",
            LParen => "'('",
            RParen => "')'",
            LBracket => "'['",
            RBracket => "']'",
            LBrace => "'{'",
            RBrace => "'}'",
            Comma => "','",
            Dot => "'.'",
            Colon => "':'",
            PipeArrow => "'|>'",
            LeftArrow => "'<-'",
            Arrow => "'->'",
            FatArrow => "'=>'",
            Bang => "'!'",
            AndAnd => "'&&'",
            OrOr => "'||'",
            Indent => "indent",
            Dedent => "dedent",
            Newline => "end of line",
            Eof => "end of file",
            Comment => "comment",
            Int => "integer literal",
            Float => "float literal",
            Str => "string literal",
            RawStr => "raw string literal",
            Rune => "rune literal",
            Ident => "identifier",
            KwPetiole => "'petiole'",
            KwImport => "'import'",
            KwType => "'type'",
            KwInterface => "'interface'",
            KwFunc => "'func'",
            KwVar => "'var'",
            KwSkill => "'skill'",
            KwIf => "'if'",
            KwElse => "'else'",
            KwFor => "'for'",
            KwIn => "'in'",
            KwFrom => "'from'",
            KwTo => "'to'",
            KwThrough => "'through'",
            KwSwitch => "'switch'",
            KwWhen => "'when'",
            KwOtherwise => "'otherwise'",
            KwDefault => "'default'",
            KwBreak => "'break'",
            KwContinue => "'continue'",
            KwReturn => "'return'",
            KwDefer => "'defer'",
            KwGo => "'go'",
            KwSend => "'send'",
            KwReceive => "'receive'",
            KwMake => "'make'",
            KwClose => "'close'",
            KwSelect => "'select'",
            KwOnerr => "'onerr'",
            KwDiscard => "'discard'",
            KwPanic => "'panic'",
            KwRecover => "'recover'",
            KwError => "'error'",
            KwEmpty => "'empty'",
            KwExplain => "'explain'",
            KwAs => "'as'",
            KwAnd => "'and'",
            KwOr => "'or'",
            KwNot => "'not'",
            KwEquals => "'equals'",
            KwList => "'list'",
            KwMap => "'map'",
            KwChannel => "'channel'",
            KwReference => "'reference'",
            KwOf => "'of'",
            KwDereference => "'dereference'",
            KwOn => "'on'",
            KwMany => "'many'",
            KwTrue => "'true'",
            KwFalse => "'false'",
            KwThis => "'this'",
        }
    }
}

/// A lexed token.
///
/// `lexeme` is the interned payload: the decoded text for string and rune
/// literals, the raw source text for everything else. `parts` is `Some`
/// exactly when the token is an interpolated string literal.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: Symbol,
    pub span: Span,
    pub parts: Option<Vec<StrPart>>,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: Symbol, span: Span) -> Self {
        Token { kind, lexeme, span, parts: None }
    }

    /// True for string literals carrying interpolation holes.
    pub fn is_interpolated(&self) -> bool {
        self.parts.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kukicha_base::Interner;

    #[test]
    fn keyword_lookup_covers_spellings() {
        assert_eq!(TokenKind::keyword("petiole"), Some(TokenKind::KwPetiole));
        assert_eq!(TokenKind::keyword("package"), Some(TokenKind::KwPetiole));
        assert_eq!(TokenKind::keyword("func"), Some(TokenKind::KwFunc));
        assert_eq!(TokenKind::keyword("function"), Some(TokenKind::KwFunc));
        assert_eq!(TokenKind::keyword("variable"), Some(TokenKind::KwVar));
        assert_eq!(TokenKind::keyword("frobnicate"), None);
    }

    #[test]
    fn soft_keywords_expose_identifier_text() {
        assert_eq!(TokenKind::KwList.soft_ident_text(), Some("list"));
        assert_eq!(TokenKind::KwError.soft_ident_text(), Some("error"));
        assert_eq!(TokenKind::KwFunc.soft_ident_text(), None);
        assert_eq!(TokenKind::KwReturn.soft_ident_text(), None);
    }

    #[test]
    fn declaration_starters() {
        assert!(TokenKind::KwFunc.starts_declaration());
        assert!(TokenKind::KwSkill.starts_declaration());
        assert!(!TokenKind::KwIf.starts_declaration());
    }

    #[test]
    fn plain_token_is_not_interpolated() {
        let mut interner = Interner::new();
        let lexeme = interner.intern("x");
        let token = Token::new(TokenKind::Ident, lexeme, Span::new(0, 1));
        assert!(!token.is_interpolated());
    }
}
