//! Structural properties of the front end, checked over a small corpus.

use kukicha_base::Interner;
use kukicha_language::{Lexer, TokenKind};

const CORPUS: &[&str] = &[
    "func main()\n    print(\"Hello\")\n",
    "func f()\n    if a\n        if b\n            print(1)\n    print(2)\n",
    "func g()\n    for i from 0 to 3\n        switch i\n            when 0\n                print(\"zero\")\n            otherwise\n                print(\"more\")\n",
    "type Point\n    x int\n    y int\nfunc Scale on p reference Point(factor float)\n    p.x = p.x * factor\n",
    "func h()\n    xs := [1,\n        2,\n        3]\n    out := xs\n        |> clean\n        |> render\n    print(out)\n",
    "func k()\n    x := load() onerr\n        print(\"failed: {error}\")\n    print(x)\n",
    "interface Shape\n    Area() float\n",
    "",
];

fn lex(source: &str) -> Vec<TokenKind> {
    let mut interner = Interner::new();
    let (tokens, _) = Lexer::new(source, &mut interner).tokenize();
    tokens.into_iter().map(|t| t.kind).collect()
}

#[test]
fn every_indent_is_closed_by_exactly_one_dedent() {
    for source in CORPUS {
        let kinds = lex(source);
        let mut depth: i64 = 0;
        for kind in &kinds {
            match kind {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => {
                    depth -= 1;
                    assert!(depth >= 0, "dedent below zero in {:?}", source);
                }
                _ => {}
            }
        }
        assert_eq!(depth, 0, "unbalanced layout in {:?}", source);
    }
}

#[test]
fn token_streams_end_with_eof() {
    for source in CORPUS {
        let kinds = lex(source);
        assert_eq!(kinds.last(), Some(&TokenKind::Eof), "{:?}", source);
        assert_eq!(
            kinds.iter().filter(|k| **k == TokenKind::Eof).count(),
            1,
            "{:?}",
            source
        );
    }
}

#[test]
fn token_spans_are_monotonic() {
    for source in CORPUS {
        let mut interner = Interner::new();
        let (tokens, _) = Lexer::new(source, &mut interner).tokenize();
        let mut last_start = 0;
        for token in &tokens {
            assert!(
                token.span.start >= last_start,
                "span went backwards at {:?} in {:?}",
                token.kind,
                source
            );
            last_start = token.span.start;
        }
    }
}

#[test]
fn lexing_is_deterministic() {
    for source in CORPUS {
        assert_eq!(lex(source), lex(source), "{:?}", source);
    }
}
