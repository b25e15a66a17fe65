//! E2E: diagnostic formatting, ordering and severity behavior.

use kukicha_tests::compile_plain;

#[test]
fn e2e_diagnostics_use_file_line_column_format() {
    let source = "func main()\n    print(missing)\n";
    let out = compile_plain(source);
    let rendered = out.render_diagnostics("main.kuki", source);
    assert_eq!(rendered.len(), 1, "{:?}", rendered);
    assert!(
        rendered[0].starts_with("main.kuki:2:11: "),
        "unexpected position prefix: {}",
        rendered[0]
    );
    assert!(rendered[0].contains("undefined identifier 'missing'"));
}

#[test]
fn e2e_warnings_carry_the_warning_prefix() {
    let source = "petiole tools\nfunc run()\n    x := load() onerr discard\n    print(x)\n";
    let out = compile_plain(source);
    let rendered = out.render_diagnostics("tools.kuki", source);
    assert!(
        rendered.iter().any(|r| r.contains(": warning: ")),
        "{:?}",
        rendered
    );
}

#[test]
fn e2e_diagnostics_are_in_source_order() {
    let source = "func main()\n    print(first_missing)\n    print(second_missing)\n    y := := 2\n";
    let out = compile_plain(source);
    let positions: Vec<usize> = out.diagnostics.iter().map(|d| d.span.start).collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted, "{:?}", out.diagnostics);
    assert!(out.diagnostics.len() >= 3);
}

#[test]
fn e2e_lexer_errors_flow_into_diagnostics() {
    let source = "func main()\n\tx := 1\n";
    let out = compile_plain(source);
    assert!(out.has_errors());
    assert!(out
        .diagnostics
        .iter()
        .any(|d| d.message.contains("tab")), "{:?}", out.diagnostics);
}

#[test]
fn e2e_parser_errors_flow_into_diagnostics() {
    let source = "func main()\n    x := := 1\n";
    let out = compile_plain(source);
    assert!(out.has_errors());
    assert!(out
        .diagnostics
        .iter()
        .any(|d| d.message.contains("expected an expression")), "{:?}", out.diagnostics);
}

#[test]
fn e2e_multiple_errors_are_all_reported() {
    // One bad statement must not hide the next one.
    let source = "func main()\n    a := := 1\n    b := := 2\n    c := 3\n    print(c)\n";
    let out = compile_plain(source);
    let parse_errors = out
        .diagnostics
        .iter()
        .filter(|d| d.message.contains("expected an expression"))
        .count();
    assert_eq!(parse_errors, 2, "{:?}", out.diagnostics);
}

#[test]
fn e2e_error_column_is_one_based() {
    let source = "petiole main\nfunc main()\n    print(nope)\n";
    let out = compile_plain(source);
    let rendered = out.render_diagnostics("m.kuki", source);
    assert!(rendered[0].starts_with("m.kuki:3:11:"), "{:?}", rendered);
}

#[test]
fn e2e_skill_diagnostics() {
    let source = "petiole greeter\nskill Greeter\n    version: \"not semver\"\n";
    let out = compile_plain(source);
    assert!(!out.has_errors(), "{:?}", out.diagnostics);
    let rendered = out.render_diagnostics("greeter.kuki", source);
    assert!(rendered.iter().any(|r| r.contains("warning") && r.contains("semver")
        || r.contains("MAJOR.MINOR")), "{:?}", rendered);
    assert!(
        rendered.iter().any(|r| r.contains("missing a description")),
        "{:?}",
        rendered
    );
}
