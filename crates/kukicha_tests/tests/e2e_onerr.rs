//! E2E: the onerr clause in its less common shapes.

use kukicha_tests::{compile_plain, go_for};

#[test]
fn e2e_onerr_block_handler_runs_statements() {
    let source = "\
func main()
    count := 0
    x := load() onerr
        count = count + 1
        print(\"attempt {count} failed: {error}\")
    print(x)
";
    let code = go_for(source);
    assert!(code.contains("x, err := load()"), "{}", code);
    assert!(code.contains("count = count + 1"), "{}", code);
    assert!(
        code.contains("fmt.Sprintf(\"attempt %v failed: %v\", count, err)"),
        "{}",
        code
    );
}

#[test]
fn e2e_onerr_clause_on_continuation_line() {
    let source = "\
func fetch(url string) (string, error)
    body := download(url)
        onerr return explain \"fetching {url}\"
    return body, empty
";
    let code = go_for(source);
    assert!(code.contains("body, err := download(url)"), "{}", code);
    assert!(
        code.contains("err = fmt.Errorf(\"fetching %v: %w\", url, err)"),
        "{}",
        code
    );
    assert!(code.contains("return \"\", err"), "{}", code);
}

#[test]
fn e2e_onerr_fallback_with_explain_still_wraps() {
    let source = "\
func main()
    n := parse(\"7\") onerr 0 explain \"bad input\"
    print(n)
";
    let code = go_for(source);
    assert!(code.contains("n, err := parse(\"7\")"), "{}", code);
    assert!(code.contains("err = fmt.Errorf(\"bad input: %w\", err)"), "{}", code);
    assert!(code.contains("n = 0"), "{}", code);
}

#[test]
fn e2e_onerr_pipe_chain_attachment() {
    let source = "\
func main()
    result := fetch(\"a\")
        |> transform
        onerr return
    print(result)
";
    let code = go_for(source);
    assert!(code.contains("result, err := transform(fetch(\"a\"))"), "{}", code);
    assert!(code.contains("if err != nil {"), "{}", code);
}

#[test]
fn e2e_onerr_discard_in_tests_is_silent() {
    let source = "func main()\n    x := load() onerr discard\n    print(x)\n";
    let out = kukicha_compile::compile_with_options(
        source,
        "load_test.kuki",
        kukicha_compile::CompileOptions { line_directives: false },
    );
    assert!(!out.has_errors(), "{:?}", out.diagnostics);
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
}

#[test]
fn e2e_onerr_err_hole_gets_a_nudge() {
    let source = "\
func main()
    x := load() onerr
        print(\"failed: {err}\")
    print(x)
";
    let out = compile_plain(source);
    assert!(!out.has_errors(), "{:?}", out.diagnostics);
    assert!(
        out.diagnostics
            .iter()
            .any(|d| d.message.contains("{err}")),
        "{:?}",
        out.diagnostics
    );
}
