//! E2E: the documented pipeline scenarios, source to Go.

use pretty_assertions::assert_eq;

use kukicha_tests::{errors_for, go_for};

#[test]
fn e2e_hello_world() {
    let code = go_for("func main()\n    print(\"Hello\")\n");
    assert!(code.contains("package main"));
    assert!(code.contains("\"fmt\""));
    assert!(code.contains("func main() {"));
    assert!(code.contains("fmt.Println(\"Hello\")"));
}

#[test]
fn e2e_onerr_two_value_split() {
    let source = "func load(p string) (string, error)\n    return p, empty\nfunc main()\n    x := load(\"a\") onerr return\n    print(x)\n";
    let code = go_for(source);
    assert!(code.contains("x, err := load(\"a\")"), "{}", code);
    assert!(code.contains("if err != nil {"), "{}", code);
}

#[test]
fn e2e_pipe_with_placeholder() {
    let source = "func encode(a int, b int, c int) int\n    return b\nfunc main()\n    opts := 1\n    data := 2\n    fmt := 3\n    out := data |> encode(opts, _, fmt)\n    print(out)\n";
    let code = go_for(source);
    assert!(code.contains("encode(opts, data, fmt)"), "{}", code);
}

#[test]
fn e2e_string_interpolation_adds_fmt() {
    let source = "func main()\n    name := \"ada\"\n    n := 2\n    msg := \"hi {name}, {n} left\"\n    print(msg)\n";
    let code = go_for(source);
    assert!(
        code.contains("msg := fmt.Sprintf(\"hi %v, %v left\", name, n)"),
        "{}",
        code
    );
    assert!(code.contains("\"fmt\""), "{}", code);
}

#[test]
fn e2e_generic_stdlib_filter() {
    let source = "petiole slice\nfunc Filter(xs list of any, pred func(any) bool) list of any\n    out := list of any\n    for x in xs\n        if pred(x)\n            out = append(out, x)\n    return out\n";
    let out = kukicha_compile::compile_with_options(
        source,
        "stdlib/slice/filter.kuki",
        kukicha_compile::CompileOptions { line_directives: false },
    );
    assert!(!out.has_errors(), "{:?}", out.diagnostics);
    let code = out.code.expect("code");
    assert!(
        code.contains("func Filter[T any](xs []T, pred func(T) bool) []T {"),
        "{}",
        code
    );
    assert!(!code.contains("list of any"), "{}", code);
}

#[test]
fn e2e_invalid_onerr_return_shorthand() {
    let source = "func f(x int) int\n    y := g(x) onerr return\n    return y\n";
    let messages = errors_for(source);
    assert_eq!(messages.len(), 1, "{:?}", messages);
    assert!(messages[0]
        .contains("`onerr return` requires the enclosing function to return an error"));
}

#[test]
fn e2e_compilation_is_deterministic() {
    let source = "petiole main\nimport \"stdlib/maps\"\nfunc main()\n    ages := map of string to int\n        \"ada\": 36\n        \"alan\": 41\n    keys := maps.Keys(ages)\n    msg := \"{keys}\"\n    print(msg)\n";
    let first = kukicha_compile::compile(source, "main.kuki");
    let second = kukicha_compile::compile(source, "main.kuki");
    assert_eq!(first.code, second.code);
    assert!(first.code.is_some());
}

#[test]
fn e2e_errors_suppress_code_generation() {
    let source = "func main()\n    print(undefined_thing)\n";
    let out = kukicha_tests::compile_plain(source);
    assert!(out.has_errors());
    assert!(out.code.is_none());
}

#[test]
fn e2e_warnings_do_not_block_generation() {
    let source = "petiole tools\nfunc run()\n    x := load() onerr panic \"boom\"\n    print(x)\n";
    let out = kukicha_tests::compile_plain(source);
    assert!(!out.has_errors(), "{:?}", out.diagnostics);
    assert!(!out.diagnostics.is_empty(), "expected the library-panic warning");
    assert!(out.code.is_some());
}

#[test]
fn e2e_descending_through_loop_includes_zero() {
    let source = "func main()\n    for i from 10 through 0\n        print(i)\n";
    let code = go_for(source);
    assert!(code.contains("for i := 10; i >= 0; i-- {"), "{}", code);
}

#[test]
fn e2e_empty_source_is_a_valid_program() {
    let out = kukicha_tests::compile_plain("");
    assert!(!out.has_errors());
    assert_eq!(out.code.as_deref(), Some("package main\n"));
}

#[test]
fn e2e_package_only_file_has_no_imports() {
    let out = kukicha_tests::compile_plain("petiole demo\n");
    assert!(!out.has_errors());
    let code = out.code.expect("code");
    assert_eq!(code, "package demo\n");
}

#[test]
fn e2e_onerr_registry_arity_drives_destructuring() {
    let source = "import \"stdlib/files\"\nfunc main()\n    data := files.ReadAll(\"notes.txt\") onerr return\n    print(data)\n";
    let code = go_for(source);
    // files.ReadAll is registered with two return values.
    assert!(code.contains("data, err := files.ReadAll(\"notes.txt\")"), "{}", code);
}

#[test]
fn e2e_line_directives_map_back_to_source() {
    let source = "func main()\n    x := 1\n    print(x)\n";
    let out = kukicha_compile::compile(source, "app.kuki");
    let code = out.code.expect("code");
    assert!(code.contains("// line app.kuki:2"), "{}", code);
    assert!(code.contains("// line app.kuki:3"), "{}", code);
}
