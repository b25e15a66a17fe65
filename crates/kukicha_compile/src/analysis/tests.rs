use kukicha_base::{Arena, Interner};
use kukicha_language::arena_ctx::AstContext;
use kukicha_language::{Lexer, Parser};

use super::{analyze, import_local_name, remap_import_path, Analysis};

fn run(source: &str) -> Analysis {
    run_as(source, "main.kuki")
}

fn run_as(source: &str, filename: &str) -> Analysis {
    let mut interner = Interner::new();
    let (tokens, lex_errors) = Lexer::new(source, &mut interner).tokenize();
    assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);
    let exprs = Arena::new();
    let stmts = Arena::new();
    let types = Arena::new();
    let ctx = AstContext::new(&exprs, &stmts, &types);
    let (program, parse_errors) = Parser::new(tokens, &mut interner, ctx).parse_program();
    assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);
    analyze(&program, &interner, filename)
}

fn error_messages(analysis: &Analysis) -> Vec<String> {
    analysis.errors.iter().map(|d| d.message.clone()).collect()
}

fn warning_messages(analysis: &Analysis) -> Vec<String> {
    analysis.warnings.iter().map(|d| d.message.clone()).collect()
}

#[test]
fn clean_program_has_no_diagnostics() {
    let analysis = run("func main()\n    x := 1\n    print(x)\n");
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
    assert!(analysis.warnings.is_empty(), "{:?}", analysis.warnings);
}

#[test]
fn undefined_identifier_is_reported_with_suggestion() {
    let analysis = run("func main()\n    total := 1\n    print(totol)\n");
    let messages = error_messages(&analysis);
    assert_eq!(messages.len(), 1, "{:?}", messages);
    assert!(messages[0].contains("undefined identifier 'totol'"));
    assert!(messages[0].contains("did you mean 'total'"));
}

#[test]
fn unknown_function_calls_are_tolerated() {
    // The callee may live in another file of the same package.
    let analysis = run("func main()\n    helper(1, 2)\n");
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}

#[test]
fn duplicate_top_level_names_are_rejected() {
    let analysis = run("func f()\n    return\nfunc f()\n    return\n");
    assert!(error_messages(&analysis)
        .iter()
        .any(|m| m.contains("duplicate name 'f'")));
}

#[test]
fn forward_references_between_functions_work() {
    let source = "func even(n int) bool\n    if n == 0\n        return true\n    return odd(n - 1)\nfunc odd(n int) bool\n    if n == 0\n        return false\n    return even(n - 1)\n";
    let analysis = run(source);
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}

#[test]
fn local_call_records_return_count() {
    let source = "func pair() (int, error)\n    return 1, empty\nfunc main()\n    a, b := pair()\n    print(a, b)\n";
    let analysis = run(source);
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
    assert!(analysis.expr_return_counts.values().any(|c| *c == 2));
}

#[test]
fn multi_name_arity_mismatch_is_an_error() {
    let source = "func one() int\n    return 1\nfunc main()\n    a, b := one()\n    print(a, b)\n";
    let analysis = run(source);
    assert!(error_messages(&analysis)
        .iter()
        .any(|m| m.contains("yields 1 value")));
}

#[test]
fn onerr_return_requires_error_return() {
    let source = "func f(x int) int\n    y := g(x) onerr return\n    return y\n";
    let analysis = run(source);
    let messages = error_messages(&analysis);
    assert_eq!(messages.len(), 1, "{:?}", messages);
    assert!(messages[0]
        .contains("`onerr return` requires the enclosing function to return an error"));
}

#[test]
fn onerr_return_accepted_with_error_return() {
    let source = "func f(x int) (int, error)\n    y := g(x) onerr return\n    return y, empty\n";
    let analysis = run(source);
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}

#[test]
fn onerr_return_accepted_in_void_function() {
    let source = "func main()\n    x := load(\"a\") onerr return\n    print(x)\n";
    let analysis = run(source);
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}

#[test]
fn onerr_overrides_unknown_callee_arity() {
    let source = "func main()\n    x := load(\"a\") onerr return\n    print(x)\n";
    let analysis = run(source);
    assert!(
        analysis.expr_return_counts.values().any(|c| *c == 2),
        "{:?}",
        analysis.expr_return_counts
    );
}

#[test]
fn onerr_on_non_error_function_is_an_error() {
    let source = "func one() int\n    return 1\nfunc main()\n    x := one() onerr 0\n    print(x)\n";
    let analysis = run(source);
    assert!(error_messages(&analysis)
        .iter()
        .any(|m| m.contains("`onerr` requires an error-returning expression")));
}

#[test]
fn discard_warns_outside_tests() {
    let source = "func main()\n    x := load() onerr discard\n    print(x)\n";
    let analysis = run(source);
    assert!(warning_messages(&analysis)
        .iter()
        .any(|m| m.contains("silently swallows")));
}

#[test]
fn discard_is_quiet_in_test_files() {
    let source = "func main()\n    x := load() onerr discard\n    print(x)\n";
    let analysis = run_as(source, "main_test.kuki");
    assert!(analysis.warnings.is_empty(), "{:?}", analysis.warnings);
}

#[test]
fn panic_handler_warns_outside_main_package() {
    let source = "petiole parser\nfunc f()\n    x := load() onerr panic \"boom\"\n    print(x)\n";
    let analysis = run(source);
    assert!(warning_messages(&analysis)
        .iter()
        .any(|m| m.contains("terminate the calling program")));
}

#[test]
fn panic_handler_quiet_in_main_package() {
    let source = "petiole main\nfunc f()\n    x := load() onerr panic \"boom\"\n    print(x)\n";
    let analysis = run(source);
    assert!(analysis.warnings.is_empty(), "{:?}", analysis.warnings);
}

#[test]
fn err_hole_inside_onerr_warns() {
    let source = "func main()\n    x := load() onerr\n        print(\"failed: {err}\")\n    print(x)\n";
    let analysis = run(source);
    assert!(warning_messages(&analysis)
        .iter()
        .any(|m| m.contains("{err}") && m.contains("'error'")));
}

#[test]
fn error_hole_inside_onerr_is_fine() {
    let source = "func main()\n    x := load() onerr\n        print(\"failed: {error}\")\n    print(x)\n";
    let analysis = run(source);
    assert!(analysis.warnings.is_empty(), "{:?}", analysis.warnings);
}

#[test]
fn empty_interpolation_hole_is_an_error() {
    let source = "func main()\n    print(\"value: {}\")\n";
    let analysis = run(source);
    assert!(error_messages(&analysis)
        .iter()
        .any(|m| m.contains("empty interpolation hole")));
}

#[test]
fn when_after_otherwise_is_rejected() {
    let source = "func main()\n    switch x\n        when 1\n            print(\"a\")\n        otherwise\n            print(\"b\")\n        when 2\n            print(\"c\")\n";
    let analysis = run(source);
    assert!(error_messages(&analysis)
        .iter()
        .any(|m| m.contains("unreachable")));
}

#[test]
fn break_outside_loop_is_an_error() {
    let analysis = run("func main()\n    break\n");
    assert!(error_messages(&analysis)
        .iter()
        .any(|m| m.contains("'break' outside")));
}

#[test]
fn break_inside_switch_is_legal() {
    let source = "func main()\n    x := 1\n    switch x\n        when 1\n            break\n        otherwise\n            print(\"b\")\n";
    let analysis = run(source);
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}

#[test]
fn registry_drives_external_counts() {
    let source = "import \"stdlib/files\"\nfunc main()\n    data, err := files.ReadAll(\"config.txt\")\n    print(data, err)\n";
    let analysis = run(source);
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
    assert!(analysis.expr_return_counts.values().any(|c| *c == 2));
}

#[test]
fn named_args_on_imported_function_are_rejected() {
    let source = "import \"stdlib/files\"\nfunc main()\n    files.Write(path: \"a\", data: \"b\")\n";
    let analysis = run(source);
    assert!(error_messages(&analysis)
        .iter()
        .any(|m| m.contains("positional arguments")));
}

#[test]
fn named_args_on_local_function_are_validated() {
    let source = "func resize(width int, height int)\n    print(width, height)\nfunc main()\n    resize(width: 1, height: 2)\n    resize(width: 1, depth: 2)\n";
    let analysis = run(source);
    let messages = error_messages(&analysis);
    assert_eq!(messages.len(), 1, "{:?}", messages);
    assert!(messages[0].contains("no parameter named 'depth'"));
}

#[test]
fn default_parameters_relax_arity() {
    let source = "func greet(name string, greeting string = \"hello\")\n    print(greeting, name)\nfunc main()\n    greet(\"ada\")\n    greet(\"ada\", \"hi\")\n    greet()\n";
    let analysis = run(source);
    let messages = error_messages(&analysis);
    assert_eq!(messages.len(), 1, "{:?}", messages);
    assert!(messages[0].contains("expects between 1 and 2"));
}

#[test]
fn pipe_counts_piped_argument() {
    let source = "func shout(s string) string\n    return s\nfunc main()\n    out := \"hi\" |> shout\n    print(out)\n";
    let analysis = run(source);
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}

#[test]
fn pipe_placeholder_does_not_double_count() {
    let source = "func wrap(a string, b string, c string) string\n    return b\nfunc main()\n    out := \"x\" |> wrap(\"l\", _, \"r\")\n    print(out)\n";
    let analysis = run(source);
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}

#[test]
fn type_mismatch_in_var_decl() {
    let analysis = run("func main()\n    var x string = 42\n");
    assert!(error_messages(&analysis)
        .iter()
        .any(|m| m.contains("type mismatch")));
}

#[test]
fn condition_must_be_bool() {
    let analysis = run("func main()\n    if 42\n        print(\"yes\")\n");
    assert!(error_messages(&analysis)
        .iter()
        .any(|m| m.contains("condition must be a bool")));
}

#[test]
fn for_range_types_element_from_list() {
    let source = "func main()\n    words := [\"a\", \"b\"]\n    for w in words\n        upper := w + \"!\"\n        print(upper)\n";
    let analysis = run(source);
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}

#[test]
fn duration_style_multiplication_keeps_named_type() {
    let source = "import \"time\"\nfunc wait(d time.Duration)\n    print(d)\nfunc main()\n    timeout := 30 * Second\n    print(timeout)\n";
    // `Second` is unresolved here, but the named-type product rule must not
    // produce a numeric mismatch on the way.
    let analysis = run(source);
    assert!(!error_messages(&analysis)
        .iter()
        .any(|m| m.contains("arithmetic requires numbers")));
}

#[test]
fn skill_requires_package_and_description() {
    let analysis = run("skill Greeter\n    version: \"1.0\"\n");
    assert!(error_messages(&analysis)
        .iter()
        .any(|m| m.contains("requires a package declaration")));
    assert!(warning_messages(&analysis)
        .iter()
        .any(|m| m.contains("missing a description")));
}

#[test]
fn skill_version_must_be_semver() {
    let source = "petiole greeter\nskill Greeter\n    description: \"says hi\"\n    version: \"one point two\"\n";
    let analysis = run(source);
    assert!(warning_messages(&analysis)
        .iter()
        .any(|m| m.contains("not MAJOR.MINOR")));
}

#[test]
fn skill_name_must_be_exported() {
    let source = "petiole greeter\nskill greeter\n    description: \"says hi\"\n";
    let analysis = run(source);
    assert!(error_messages(&analysis)
        .iter()
        .any(|m| m.contains("must be exported")));
}

#[test]
fn stdlib_shadow_warning() {
    let analysis = run("func strings()\n    return\n");
    assert!(warning_messages(&analysis)
        .iter()
        .any(|m| m.contains("shadows the Go standard library")));
}

#[test]
fn stdlib_shadow_allowed_in_stdlib_sources() {
    let analysis = run_as("func strings()\n    return\n", "stdlib/strings/strings.kuki");
    assert!(analysis.warnings.is_empty(), "{:?}", analysis.warnings);
}

#[test]
fn ssrf_lint_fires_inside_handler() {
    let source = "import \"net/http\"\nfunc handle(w http.ResponseWriter, url string)\n    body := http.Get(url)\n    print(body)\n";
    let analysis = run(source);
    assert!(warning_messages(&analysis)
        .iter()
        .any(|m| m.contains("request forgery")));
}

#[test]
fn ssrf_lint_quiet_outside_handler() {
    let source = "import \"net/http\"\nfunc fetch(url string)\n    body := http.Get(url)\n    print(body)\n";
    let analysis = run(source);
    assert!(!warning_messages(&analysis)
        .iter()
        .any(|m| m.contains("request forgery")));
}

#[test]
fn sql_injection_lint_on_interpolated_query() {
    let source = "func lookup(db Database, name string)\n    rows := db.Query(\"select * from users where name = {name}\")\n    print(rows)\ntype Database\n    dsn string\n";
    let analysis = run(source);
    assert!(warning_messages(&analysis)
        .iter()
        .any(|m| m.contains("SQL injection")));
}

#[test]
fn import_local_name_extraction() {
    assert_eq!(import_local_name("strings"), "strings");
    assert_eq!(import_local_name("net/http"), "http");
    assert_eq!(import_local_name("github.com/lib/pq/v2"), "pq");
    assert_eq!(import_local_name("gopkg.in/yaml.v3"), "yaml");
    assert_eq!(import_local_name("stdlib/iter"), "iterator");
    assert_eq!(import_local_name("stdlib/slice"), "slice");
}

#[test]
fn stdlib_paths_are_remapped() {
    assert_eq!(
        remap_import_path("stdlib/slice"),
        "github.com/kukicha/stdlib/slice"
    );
    assert_eq!(
        remap_import_path("stdlib/iter"),
        "github.com/kukicha/stdlib/iterator"
    );
    assert_eq!(remap_import_path("net/http"), "net/http");
}

#[test]
fn variadic_spread_requires_list() {
    let source = "func sum(nums many int) int\n    return 0\nfunc main()\n    xs := [1, 2, 3]\n    total := sum(many xs)\n    bad := sum(many \"nope\")\n    print(total, bad)\n";
    let analysis = run(source);
    let messages = error_messages(&analysis);
    assert_eq!(messages.len(), 1, "{:?}", messages);
    assert!(messages[0].contains("spread argument must be a list"));
}

#[test]
fn method_on_undefined_type_is_rejected() {
    let analysis = run("func Area on c Circle() float\n    return 1.0\n");
    assert!(error_messages(&analysis)
        .iter()
        .any(|m| m.contains("invalid receiver")));
}

#[test]
fn type_switch_binding_is_in_scope() {
    let source = "func describe(value any) string\n    switch value as v\n        when string\n            return v\n        otherwise\n            return \"other\"\n";
    let analysis = run(source);
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}
