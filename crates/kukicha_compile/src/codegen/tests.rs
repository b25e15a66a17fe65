use pretty_assertions::assert_eq;

use crate::compile::{compile, compile_with_options, CompileOptions};

fn codegen(source: &str) -> String {
    let out = compile_with_options(
        source,
        "main.kuki",
        CompileOptions { line_directives: false },
    );
    assert!(
        !out.has_errors(),
        "unexpected errors: {:?}",
        out.diagnostics
    );
    out.code.expect("code generated")
}

#[test]
fn hello_world() {
    let code = codegen("func main()\n    print(\"Hello\")\n");
    assert!(code.contains("package main"));
    assert!(code.contains("\"fmt\""));
    assert!(code.contains("func main() {"));
    assert!(code.contains("fmt.Println(\"Hello\")"));
}

#[test]
fn empty_source_emits_only_package_header() {
    let code = codegen("");
    assert_eq!(code, "package main\n");
}

#[test]
fn package_only_file_emits_header_without_imports() {
    let code = codegen("petiole tools\n");
    assert_eq!(code, "package tools\n");
}

#[test]
fn zero_arity_function_has_no_return_clause() {
    let code = codegen("func tick()\n    return\n");
    assert!(code.contains("func tick() {"));
}

#[test]
fn onerr_two_value_split() {
    let source = "func load(p string) (string, error)\n    return p, empty\nfunc main()\n    x := load(\"a\") onerr return\n    print(x)\n";
    let code = codegen(source);
    assert!(code.contains("x, err := load(\"a\")"), "{}", code);
    assert!(code.contains("if err != nil {"), "{}", code);
    assert!(code.contains("\t\treturn\n"), "{}", code);
}

#[test]
fn onerr_shorthand_propagates_error_with_zero_values() {
    let source = "func read(p string) (string, error)\n    data := fetch(p) onerr return\n    return data, empty\n";
    let code = codegen(source);
    assert!(code.contains("return \"\", err"), "{}", code);
}

#[test]
fn onerr_discard_binds_underscore_without_branch() {
    let source = "func main()\n    x := load() onerr discard\n    print(x)\n";
    let out = compile_with_options(
        source,
        "main_test.kuki",
        CompileOptions { line_directives: false },
    );
    let code = out.code.expect("code");
    assert!(code.contains("x, _ := load()"), "{}", code);
    assert!(!code.contains("if _ != nil"), "{}", code);
}

#[test]
fn onerr_fallback_assigns_value() {
    let source = "func main()\n    n := parse(\"4\") onerr 0\n    print(n)\n";
    let code = codegen(source);
    assert!(code.contains("n, err := parse(\"4\")"), "{}", code);
    assert!(code.contains("n = 0"), "{}", code);
}

#[test]
fn onerr_panic_handler() {
    let source = "func main()\n    cfg := load() onerr panic \"no config\"\n    print(cfg)\n";
    let code = codegen(source);
    assert!(code.contains("panic(\"no config\")"), "{}", code);
}

#[test]
fn onerr_explain_wraps_the_error() {
    let source = "func read(p string) (string, error)\n    data := fetch(p) onerr return explain \"reading config\"\n    return data, empty\n";
    let code = codegen(source);
    assert!(
        code.contains("err = fmt.Errorf(\"reading config: %w\", err)"),
        "{}",
        code
    );
}

#[test]
fn onerr_alias_renames_the_error_variable() {
    let source = "func main()\n    x := load() onerr as cause\n        print(\"failed: {error}\")\n    print(x)\n";
    let code = codegen(source);
    assert!(code.contains("x, cause := load()"), "{}", code);
    assert!(code.contains("if cause != nil {"), "{}", code);
    assert!(code.contains("fmt.Sprintf(\"failed: %v\", cause)"), "{}", code);
}

#[test]
fn onerr_error_handler_returns_new_error() {
    let source = "func read(p string) (string, error)\n    data := fetch(p) onerr error \"unreadable\"\n    return data, empty\n";
    let code = codegen(source);
    assert!(
        code.contains("return \"\", errors.New(\"unreadable\")"),
        "{}",
        code
    );
    assert!(code.contains("\"errors\""), "{}", code);
}

#[test]
fn onerr_on_assignment_scopes_the_error() {
    let source = "func main()\n    x := 1\n    x = parse(\"2\") onerr 0\n    print(x)\n";
    let code = codegen(source);
    assert!(code.contains("var err error"), "{}", code);
    assert!(code.contains("x, err = parse(\"2\")"), "{}", code);
}

#[test]
fn onerr_three_values_pad_with_underscores() {
    let source = "func triple() (int, string, error)\n    return 1, \"a\", empty\nfunc main()\n    n := triple() onerr return\n    print(n)\n";
    let code = codegen(source);
    assert!(code.contains("n, _, err := triple()"), "{}", code);
}

#[test]
fn expr_statement_onerr_uses_if_binding() {
    let source = "func save(p string) error\n    return empty\nfunc main()\n    save(\"x\") onerr panic \"save failed\"\n";
    let code = codegen(source);
    assert!(
        code.contains("if err := save(\"x\"); err != nil {"),
        "{}",
        code
    );
}

#[test]
fn pipe_lowers_to_first_argument() {
    let source = "func main()\n    data := \"x\"\n    out := data |> clean(1)\n    print(out)\n";
    let code = codegen(source);
    assert!(code.contains("clean(data, 1)"), "{}", code);
}

#[test]
fn pipe_placeholder_chooses_position() {
    let source = "func main()\n    opts := 1\n    data := 2\n    fmt := 3\n    out := data |> encode(opts, _, fmt)\n    print(out)\n";
    let code = codegen(source);
    assert!(code.contains("encode(opts, data, fmt)"), "{}", code);
}

#[test]
fn bare_pipe_target_becomes_call() {
    let source = "func main()\n    data := 1\n    data |> print\n";
    let code = codegen(source);
    assert!(code.contains("fmt.Println(data)"), "{}", code);
}

#[test]
fn chained_pipes_lower_left_to_right() {
    let source = "func main()\n    a := 1\n    out := a |> f |> g\n    print(out)\n";
    let code = codegen(source);
    assert!(code.contains("g(f(a))"), "{}", code);
}

#[test]
fn pipe_associativity_matches_parenthesized_form() {
    let chained = codegen("func main()\n    a := 1\n    out := a |> f |> g\n    print(out)\n");
    let grouped = codegen("func main()\n    a := 1\n    out := (a |> f) |> g\n    print(out)\n");
    assert_eq!(chained, grouped);
}

#[test]
fn pipe_placeholder_equals_bare_form_for_single_argument() {
    let bare = codegen("func main()\n    x := 1\n    out := x |> f\n    print(out)\n");
    let placeholder = codegen("func main()\n    x := 1\n    out := x |> f(_)\n    print(out)\n");
    assert_eq!(bare, placeholder);
}

#[test]
fn string_interpolation_lowers_to_sprintf() {
    let source = "func main()\n    name := \"ada\"\n    n := 2\n    msg := \"hi {name}, {n} left\"\n    print(msg)\n";
    let code = codegen(source);
    assert!(
        code.contains("msg := fmt.Sprintf(\"hi %v, %v left\", name, n)"),
        "{}",
        code
    );
    assert!(code.contains("\"fmt\""), "{}", code);
}

#[test]
fn interpolation_escapes_percent() {
    let source = "func main()\n    n := 1\n    msg := \"100% of {n}\"\n    print(msg)\n";
    let code = codegen(source);
    assert!(code.contains("\"100%% of %v\""), "{}", code);
}

#[test]
fn membership_lowers_to_slices_contains() {
    let source = "func main()\n    xs := [1, 2, 3]\n    ok := 2 in xs\n    print(ok)\n";
    let code = codegen(source);
    assert!(code.contains("slices.Contains(xs, 2)"), "{}", code);
    assert!(code.contains("\"slices\""), "{}", code);
}

#[test]
fn method_receiver_lowering() {
    let source = "type Point\n    x float\n    y float\nfunc Scale on p reference Point(factor float)\n    p.x = p.x * factor\n";
    let code = codegen(source);
    assert!(code.contains("func (p *Point) Scale(factor float64) {"), "{}", code);
}

#[test]
fn value_receiver_has_no_star() {
    let source = "type Point\n    x float\nfunc X on p Point() float\n    return p.x\n";
    let code = codegen(source);
    assert!(code.contains("func (p Point) X() float64 {"), "{}", code);
}

#[test]
fn numeric_for_ascending_literals() {
    let source = "func main()\n    for i from 0 to 10\n        print(i)\n";
    let code = codegen(source);
    assert!(code.contains("for i := 0; i < 10; i++ {"), "{}", code);
}

#[test]
fn numeric_for_descending_through_zero_is_inclusive() {
    let source = "func main()\n    for i from 10 through 0\n        print(i)\n";
    let code = codegen(source);
    assert!(code.contains("for i := 10; i >= 0; i-- {"), "{}", code);
}

#[test]
fn numeric_for_dynamic_bounds_handles_both_directions() {
    let source = "func span(a int, b int)\n    for i from a through b\n        print(i)\n";
    let code = codegen(source);
    assert!(code.contains("kukStep"), "{}", code);
    assert!(code.contains("(kukStep > 0 && i <= kukEnd) || (kukStep < 0 && i >= kukEnd)"), "{}", code);
}

#[test]
fn for_range_forms_lower_to_range() {
    let source = "func main()\n    xs := [1, 2]\n    for item in xs\n        print(item)\n    for i, item in xs\n        print(i, item)\n";
    let code = codegen(source);
    assert!(code.contains("for _, item := range xs {"), "{}", code);
    assert!(code.contains("for i, item := range xs {"), "{}", code);
}

#[test]
fn switch_lowering_with_default() {
    let source = "func main()\n    x := 1\n    switch x\n        when 1, 2\n            print(\"low\")\n        otherwise\n            print(\"high\")\n";
    let code = codegen(source);
    assert!(code.contains("switch x {"), "{}", code);
    assert!(code.contains("case 1, 2:"), "{}", code);
    assert!(code.contains("default:"), "{}", code);
}

#[test]
fn type_switch_lowering() {
    let source = "func describe(value any) string\n    switch value as v\n        when string\n            return \"text\"\n        otherwise\n            return \"other\"\n";
    let code = codegen(source);
    assert!(code.contains("switch v := value.(type) {"), "{}", code);
    assert!(code.contains("case string:"), "{}", code);
}

#[test]
fn go_and_select_lowering() {
    let source = "func main()\n    jobs := make(channel of int, 4)\n    go worker(jobs)\n    go\n        print(\"bg\")\n    select\n        receive j from jobs\n            print(j)\n        otherwise\n            print(\"idle\")\n";
    let code = codegen(source);
    assert!(code.contains("make(chan int, 4)"), "{}", code);
    assert!(code.contains("go worker(jobs)"), "{}", code);
    assert!(code.contains("go func() {"), "{}", code);
    assert!(code.contains("}()"), "{}", code);
    assert!(code.contains("select {"), "{}", code);
    assert!(code.contains("case j := <-jobs:"), "{}", code);
}

#[test]
fn send_and_receive_statements() {
    let source = "func main()\n    ch := make(channel of string)\n    send \"ping\" to ch\n    receive msg from ch\n    print(msg)\n";
    let code = codegen(source);
    assert!(code.contains("ch <- \"ping\""), "{}", code);
    assert!(code.contains("msg := <-ch"), "{}", code);
}

#[test]
fn reference_types_and_operations() {
    let source = "func main()\n    x := 1\n    p := reference of x\n    v := dereference p\n    print(v)\n";
    let code = codegen(source);
    assert!(code.contains("p := &x"), "{}", code);
    assert!(code.contains("v := *p"), "{}", code);
}

#[test]
fn struct_literal_and_collection_types() {
    let source = "type Point\n    x int\n    y int\nfunc main()\n    p := Point{x: 1, y: 2}\n    xs := list of int\n        1\n        2\n    m := map of string to int{\"one\": 1}\n    print(p, xs, m)\n";
    let code = codegen(source);
    assert!(code.contains("p := Point{x: 1, y: 2}"), "{}", code);
    assert!(code.contains("xs := []int{1, 2}"), "{}", code);
    assert!(code.contains("m := map[string]int{\"one\": 1}"), "{}", code);
}

#[test]
fn interface_declaration_lowering() {
    let source = "interface Shape\n    Area() float\n    Name() string\n";
    let code = codegen(source);
    assert!(code.contains("type Shape interface {"), "{}", code);
    assert!(code.contains("Area() float64"), "{}", code);
}

#[test]
fn named_arguments_reorder_to_positions() {
    let source = "func resize(width int, height int)\n    print(width, height)\nfunc main()\n    resize(height: 20, width: 10)\n";
    let code = codegen(source);
    assert!(code.contains("resize(10, 20)"), "{}", code);
}

#[test]
fn omitted_defaults_fill_at_call_site() {
    let source = "func greet(name string, greeting string = \"hello\")\n    print(greeting, name)\nfunc main()\n    greet(\"ada\")\n";
    let code = codegen(source);
    assert!(code.contains("greet(\"ada\", \"hello\")"), "{}", code);
}

#[test]
fn variadic_spread_call() {
    let source = "func sum(nums many int) int\n    total := 0\n    for n in nums\n        total = total + n\n    return total\nfunc main()\n    xs := [1, 2, 3]\n    print(sum(many xs))\n";
    let code = codegen(source);
    assert!(code.contains("func sum(nums ...int) int {"), "{}", code);
    assert!(code.contains("sum(xs...)"), "{}", code);
}

#[test]
fn generic_placeholder_in_stdlib_mode() {
    let source = "petiole slice\nfunc Filter(xs list of any, pred func(any) bool) list of any\n    out := list of any\n    for x in xs\n        if pred(x)\n            out = append(out, x)\n    return out\n";
    let out = compile_with_options(
        source,
        "stdlib/slice/slice.kuki",
        CompileOptions { line_directives: false },
    );
    let code = out.code.expect("code");
    assert!(
        code.contains("func Filter[T any](xs []T, pred func(T) bool) []T {"),
        "{}",
        code
    );
}

#[test]
fn generic_comparable_constraint() {
    let source = "petiole slice\nfunc Contains(xs list of any, needle any) bool\n    for x in xs\n        if x == needle\n            return true\n    return false\n";
    let out = compile_with_options(
        source,
        "stdlib/slice/slice.kuki",
        CompileOptions { line_directives: false },
    );
    let code = out.code.expect("code");
    assert!(
        code.contains("func Contains[T comparable](xs []T, needle T) bool {"),
        "{}",
        code
    );
}

#[test]
fn generic_empty_returns_typed_zero() {
    let source = "petiole slice\nfunc First(xs list of any) (any, error)\n    if len(xs) == 0\n        return empty, error \"empty list\"\n    return xs[0], empty\n";
    let out = compile_with_options(
        source,
        "stdlib/slice/slice.kuki",
        CompileOptions { line_directives: false },
    );
    let code = out.code.expect("code");
    assert!(code.contains("return *new(T), errors.New(\"empty list\")"), "{}", code);
}

#[test]
fn import_collision_gets_kuki_alias() {
    let source = "petiole main\nimport \"encoding/json\"\nfunc json(s string) string\n    return s\nfunc main()\n    data := json(\"x\")\n    print(data)\n";
    let code = codegen(source);
    assert!(code.contains("kukijson \"encoding/json\""), "{}", code);
}

#[test]
fn import_grouping_is_deterministic() {
    let source = "petiole main\nimport \"stdlib/slice\"\nimport \"github.com/acme/widget\"\nfunc main()\n    n := 1\n    msg := \"n = {n}\"\n    print(msg)\n";
    let code = codegen(source);
    let fmt_pos = code.find("\"fmt\"").expect("fmt import");
    let widget_pos = code.find("github.com/acme/widget").expect("widget import");
    let slice_pos = code.find("github.com/kukicha/stdlib/slice").expect("stdlib import");
    assert!(fmt_pos < widget_pos, "std before third-party:\n{}", code);
    assert!(widget_pos < slice_pos, "third-party before module-local:\n{}", code);
}

#[test]
fn compilation_is_deterministic() {
    let source = "petiole main\nimport \"stdlib/maps\"\nfunc main()\n    m := map of string to int{\"a\": 1}\n    msg := \"m = {m}\"\n    print(msg)\n";
    let first = compile(source, "main.kuki");
    let second = compile(source, "main.kuki");
    assert_eq!(first.code, second.code);
}

#[test]
fn line_directives_mark_statement_boundaries() {
    let source = "func main()\n    x := 1\n    print(x)\n";
    let out = compile(source, "demo.kuki");
    let code = out.code.expect("code");
    assert!(code.contains("// line demo.kuki:2"), "{}", code);
    assert!(code.contains("// line demo.kuki:3"), "{}", code);
}

#[test]
fn this_maps_to_receiver_name() {
    let source = "type Counter\n    n int\nfunc Bump on c reference Counter()\n    c.n = this.n + 1\n";
    let code = codegen(source);
    assert!(code.contains("c.n = c.n + 1"), "{}", code);
}

#[test]
fn cast_and_assertion_lowering() {
    let source = "func main()\n    x := 3.9\n    n := x as int\n    print(n)\n";
    let code = codegen(source);
    assert!(code.contains("n := int(x)"), "{}", code);
}

#[test]
fn global_var_and_alias_type() {
    let source = "type Celsius float\nvar boiling Celsius = 100 as Celsius\n";
    let code = codegen(source);
    assert!(code.contains("type Celsius float64"), "{}", code);
    assert!(code.contains("var boiling Celsius = Celsius(100)"), "{}", code);
}
