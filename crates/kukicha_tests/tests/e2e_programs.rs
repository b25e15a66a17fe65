//! E2E: whole programs exercising several features at once.

use kukicha_tests::{compile_plain, go_for};

#[test]
fn e2e_shapes_program() {
    let source = "\
petiole shapes

interface Shape
    Area() float
    Name() string

type Circle
    radius float

func Area on c Circle() float
    return 3.14159 * c.radius * c.radius

func Name on c Circle() string
    return \"circle\"

func Describe(s Shape) string
    return \"{s.Name()} has area {s.Area()}\"
";
    let code = go_for(source);
    assert!(code.contains("package shapes"), "{}", code);
    assert!(code.contains("type Shape interface {"), "{}", code);
    assert!(code.contains("type Circle struct {"), "{}", code);
    assert!(code.contains("func (c Circle) Area() float64 {"), "{}", code);
    assert!(
        code.contains("fmt.Sprintf(\"%v has area %v\", s.Name(), s.Area())"),
        "{}",
        code
    );
}

#[test]
fn e2e_worker_pool_program() {
    let source = "\
func worker(jobs channel of int, results channel of int)
    for
        select
            receive job from jobs
                send job * 2 to results
            otherwise
                return

func main()
    jobs := make(channel of int, 8)
    results := make(channel of int, 8)
    go worker(jobs, results)
    for i from 0 to 8
        send i to jobs
    close(jobs)
";
    let code = go_for(source);
    assert!(code.contains("jobs := make(chan int, 8)"), "{}", code);
    assert!(code.contains("go worker(jobs, results)"), "{}", code);
    assert!(code.contains("case job := <-jobs:"), "{}", code);
    assert!(code.contains("results <- job * 2"), "{}", code);
    assert!(code.contains("for i := 0; i < 8; i++ {"), "{}", code);
    assert!(code.contains("close(jobs)"), "{}", code);
}

#[test]
fn e2e_config_loader_with_error_handling() {
    let source = "\
petiole config

import \"stdlib/files\"

type Config
    host string
    port int

func Load(path string) (Config, error)
    raw := files.ReadAll(path) onerr return explain \"loading config\"
    cfg := Config
        host: raw
        port: 8080
    return cfg, empty
";
    let code = go_for(source);
    assert!(code.contains("raw, err := files.ReadAll(path)"), "{}", code);
    assert!(
        code.contains("err = fmt.Errorf(\"loading config: %w\", err)"),
        "{}",
        code
    );
    assert!(code.contains("return Config{}, err"), "{}", code);
    assert!(code.contains("cfg := Config{host: raw, port: 8080}"), "{}", code);
    assert!(
        code.contains("github.com/kukicha/stdlib/files"),
        "{}",
        code
    );
}

#[test]
fn e2e_http_handler_lints_fire_together() {
    let source = "\
import \"net/http\"
import \"stdlib/files\"

func handle(w http.ResponseWriter, path string)
    page, err := files.ReadAll(path)
    print(page, err)
";
    let out = compile_plain(source);
    assert!(!out.has_errors(), "{:?}", out.diagnostics);
    assert!(
        out.diagnostics
            .iter()
            .any(|d| d.message.contains("path traversal")),
        "{:?}",
        out.diagnostics
    );
}

#[test]
fn e2e_type_switch_dispatch() {
    let source = "\
func describe(value any) string
    switch value as v
        when string
            return \"text: {v}\"
        when int
            return \"number\"
        otherwise
            return \"mystery\"
";
    let code = go_for(source);
    assert!(code.contains("switch v := value.(type) {"), "{}", code);
    assert!(code.contains("case string:"), "{}", code);
    assert!(code.contains("case int:"), "{}", code);
    assert!(code.contains("fmt.Sprintf(\"text: %v\", v)"), "{}", code);
}

#[test]
fn e2e_skill_program_compiles() {
    let source = "\
petiole greeter

skill Greeter
    description: \"Greets people by name\"
    version: \"1.2.0\"

func Greet(name string) string
    return \"hello, {name}!\"
";
    let out = compile_plain(source);
    assert!(!out.has_errors(), "{:?}", out.diagnostics);
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    let code = out.code.expect("code");
    assert!(code.contains("package greeter"), "{}", code);
    assert!(code.contains("func Greet(name string) string {"), "{}", code);
}

#[test]
fn e2e_defer_and_function_literal() {
    let source = "\
func main()
    defer cleanup()
    work := func() int
        return 41 + 1
    print(work())
";
    let code = go_for(source);
    assert!(code.contains("defer cleanup()"), "{}", code);
    assert!(code.contains("work := func() int {"), "{}", code);
    assert!(code.contains("return 41 + 1"), "{}", code);
    assert!(code.contains("fmt.Println(work())"), "{}", code);
}

#[test]
fn e2e_arrow_lambda_in_pipe_chain() {
    let source = "\
func main()
    xs := [1, 2, 3]
    total := xs |> reduce((acc int, x int) => acc + x)
    print(total)
";
    let code = go_for(source);
    assert!(code.contains("reduce(xs, func(acc int, x int)"), "{}", code);
}
