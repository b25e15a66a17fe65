//! Security lints.
//!
//! Table-driven checks over call sites. The categories are fixed —
//! SSRF, path traversal, open redirect, SQL injection, XSS, command
//! injection — while the trigger name lists below are the tunable part.
//!
//! The handler-scoped lints (SSRF, path traversal, open redirect) fire
//! only inside an HTTP handler, identified by a parameter whose type is a
//! response writer. The data-flow lints (SQLi, XSS, command injection)
//! fire anywhere, keyed on non-literal or interpolated arguments.

use kukicha_language::ast::{Expr, TypeAnn};
use kukicha_base::Interner;

/// Network-fetch functions: calling these with request-derived input from
/// inside a handler is a server-side request forgery risk.
const FETCH_FUNCS: &[&str] = &[
    "http.Get",
    "http.Head",
    "http.Post",
    "http.PostForm",
    "httpclient.Get",
    "httpclient.GetJSON",
    "httpclient.Post",
];

/// Filesystem reads whose path argument must be literal inside a handler.
const FS_READ_FUNCS: &[&str] = &[
    "files.ReadAll",
    "files.ReadLines",
    "os.Open",
    "os.ReadFile",
];

/// Redirect functions whose URL argument must be literal inside a handler.
const REDIRECT_FUNCS: &[&str] = &["http.Redirect"];

/// SQL query entry points, matched by method name on any receiver.
const SQL_METHODS: &[&str] = &["Exec", "Query", "QueryRow"];

/// HTML rendering sinks whose content must be literal.
const HTML_FUNCS: &[&str] = &["template.HTML", "web.WriteHTML"];

/// Shell execution entry points.
const SHELL_FUNCS: &[&str] = &["exec.Command", "shell.Run"];

/// Type names that mark a parameter as an HTTP response writer, making the
/// enclosing function a handler.
const RESPONSE_WRITER_TYPES: &[&str] = &["ResponseWriter", "http.ResponseWriter"];

pub fn is_response_writer(ann: &TypeAnn<'_>, interner: &Interner) -> bool {
    match ann {
        TypeAnn::Named { package, name, .. } => {
            let name = interner.resolve(*name);
            let qualified;
            let full = match package {
                Some(pkg) => {
                    qualified = format!("{}.{}", interner.resolve(*pkg), name);
                    qualified.as_str()
                }
                None => name,
            };
            RESPONSE_WRITER_TYPES.contains(&full)
        }
        TypeAnn::Reference { inner, .. } => is_response_writer(inner, interner),
        _ => false,
    }
}

fn is_literal(expr: &Expr<'_>) -> bool {
    match expr {
        Expr::StringLit { parts, .. } => parts.is_none(),
        Expr::IntLit { .. } | Expr::FloatLit { .. } | Expr::BoolLit { .. } => true,
        _ => false,
    }
}

fn is_interpolated(expr: &Expr<'_>) -> bool {
    matches!(expr, Expr::StringLit { parts: Some(_), .. })
}

/// Lint a call with qualified name `callee` (for `pkg.Func` calls) and
/// bare method name `method`. Returns the warning message to emit, if any.
pub fn check_call(
    callee: Option<&str>,
    method: Option<&str>,
    args: &[&Expr<'_>],
    in_http_handler: bool,
) -> Option<String> {
    if in_http_handler {
        if let Some(name) = callee {
            if FETCH_FUNCS.contains(&name) {
                return Some(format!(
                    "call to '{}' inside an HTTP handler: fetching request-derived URLs risks server-side request forgery",
                    name
                ));
            }
            if FS_READ_FUNCS.contains(&name) && !args.first().is_some_and(|a| is_literal(a)) {
                return Some(format!(
                    "call to '{}' with a non-literal path inside an HTTP handler risks path traversal",
                    name
                ));
            }
            if REDIRECT_FUNCS.contains(&name)
                && !args.get(2).or_else(|| args.last()).is_some_and(|a| is_literal(a))
            {
                return Some(format!(
                    "call to '{}' with a non-literal URL inside an HTTP handler risks an open redirect",
                    name
                ));
            }
        }
    }

    if let Some(name) = method {
        if SQL_METHODS.contains(&name) && args.iter().any(|a| is_interpolated(a)) {
            return Some(format!(
                "'{}' called with an interpolated string: use query parameters to avoid SQL injection",
                name
            ));
        }
    }

    if let Some(name) = callee {
        if HTML_FUNCS.contains(&name) && !args.first().is_some_and(|a| is_literal(a)) {
            return Some(format!(
                "'{}' called with non-literal content risks cross-site scripting",
                name
            ));
        }
        if SHELL_FUNCS.contains(&name) && args.iter().any(|a| !is_literal(a)) {
            return Some(format!(
                "'{}' called with non-literal arguments risks command injection",
                name
            ));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use kukicha_base::Span;

    fn lit() -> Expr<'static> {
        Expr::StringLit {
            text: kukicha_base::Symbol::EMPTY,
            parts: None,
            span: Span::default(),
        }
    }

    fn ident() -> Expr<'static> {
        Expr::Identifier { name: kukicha_base::Symbol::EMPTY, span: Span::default() }
    }

    #[test]
    fn fetch_in_handler_warns() {
        let warning = check_call(Some("http.Get"), None, &[&ident()], true);
        assert!(warning.is_some_and(|w| w.contains("request forgery")));
    }

    #[test]
    fn fetch_outside_handler_is_quiet() {
        assert!(check_call(Some("http.Get"), None, &[&ident()], false).is_none());
    }

    #[test]
    fn literal_file_read_is_quiet() {
        let path = lit();
        assert!(check_call(Some("os.ReadFile"), None, &[&path], true).is_none());
    }

    #[test]
    fn non_literal_file_read_in_handler_warns() {
        let path = ident();
        let warning = check_call(Some("os.ReadFile"), None, &[&path], true);
        assert!(warning.is_some_and(|w| w.contains("path traversal")));
    }

    #[test]
    fn interpolated_query_warns_anywhere() {
        let query = Expr::StringLit {
            text: kukicha_base::Symbol::EMPTY,
            parts: Some(vec![]),
            span: Span::default(),
        };
        let warning = check_call(None, Some("Query"), &[&query], false);
        assert!(warning.is_some_and(|w| w.contains("SQL injection")));
    }

    #[test]
    fn shell_with_variable_args_warns() {
        let arg = ident();
        let warning = check_call(Some("exec.Command"), None, &[&arg], false);
        assert!(warning.is_some_and(|w| w.contains("command injection")));
    }
}
