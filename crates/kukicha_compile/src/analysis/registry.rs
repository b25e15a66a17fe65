//! Stdlib function registry: qualified name → return-value count.
//!
//! The JSON table is produced by the registry generator tool, which scans
//! the kukicha stdlib sources and records each exported function's arity.
//! It is embedded at build time and deserialized once. A hand-written
//! overlay adds the Go stdlib functions that kukicha code reaches through
//! the stdlib internals, and a small method table covers calls on well
//! known receiver types (scanners, readers, builders).
//!
//! The analyzer consults this registry to decide how many values an
//! `onerr`-carrying call destructures into; entries missing from all three
//! layers default to 1.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Generated table, embedded from `stdlib_registry.json`.
static GENERATED: &str = include_str!("stdlib_registry.json");

/// Go stdlib functions whose arity the analyzer must know even though no
/// kukicha source declares them.
const OVERLAY: &[(&str, usize)] = &[
    ("bufio.NewReader", 1),
    ("bufio.NewScanner", 1),
    ("bufio.NewWriter", 1),
    ("errors.Is", 1),
    ("errors.New", 1),
    ("errors.Unwrap", 1),
    ("fmt.Errorf", 1),
    ("fmt.Fprintf", 2),
    ("fmt.Println", 2),
    ("fmt.Sprintf", 1),
    ("http.Get", 2),
    ("http.NewRequest", 2),
    ("http.Post", 2),
    ("os.Create", 2),
    ("os.Getwd", 2),
    ("os.Hostname", 2),
    ("os.Open", 2),
    ("os.ReadFile", 2),
    ("os.Remove", 1),
    ("os.WriteFile", 1),
    ("sort.Strings", 0),
    ("strconv.Atoi", 2),
    ("strconv.Itoa", 1),
    ("strconv.ParseFloat", 2),
    ("strconv.Quote", 1),
    ("strings.Contains", 1),
    ("strings.Fields", 1),
    ("strings.Join", 1),
    ("strings.Split", 1),
    ("strings.TrimSpace", 1),
    ("time.Now", 1),
    ("time.Parse", 2),
    ("time.Sleep", 0),
];

/// Return counts for method calls on known types, keyed by method name.
/// The receiver type is not tracked; these names are distinctive enough
/// in practice (a scanner's `Scan`, a reader's `ReadString`, …).
const METHODS: &[(&str, usize)] = &[
    ("Close", 1),
    ("Err", 1),
    ("Read", 2),
    ("ReadLine", 3),
    ("ReadRune", 3),
    ("ReadString", 2),
    ("Scan", 1),
    ("Text", 1),
    ("Write", 2),
    ("WriteString", 2),
];

fn table() -> &'static HashMap<String, usize> {
    static TABLE: OnceLock<HashMap<String, usize>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table: HashMap<String, usize> =
            serde_json::from_str(GENERATED).expect("embedded stdlib registry is valid JSON");
        for (name, count) in OVERLAY {
            table.insert((*name).to_string(), *count);
        }
        table
    })
}

/// Return count for a qualified function name (`pkg.Func`), if known.
pub fn return_count(qualified: &str) -> Option<usize> {
    table().get(qualified).copied()
}

/// Return count for a method call on a known receiver type, if known.
pub fn method_return_count(method: &str) -> Option<usize> {
    METHODS
        .iter()
        .find(|(name, _)| *name == method)
        .map(|(_, count)| *count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_entries_resolve() {
        assert_eq!(return_count("slice.Filter"), Some(1));
        assert_eq!(return_count("files.ReadAll"), Some(2));
        assert_eq!(return_count("maps.Get"), Some(2));
    }

    #[test]
    fn overlay_wins_over_absence() {
        assert_eq!(return_count("strconv.Atoi"), Some(2));
        assert_eq!(return_count("os.ReadFile"), Some(2));
        assert_eq!(return_count("time.Sleep"), Some(0));
    }

    #[test]
    fn unknown_functions_are_unknown() {
        assert_eq!(return_count("mystery.Fn"), None);
    }

    #[test]
    fn method_table_covers_scanner_protocol() {
        assert_eq!(method_return_count("Scan"), Some(1));
        assert_eq!(method_return_count("Text"), Some(1));
        assert_eq!(method_return_count("Err"), Some(1));
        assert_eq!(method_return_count("ReadString"), Some(2));
        assert_eq!(method_return_count("Frobnicate"), None);
    }
}
