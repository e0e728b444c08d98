use std::path::PathBuf;

use pretty_assertions::assert_eq;
use valflow::semantic::{Analysis, Payload};
use valflow::source::load_program;

fn analyze_fixture(name: &str) -> Analysis {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures", name]
        .iter()
        .collect();
    let program = load_program(&path).unwrap();
    valflow::analyze(&program).unwrap()
}

fn parameter_types(analysis: &Analysis, function: &str, line: usize) -> Vec<(String, String)> {
    analysis
        .specialization(function, line)
        .unwrap()
        .parameters()
        .iter()
        .map(|(name, value)| (name.clone(), value.to_string()))
        .collect()
}

#[test]
fn test_global_variables() {
    let analysis = analyze_fixture("sample.php");
    let global = analysis.global();

    let names: Vec<&str> = global.variables().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["_GET", "a", "pi"]);

    let a: Vec<(usize, String)> = global
        .history("a")
        .unwrap()
        .iter()
        .map(|(line, value)| (*line, value.to_string()))
        .collect();
    assert_eq!(
        a,
        vec![
            (15, "23 (int)".to_string()),
            (19, "\"foobar\" (string)".to_string()),
            (23, "4 (int)".to_string()),
        ]
    );

    let pi = global.latest("pi").unwrap();
    assert!(matches!(pi.value(), Some(Payload::Float(_))));
    assert_eq!(pi.to_string(), "3.14 (float)");

    // Loop counters live inside a `for` header and are never recorded
    assert!(global.history("i").is_none());
}

#[test]
fn test_declared_functions() {
    let analysis = analyze_fixture("sample.php");

    let functions: Vec<&str> = analysis
        .global()
        .nested()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(functions, vec!["bar", "foo", "array_key_exists", "quatz", "abc"]);

    let bar = analysis.function("bar").unwrap();
    assert_eq!(bar.lookup_parameter("arg").unwrap().ty().to_string(), "int");
    assert!(bar.specialized().is_empty());

    let foo = analysis.function("foo").unwrap();
    let value = foo.lookup_parameter("value").unwrap();
    assert!(!value.is_resolved());
    assert_eq!(value.line(), 8);
}

#[test]
fn test_call_site_specializations() {
    let analysis = analyze_fixture("sample.php");

    let foo = analysis.function("foo").unwrap();
    let lines: Vec<usize> = foo.specialized().keys().copied().collect();
    assert_eq!(lines, vec![13, 15]);

    assert_eq!(
        parameter_types(&analysis, "foo", 13),
        vec![("value".to_string(), "42 (int)".to_string())]
    );
    assert_eq!(
        parameter_types(&analysis, "foo", 15),
        vec![("value".to_string(), "23 (int)".to_string())]
    );

    assert_eq!(
        parameter_types(&analysis, "array_key_exists", 19),
        vec![
            ("#0".to_string(), "\"foobar\" (string)".to_string()),
            ("#1".to_string(), "[1, 2, 3] (int[])".to_string()),
        ]
    );

    assert_eq!(
        parameter_types(&analysis, "quatz", 27),
        vec![
            ("is".to_string(), "1 (int)".to_string()),
            ("#1".to_string(), "2 (int)".to_string()),
            ("#2".to_string(), "3 (int)".to_string()),
            ("#3".to_string(), "4 (int)".to_string()),
        ]
    );

    assert_eq!(
        parameter_types(&analysis, "abc", 23),
        vec![("b".to_string(), "4 (int)".to_string())]
    );

    assert!(analysis.diagnostics.is_empty());
}

#[test]
fn test_report_mentions_every_scope() {
    let analysis = analyze_fixture("sample.php");
    let report = valflow::report::render(&analysis);

    for name in ["global", "bar", "foo", "array_key_exists", "quatz", "abc"] {
        assert!(
            report.contains(&format!("scope {}", name)),
            "missing scope {} in report:\n{}",
            name,
            report
        );
    }
    assert!(!report.contains("diagnostics:"));
}
