//! Integration tests for endpoint-lint

use endpoint_lint::{
    config::Config,
    diagnostics::Severity,
    engine::{LintEngine, LintError, LintReport, SourceFile},
    output::{format_json, format_lint, format_sarif},
    rules::UNUSED_CALL_OBJECT,
    syntax::SyntaxTree,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};

const CLIENT_PATH: &str = "src/com/example/TestClient.java";

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Library sources, keyed by their project-relative path
fn library() -> Vec<SourceFile> {
    [
        "src/retrofit2/Call.java",
        "src/retrofit2/http/GET.java",
        "src/com/example/ApiInterface.java",
    ]
    .iter()
    .map(|rel| {
        let text = fs::read_to_string(fixtures_path().join(rel)).unwrap();
        SourceFile::new(*rel, text)
    })
    .collect()
}

fn client(name: &str) -> SourceFile {
    let text = fs::read_to_string(fixtures_path().join("clients").join(name)).unwrap();
    SourceFile::new(CLIENT_PATH, text)
}

/// Lint the library plus one client, the way a whole project is linted
fn lint_project(engine: &LintEngine, client_file: &str) -> LintReport {
    let mut sources = library();
    sources.push(client(client_file));
    engine.lint_sources(sources, Vec::new())
}

fn lint_output(client_file: &str) -> String {
    let engine = LintEngine::new(Config::default());
    let report = lint_project(&engine, client_file);
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    format_lint(&report.diagnostics)
}

#[test]
fn test_parse_fixtures() {
    for rel in [
        "src/retrofit2/Call.java",
        "src/retrofit2/http/GET.java",
        "src/com/example/ApiInterface.java",
        "clients/Mixed.java",
    ] {
        let result = SyntaxTree::parse_file(&fixtures_path().join(rel));
        assert!(result.is_ok(), "{}: {:?}", rel, result.err());
    }
}

#[test]
fn test_unused_call() {
    let expected = "src/com/example/TestClient.java:5: Error: Call object was created but never used. [UnusedCallObject]\n\
                    \x20       apiInterface.foo();\n\
                    \x20       ~~~~~~~~~~~~~~~~~~\n\
                    1 errors, 0 warnings\n";
    assert_eq!(lint_output("UnusedCall.java"), expected);
}

#[test]
fn test_execute() {
    assert_eq!(lint_output("Execute.java"), "No warnings.");
}

#[test]
fn test_assign_to_variable() {
    assert_eq!(lint_output("AssignToVariable.java"), "No warnings.");
}

#[test]
fn test_return() {
    assert_eq!(lint_output("Return.java"), "No warnings.");
}

#[test]
fn test_pass_parameter() {
    assert_eq!(lint_output("PassParameter.java"), "No warnings.");
}

#[test]
fn test_unmarked_method() {
    assert_eq!(lint_output("Unmarked.java"), "No warnings.");
}

#[test]
fn test_mixed_usages() {
    let engine = LintEngine::new(Config::default());
    let report = lint_project(&engine, "Mixed.java");

    let lines: Vec<usize> = report.diagnostics.iter().map(|d| d.location.line).collect();
    assert_eq!(lines, vec![9, 15, 17]);
    assert!(report
        .diagnostics
        .iter()
        .all(|d| d.rule_id == UNUSED_CALL_OBJECT && d.location.file == Path::new(CLIENT_PATH)));
    assert_eq!(report.statistics.error_count(), 3);
    assert_eq!(report.statistics.files_linted, 4);
    assert_eq!(report.statistics.files_with_errors, 1);
}

#[test]
fn test_declarations_from_context_only() {
    let engine = LintEngine::new(Config::default());
    let report = engine.lint_sources(vec![client("UnusedCall.java")], library());

    assert_eq!(report.statistics.files_linted, 1);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].location.column, 9);
    assert_eq!(report.diagnostics[0].location.length, 18);
}

#[test]
fn test_without_declarations_nothing_resolves() {
    let engine = LintEngine::new(Config::default());
    let report = engine.lint_sources(vec![client("UnusedCall.java")], Vec::new());
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_parse_failure_is_reported() {
    let engine = LintEngine::new(Config::default());
    let mut sources = library();
    sources.push(client("Broken.java"));
    sources.push(SourceFile::new(
        "src/com/example/Other.java",
        fs::read_to_string(fixtures_path().join("clients/UnusedCall.java"))
            .unwrap()
            .replace("TestClient", "Other"),
    ));
    let report = engine.lint_sources(sources, Vec::new());

    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0], LintError::Parse { .. }));
    assert_eq!(report.failures[0].path(), Path::new(CLIENT_PATH));
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(
        report.diagnostics[0].location.file,
        PathBuf::from("src/com/example/Other.java")
    );
}

#[test]
fn test_deeply_nested_file_fails_alone() {
    let engine = LintEngine::new(Config::default());
    let deep = format!(
        "package com.example;\nclass Deep {{\n Object m(ApiInterface api) {{\n return {}api.foo(){};\n }}\n}}\n",
        "(".repeat(5000),
        ")".repeat(5000)
    );
    let mut sources = library();
    sources.push(SourceFile::new("src/com/example/Deep.java", deep));
    sources.push(client("UnusedCall.java"));
    let report = engine.lint_sources(sources, Vec::new());

    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0], LintError::Parse { .. }));
    assert_eq!(report.failures[0].path(), Path::new("src/com/example/Deep.java"));
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].location.file, PathBuf::from(CLIENT_PATH));
}

#[test]
fn test_lint_paths_from_disk() {
    let root = fixtures_path();
    let engine = LintEngine::new(Config::default());
    let context: Vec<PathBuf> = [
        "src/retrofit2/Call.java",
        "src/retrofit2/http/GET.java",
        "src/com/example/ApiInterface.java",
    ]
    .iter()
    .map(|rel| root.join(rel))
    .collect();

    let report = engine.lint_paths(
        &[
            root.join("clients/UnusedCall.java"),
            root.join("clients/Execute.java"),
        ],
        &context,
    );

    assert!(report.failures.is_empty());
    assert_eq!(report.diagnostics.len(), 1);
    assert!(report.diagnostics[0]
        .location
        .file
        .ends_with("clients/UnusedCall.java"));
}

#[test]
fn test_config_file_severity_override() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join(".endpointlintrc.json");
    fs::write(&config_path, r#"{ "severity": { "UnusedCallObject": "warning" } }"#).unwrap();

    let config = Config::from_file(&config_path).unwrap();
    let engine = LintEngine::new(config);
    let report = lint_project(&engine, "UnusedCall.java");

    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].severity, Severity::Warning);
    assert!(!report.has_errors());
    assert!(format_lint(&report.diagnostics).ends_with("0 errors, 1 warnings\n"));
}

#[test]
fn test_config_file_custom_markers() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("endpointlint.yaml");
    fs::write(&config_path, "markers:\n  - com.acme.Endpoint\n").unwrap();

    let engine = LintEngine::new(Config::from_file(&config_path).unwrap());
    let report = lint_project(&engine, "UnusedCall.java");
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_config_file_per_file_ignore() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join(".endpointlintrc.json");
    fs::write(
        &config_path,
        r#"{ "perFileIgnores": { "src/com/example/*.java": ["UnusedCallObject"] } }"#,
    )
    .unwrap();

    let engine = LintEngine::new(Config::from_file(&config_path).unwrap());
    assert!(lint_project(&engine, "UnusedCall.java").diagnostics.is_empty());
}

#[test]
fn test_json_output() {
    let engine = LintEngine::new(Config::default());
    let report = lint_project(&engine, "UnusedCall.java");
    let parsed: serde_json::Value = serde_json::from_str(&format_json(&report.diagnostics)).unwrap();

    assert_eq!(parsed["summary"]["errors"], 1);
    assert_eq!(parsed["diagnostics"][0]["rule_id"], "UnusedCallObject");
    assert_eq!(parsed["diagnostics"][0]["file"], CLIENT_PATH);
    assert_eq!(parsed["diagnostics"][0]["line"], 5);
}

#[test]
fn test_sarif_output() {
    let engine = LintEngine::new(Config::default());
    let report = lint_project(&engine, "UnusedCall.java");
    let parsed: serde_json::Value =
        serde_json::from_str(&format_sarif(&report.diagnostics)).unwrap();

    let result = &parsed["runs"][0]["results"][0];
    assert_eq!(result["ruleId"], "UnusedCallObject");
    assert_eq!(result["message"]["text"], "Call object was created but never used.");
    assert_eq!(
        result["locations"][0]["physicalLocation"]["artifactLocation"]["uri"],
        CLIENT_PATH
    );
}
