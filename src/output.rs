//! Output formatters for lint results

use crate::diagnostics::{Diagnostic, Severity};
use crate::rules::{all_rules, Rule};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::{self, Write};

const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";

fn underline_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[1;31m",
        Severity::Warning => "\x1b[1;33m",
        Severity::Info => "\x1b[1;36m",
    }
}

/// Format diagnostics in rustc-like text form
pub fn format_text(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();

    for diag in diagnostics {
        // Header: severity[rule-id]: message
        let _ = writeln!(out, "{}[{}]: {}", diag.severity.colored(), diag.rule_id, diag.message);

        // Location: --> file:line:column
        let _ = writeln!(
            out,
            "  \x1b[1;34m-->\x1b[0m {}:{}:{}",
            diag.location.file.display(),
            diag.location.line,
            diag.location.column
        );

        if let Some(ref source) = diag.source_line {
            let line_num = diag.location.line.to_string();
            let padding = " ".repeat(line_num.len());

            let _ = writeln!(out, "   \x1b[1;34m{}\x1b[0m |", padding);
            let _ = writeln!(out, " \x1b[1;34m{}\x1b[0m | {}", line_num, source);

            let underline_padding = " ".repeat(diag.location.column.saturating_sub(1));
            let underline = "^".repeat(diag.location.length.max(1));
            let _ = writeln!(
                out,
                "   \x1b[1;34m{}\x1b[0m | {}{}{}\x1b[0m",
                padding,
                underline_padding,
                underline_color(diag.severity),
                underline
            );
        }

        if let Some(ref help) = diag.help {
            let _ = writeln!(out, "   \x1b[1;34m=\x1b[0m \x1b[1mhelp\x1b[0m: {}", help);
        }

        let _ = writeln!(out);
    }

    out
}

/// Print diagnostics in human-readable text format
pub fn print_text(diagnostics: &[Diagnostic]) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = handle.write_all(format_text(diagnostics).as_bytes());
}

/// Format diagnostics the way Android lint reports them:
///
/// ```text
/// src/com/example/TestClient.java:5: Error: Call object was created but never used. [UnusedCallObject]
///         apiInterface.foo();
///         ~~~~~~~~~~~~~~~~~~
/// 1 errors, 0 warnings
/// ```
///
/// An empty run yields `No warnings.`
pub fn format_lint(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return "No warnings.".to_string();
    }

    let mut out = String::new();
    for diag in diagnostics {
        let _ = writeln!(
            out,
            "{}:{}: {}: {} [{}]",
            diag.location.file.display(),
            diag.location.line,
            diag.severity.label(),
            diag.message,
            diag.rule_id
        );
        if let Some(ref source) = diag.source_line {
            let _ = writeln!(out, "{}", source);
            let _ = writeln!(
                out,
                "{}{}",
                " ".repeat(diag.location.column.saturating_sub(1)),
                "~".repeat(diag.location.length.max(1))
            );
        }
    }

    let errors = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
    let warnings = diagnostics.iter().filter(|d| d.severity == Severity::Warning).count();
    let _ = writeln!(out, "{} errors, {} warnings", errors, warnings);
    out
}

/// Print diagnostics in Android lint format
pub fn print_lint(diagnostics: &[Diagnostic]) {
    let report = format_lint(diagnostics);
    if report.ends_with('\n') {
        print!("{}", report);
    } else {
        println!("{}", report);
    }
}

/// JSON output format
#[derive(Serialize)]
struct JsonOutput<'a> {
    diagnostics: Vec<JsonDiagnostic<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    rule_id: &'a str,
    severity: &'a str,
    message: &'a str,
    file: String,
    line: usize,
    column: usize,
    length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonSummary {
    total: usize,
    errors: usize,
    warnings: usize,
    info: usize,
}

fn json_output(diagnostics: &[Diagnostic]) -> JsonOutput<'_> {
    let count = |severity: Severity| diagnostics.iter().filter(|d| d.severity == severity).count();

    JsonOutput {
        diagnostics: diagnostics
            .iter()
            .map(|d| JsonDiagnostic {
                rule_id: &d.rule_id,
                severity: d.severity.as_str(),
                message: &d.message,
                file: d.location.file.display().to_string(),
                line: d.location.line,
                column: d.location.column,
                length: d.location.length,
                help: d.help.as_deref(),
            })
            .collect(),
        summary: JsonSummary {
            total: diagnostics.len(),
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
            info: count(Severity::Info),
        },
    }
}

/// Print diagnostics in JSON format
pub fn print_json(diagnostics: &[Diagnostic]) -> io::Result<()> {
    let stdout = io::stdout();
    let handle = stdout.lock();
    serde_json::to_writer_pretty(handle, &json_output(diagnostics))?;
    println!();
    Ok(())
}

/// Format diagnostics as JSON string
pub fn format_json(diagnostics: &[Diagnostic]) -> String {
    serde_json::to_string_pretty(&json_output(diagnostics)).unwrap_or_default()
}

/// SARIF (Static Analysis Results Interchange Format) output
#[derive(Serialize)]
struct SarifOutput<'a> {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun<'a>>,
}

#[derive(Serialize)]
struct SarifRun<'a> {
    tool: SarifTool,
    results: Vec<SarifResult<'a>>,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifDriver {
    name: &'static str,
    version: &'static str,
    information_uri: &'static str,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRule {
    id: &'static str,
    name: &'static str,
    short_description: SarifText,
    full_description: SarifText,
    help: SarifText,
    default_configuration: SarifConfiguration,
    properties: SarifRuleProperties,
}

#[derive(Serialize)]
struct SarifText {
    text: &'static str,
}

#[derive(Serialize)]
struct SarifConfiguration {
    level: &'static str,
}

#[derive(Serialize)]
struct SarifRuleProperties {
    category: &'static str,
    priority: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult<'a> {
    rule_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule_index: Option<usize>,
    level: &'static str,
    message: SarifMessage<'a>,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize)]
struct SarifMessage<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifPhysicalLocation {
    artifact_location: SarifArtifactLocation,
    region: SarifRegion,
}

#[derive(Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRegion {
    start_line: usize,
    start_column: usize,
    end_column: usize,
}

fn sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "note",
    }
}

fn sarif_rule(rule: &'static Rule) -> SarifRule {
    SarifRule {
        id: rule.id,
        name: rule.name,
        short_description: SarifText {
            text: rule.description,
        },
        full_description: SarifText {
            text: rule.explanation,
        },
        help: SarifText { text: rule.help },
        default_configuration: SarifConfiguration {
            level: sarif_level(rule.severity),
        },
        properties: SarifRuleProperties {
            category: rule.category,
            priority: rule.priority,
        },
    }
}

fn sarif_output(diagnostics: &[Diagnostic]) -> SarifOutput<'_> {
    let rules = all_rules();
    let results = diagnostics
        .iter()
        .map(|d| SarifResult {
            rule_id: &d.rule_id,
            rule_index: rules.iter().position(|r| r.id == d.rule_id),
            level: sarif_level(d.severity),
            message: SarifMessage { text: &d.message },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifactLocation {
                        // SARIF URIs use forward slashes
                        uri: d.location.file.to_string_lossy().replace('\\', "/"),
                    },
                    region: SarifRegion {
                        start_line: d.location.line,
                        start_column: d.location.column,
                        end_column: d.location.column + d.location.length,
                    },
                },
            }],
        })
        .collect();

    SarifOutput {
        schema: SARIF_SCHEMA,
        version: "2.1.0",
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "endpoint-lint",
                    version: env!("CARGO_PKG_VERSION"),
                    information_uri: "https://square.github.io/retrofit/",
                    rules: rules.iter().map(sarif_rule).collect(),
                },
            },
            results,
        }],
    }
}

/// Print diagnostics in SARIF format (for CI/CD integration)
pub fn print_sarif(diagnostics: &[Diagnostic]) -> io::Result<()> {
    let stdout = io::stdout();
    let handle = stdout.lock();
    serde_json::to_writer_pretty(handle, &sarif_output(diagnostics))?;
    println!();
    Ok(())
}

/// Format diagnostics as SARIF string
pub fn format_sarif(diagnostics: &[Diagnostic]) -> String {
    serde_json::to_string_pretty(&sarif_output(diagnostics)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Location;
    use crate::rules::UNUSED_CALL_OBJECT;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn make_test_diagnostic(severity: Severity, rule_id: &str) -> Diagnostic {
        Diagnostic {
            rule_id: rule_id.to_string(),
            severity,
            message: "Call object was created but never used.".to_string(),
            location: Location {
                file: PathBuf::from("src/com/example/TestClient.java"),
                line: 5,
                column: 9,
                length: 18,
            },
            source_line: Some("        apiInterface.foo();".to_string()),
            help: Some("Test help text".to_string()),
        }
    }

    #[test]
    fn test_format_lint_single_error() {
        let output = format_lint(&[make_test_diagnostic(Severity::Error, UNUSED_CALL_OBJECT)]);
        let expected = "src/com/example/TestClient.java:5: Error: Call object was created but never used. [UnusedCallObject]\n\
                        \x20       apiInterface.foo();\n\
                        \x20       ~~~~~~~~~~~~~~~~~~\n\
                        1 errors, 0 warnings\n";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_format_lint_empty() {
        assert_eq!(format_lint(&[]), "No warnings.");
    }

    #[test]
    fn test_format_lint_counts_warnings() {
        let output = format_lint(&[
            make_test_diagnostic(Severity::Error, "a"),
            make_test_diagnostic(Severity::Warning, "b"),
            make_test_diagnostic(Severity::Warning, "c"),
        ]);
        assert!(output.ends_with("1 errors, 2 warnings\n"));
        assert!(output.contains(": Warning: "));
    }

    #[test]
    fn test_format_lint_without_source_line() {
        let mut diag = make_test_diagnostic(Severity::Error, UNUSED_CALL_OBJECT);
        diag.source_line = None;
        let output = format_lint(&[diag]);
        assert_eq!(output.lines().count(), 2);
        assert!(!output.contains('~'));
    }

    #[test]
    fn test_format_text() {
        let output = format_text(&[make_test_diagnostic(Severity::Error, UNUSED_CALL_OBJECT)]);
        assert!(output.contains("[UnusedCallObject]: Call object was created but never used."));
        assert!(output.contains("src/com/example/TestClient.java:5:9"));
        assert!(output.contains(&format!("{}{}", " ".repeat(8), "\x1b[1;31m^^^^^^^^^^^^^^^^^^")));
        assert!(output.contains("help\x1b[0m: Test help text"));
    }

    #[test]
    fn test_format_text_empty() {
        assert!(format_text(&[]).is_empty());
    }

    #[test]
    fn test_format_json_empty() {
        let output = format_json(&[]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["diagnostics"].as_array().unwrap().len(), 0);
        assert_eq!(parsed["summary"]["total"], 0);
        assert_eq!(parsed["summary"]["errors"], 0);
        assert_eq!(parsed["summary"]["warnings"], 0);
        assert_eq!(parsed["summary"]["info"], 0);
    }

    #[test]
    fn test_format_json_single_diagnostic() {
        let diag = make_test_diagnostic(Severity::Error, UNUSED_CALL_OBJECT);
        let output = format_json(&[diag]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["diagnostics"].as_array().unwrap().len(), 1);
        assert_eq!(parsed["diagnostics"][0]["rule_id"], "UnusedCallObject");
        assert_eq!(parsed["diagnostics"][0]["severity"], "error");
        assert_eq!(parsed["diagnostics"][0]["line"], 5);
        assert_eq!(parsed["diagnostics"][0]["column"], 9);
        assert_eq!(parsed["diagnostics"][0]["length"], 18);
        assert_eq!(parsed["summary"]["total"], 1);
        assert_eq!(parsed["summary"]["errors"], 1);
    }

    #[test]
    fn test_json_summary_counts() {
        let diagnostics = vec![
            make_test_diagnostic(Severity::Error, "e1"),
            make_test_diagnostic(Severity::Error, "e2"),
            make_test_diagnostic(Severity::Warning, "w1"),
            make_test_diagnostic(Severity::Info, "i1"),
        ];
        let output = format_json(&diagnostics);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["summary"]["total"], 4);
        assert_eq!(parsed["summary"]["errors"], 2);
        assert_eq!(parsed["summary"]["warnings"], 1);
        assert_eq!(parsed["summary"]["info"], 1);
    }

    #[test]
    fn test_format_json_without_help() {
        let mut diag = make_test_diagnostic(Severity::Error, "no-help-rule");
        diag.help = None;

        let output = format_json(&[diag]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert!(parsed["diagnostics"][0]["help"].is_null());
    }

    #[test]
    fn test_format_sarif_empty() {
        let output = format_sarif(&[]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["version"], "2.1.0");
        assert!(parsed["$schema"].as_str().unwrap().contains("sarif-schema-2.1.0.json"));
        assert!(parsed["runs"][0]["results"].as_array().unwrap().is_empty());
        assert_eq!(parsed["runs"][0]["tool"]["driver"]["name"], "endpoint-lint");
    }

    #[test]
    fn test_format_sarif_rule_metadata() {
        let output = format_sarif(&[]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        let rules = parsed["runs"][0]["tool"]["driver"]["rules"].as_array().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0]["id"], "UnusedCallObject");
        assert_eq!(
            rules[0]["shortDescription"]["text"],
            "Detects when call object is created but not used"
        );
        assert_eq!(rules[0]["defaultConfiguration"]["level"], "error");
        assert_eq!(rules[0]["properties"]["priority"], 8);
    }

    #[test]
    fn test_format_sarif_single_diagnostic() {
        let diag = make_test_diagnostic(Severity::Error, UNUSED_CALL_OBJECT);
        let output = format_sarif(&[diag]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        let results = parsed["runs"][0]["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["ruleId"], "UnusedCallObject");
        assert_eq!(results[0]["ruleIndex"], 0);
        assert_eq!(results[0]["level"], "error");
        let location = &results[0]["locations"][0]["physicalLocation"];
        assert_eq!(location["artifactLocation"]["uri"], "src/com/example/TestClient.java");
        assert_eq!(location["region"]["startLine"], 5);
        assert_eq!(location["region"]["startColumn"], 9);
        assert_eq!(location["region"]["endColumn"], 27);
    }

    #[test]
    fn test_format_sarif_severity_levels() {
        let diagnostics = vec![
            make_test_diagnostic(Severity::Error, "error-rule"),
            make_test_diagnostic(Severity::Warning, "warning-rule"),
            make_test_diagnostic(Severity::Info, "info-rule"),
        ];
        let output = format_sarif(&diagnostics);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        let results = parsed["runs"][0]["results"].as_array().unwrap();
        assert_eq!(results[0]["level"], "error");
        assert_eq!(results[1]["level"], "warning");
        assert_eq!(results[2]["level"], "note");
        assert!(results[0].get("ruleIndex").is_none());
    }
}
