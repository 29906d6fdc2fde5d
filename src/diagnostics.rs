//! Findings reported against Java sources

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// How seriously a finding is reported. Ordered so that `Error` is highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    #[default]
    Info,
    Warning,
    /// Fails the run (exit code 1)
    Error,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown severity `{0}`")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    /// Accepts the spellings found in lint configs: `error`/`fatal`,
    /// `warning`/`warn`, `info`/`information`/`hint`, in any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" | "fatal" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "info" | "information" | "hint" => Ok(Severity::Info),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Severity {
    /// Lowercase keyword, as written in config files and JSON output
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// Word used in the lint-style report (`Error`, `Warning`)
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Information",
        }
    }

    fn ansi_style(&self) -> &'static str {
        match self {
            Severity::Error => "1;31",
            Severity::Warning => "1;33",
            Severity::Info => "1;36",
        }
    }

    /// Keyword wrapped in the terminal colour for its level
    pub fn colored(&self) -> String {
        format!("\x1b[{}m{}\x1b[0m", self.ansi_style(), self.as_str())
    }
}

/// Where a flagged call starts. Line and column are 1-based; `length` counts
/// characters of the call on its first line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

/// One finding of one rule
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    /// How to fix it, shown under the message in text output
    pub help: Option<String>,
    pub location: Location,
    /// Full text of `location.line`, used for the caret/underline display
    pub source_line: Option<String>,
}

impl Diagnostic {
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
            help: None,
            location,
            source_line: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_source_line(mut self, line: impl Into<String>) -> Self {
        self.source_line = Some(line.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_str() {
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("ERROR".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("fatal".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("Warning".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!(" info ".parse::<Severity>(), Ok(Severity::Info));
        assert_eq!("hint".parse::<Severity>(), Ok(Severity::Info));
    }

    #[test]
    fn test_unknown_severity_is_an_error() {
        let err = "severe".parse::<Severity>().unwrap_err();
        assert_eq!(err, UnknownSeverity("severe".to_string()));
        assert_eq!(err.to_string(), "unknown severity `severe`");
        assert!("".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::Error.as_str(), "error");
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Error.label(), "Error");
        assert_eq!(Severity::Warning.label(), "Warning");
        assert_eq!(Severity::Error.colored(), "\x1b[1;31merror\x1b[0m");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert_eq!(Severity::default(), Severity::Info);
    }

    #[test]
    fn test_diagnostic_builder_chain() {
        let loc = Location {
            file: PathBuf::from("src/com/example/TestClient.java"),
            line: 5,
            column: 9,
            length: 18,
        };
        let diag = Diagnostic::new("UnusedCallObject", Severity::Error, "message", loc)
            .with_help("help text")
            .with_source_line("        apiInterface.foo();");

        assert_eq!(diag.rule_id, "UnusedCallObject");
        assert!(diag.is_error());
        assert_eq!(diag.help.as_deref(), Some("help text"));
        assert_eq!(diag.source_line.as_deref(), Some("        apiInterface.foo();"));
        assert_eq!(diag.location.length, 18);
    }

    #[test]
    fn test_diagnostic_new_has_no_extras() {
        let diag = Diagnostic::new("r", Severity::Warning, "m", Location::default());
        assert!(diag.help.is_none());
        assert!(diag.source_line.is_none());
        assert!(!diag.is_error());
    }
}
