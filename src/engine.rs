//! Lint engine - parses sources, builds the project index and runs rules

use crate::config::Config;
use crate::diagnostics::{Diagnostic, Location};
use crate::resolve::{FileResolver, ProjectIndex};
use crate::rules::{all_rules, Rule, UnusedCallObject, UNUSED_CALL_OBJECT_RULE};
use crate::syntax::{ParseError, SyntaxTree};
use crate::Severity;
use log::{debug, trace, warn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LintError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

impl LintError {
    /// File the error is about
    pub fn path(&self) -> &Path {
        match self {
            LintError::Io { path, .. } | LintError::Parse { path, .. } => path,
        }
    }
}

/// Statistics about lint results
#[derive(Debug, Default, Clone)]
pub struct LintStatistics {
    /// Count per rule ID
    pub per_rule: HashMap<String, usize>,
    /// Count per severity
    pub per_severity: HashMap<Severity, usize>,
    /// Total files linted
    pub files_linted: usize,
    /// Files with errors
    pub files_with_errors: usize,
}

impl LintStatistics {
    /// Record a diagnostic
    pub fn record(&mut self, diagnostic: &Diagnostic) {
        *self.per_rule.entry(diagnostic.rule_id.clone()).or_insert(0) += 1;
        *self.per_severity.entry(diagnostic.severity).or_insert(0) += 1;
    }

    /// Merge another statistics into this one
    pub fn merge(&mut self, other: &LintStatistics) {
        for (rule, count) in &other.per_rule {
            *self.per_rule.entry(rule.clone()).or_insert(0) += count;
        }
        for (severity, count) in &other.per_severity {
            *self.per_severity.entry(*severity).or_insert(0) += count;
        }
        self.files_linted += other.files_linted;
        self.files_with_errors += other.files_with_errors;
    }

    pub fn error_count(&self) -> usize {
        *self.per_severity.get(&Severity::Error).unwrap_or(&0)
    }

    pub fn warning_count(&self) -> usize {
        *self.per_severity.get(&Severity::Warning).unwrap_or(&0)
    }

    pub fn info_count(&self) -> usize {
        *self.per_severity.get(&Severity::Info).unwrap_or(&0)
    }
}

/// A source file held in memory
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path used in diagnostics
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read a source file from disk
    pub fn read(path: &Path) -> Result<Self, LintError> {
        let text = fs::read_to_string(path).map_err(|source| LintError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path, text))
    }

    fn parse(&self) -> Result<SyntaxTree, LintError> {
        SyntaxTree::parse_str(&self.text).map_err(|source| LintError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

/// Outcome of linting a set of files
#[derive(Debug, Default)]
pub struct LintReport {
    /// Diagnostics sorted by file, line and column
    pub diagnostics: Vec<Diagnostic>,
    /// Target files that could not be read or parsed
    pub failures: Vec<LintError>,
    pub statistics: LintStatistics,
}

impl LintReport {
    /// Whether any error-severity diagnostic was emitted
    pub fn has_errors(&self) -> bool {
        self.statistics.error_count() > 0
    }
}

/// The main lint engine
pub struct LintEngine {
    rule: UnusedCallObject,
    config: Config,
}

impl LintEngine {
    /// Create a new lint engine
    pub fn new(config: Config) -> Self {
        Self {
            rule: UnusedCallObject::new(config.markers.clone()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get count of enabled rules
    pub fn rule_count(&self) -> usize {
        all_rules()
            .iter()
            .filter(|r| self.config.is_rule_enabled(r.id))
            .count()
    }

    /// Lint `targets`, resolving declarations across `targets` and `context`.
    /// Only targets are reported on. Excluded targets still contribute
    /// declarations.
    pub fn lint_sources(&self, targets: Vec<SourceFile>, context: Vec<SourceFile>) -> LintReport {
        let (targets, excluded): (Vec<_>, Vec<_>) = targets
            .into_iter()
            .partition(|s| !self.config.is_file_excluded(&s.path));
        let context: Vec<SourceFile> = excluded.into_iter().chain(context).collect();

        let parsed_targets: Vec<(PathBuf, Result<SyntaxTree, LintError>)> = targets
            .par_iter()
            .map(|s| (s.path.clone(), s.parse()))
            .collect();
        let parsed_context: Vec<Result<SyntaxTree, LintError>> =
            context.par_iter().map(SourceFile::parse).collect();

        let mut report = LintReport::default();
        let mut trees = Vec::new();
        for (path, parsed) in parsed_targets {
            match parsed {
                Ok(tree) => trees.push((path, tree)),
                Err(e) => report.failures.push(e),
            }
        }
        let context_trees: Vec<SyntaxTree> = parsed_context
            .into_iter()
            .filter_map(|parsed| match parsed {
                Ok(tree) => Some(tree),
                Err(e) => {
                    warn!("skipping context source: {}", e);
                    None
                }
            })
            .collect();

        let index = ProjectIndex::build(
            trees.iter().map(|(_, tree)| tree).chain(context_trees.iter()),
        );
        debug!(
            "indexed {} types from {} target and {} context files",
            index.len(),
            trees.len(),
            context_trees.len()
        );

        let per_file: Vec<Vec<Diagnostic>> = trees
            .par_iter()
            .map(|(path, tree)| self.lint_tree(tree, path, &index))
            .collect();

        for diagnostics in &per_file {
            report.statistics.files_linted += 1;
            if diagnostics.iter().any(Diagnostic::is_error) {
                report.statistics.files_with_errors += 1;
            }
        }

        let mut diagnostics: Vec<Diagnostic> = per_file.into_iter().flatten().collect();
        sort_diagnostics(&mut diagnostics);
        self.apply_max_errors(&mut diagnostics);

        for d in &diagnostics {
            report.statistics.record(d);
        }
        report.diagnostics = diagnostics;
        report
    }

    /// Read and lint files from disk. Unreadable targets land in
    /// [`LintReport::failures`]; unreadable context files are skipped.
    pub fn lint_paths(&self, targets: &[PathBuf], context: &[PathBuf]) -> LintReport {
        let read_targets: Vec<Result<SourceFile, LintError>> =
            targets.par_iter().map(|p| SourceFile::read(p)).collect();
        let context_sources: Vec<SourceFile> = context
            .par_iter()
            .filter_map(|p| match SourceFile::read(p) {
                Ok(source) => Some(source),
                Err(e) => {
                    warn!("skipping context source: {}", e);
                    None
                }
            })
            .collect();

        let mut sources = Vec::new();
        let mut failures = Vec::new();
        for read in read_targets {
            match read {
                Ok(source) => sources.push(source),
                Err(e) => failures.push(e),
            }
        }

        let mut report = self.lint_sources(sources, context_sources);
        failures.append(&mut report.failures);
        report.failures = failures;
        report
    }

    /// Lint a single file on its own
    pub fn lint_file(&self, path: &Path) -> Result<Vec<Diagnostic>, LintError> {
        if self.config.is_file_excluded(path) {
            return Ok(Vec::new());
        }

        let source = SourceFile::read(path)?;
        self.lint_str(&source.text, path)
    }

    /// Lint source text as if it were the file at `path`
    pub fn lint_str(&self, source: &str, path: &Path) -> Result<Vec<Diagnostic>, LintError> {
        let tree = SourceFile::new(path, source).parse()?;
        let index = ProjectIndex::build([&tree]);
        let mut diagnostics = self.lint_tree(&tree, path, &index);
        sort_diagnostics(&mut diagnostics);
        Ok(diagnostics)
    }

    /// Lint one parsed file against a prebuilt index
    pub fn lint_tree(&self, tree: &SyntaxTree, path: &Path, index: &ProjectIndex) -> Vec<Diagnostic> {
        let rule: &Rule = &UNUSED_CALL_OBJECT_RULE;
        let mut diagnostics = Vec::new();

        // Check global and per-file enablement
        if !self.config.is_rule_enabled_for_file(rule.id, path) {
            return diagnostics;
        }

        let severity = self.config.get_severity(rule.id, rule.severity);
        if !self.config.should_report(severity) {
            return diagnostics;
        }

        let resolver = FileResolver::new(tree, index);
        for call in tree.calls() {
            if !self.rule.check(tree, call, &resolver) {
                continue;
            }

            let (line, column) = tree.line_col(tree.span(call).start);

            if tree.is_rule_disabled_at_line(rule.id, line) || tree.is_suppressed(call, rule.id) {
                trace!("{}:{}: {} suppressed", path.display(), line, rule.id);
                continue;
            }

            let length = tree
                .text(call)
                .lines()
                .next()
                .map(|l| l.trim_end().chars().count())
                .unwrap_or(0);
            let location = Location {
                file: path.to_path_buf(),
                line,
                column,
                length,
            };

            let mut diagnostic = Diagnostic::new(rule.id, severity, rule.message, location);
            if let Some(source_line) = tree.get_source_line(line) {
                diagnostic = diagnostic.with_source_line(source_line);
            }
            diagnostics.push(diagnostic.with_help(rule.help));
        }

        diagnostics
    }

    /// Keep diagnostics up to and including the `max_errors`-th error
    fn apply_max_errors(&self, diagnostics: &mut Vec<Diagnostic>) {
        let max = self.config.max_errors;
        if max == 0 {
            return;
        }
        let mut errors = 0;
        let cut = diagnostics.iter().position(|d| {
            if d.is_error() {
                errors += 1;
            }
            errors > max
        });
        if let Some(cut) = cut {
            debug!("stopping after {} errors", max);
            diagnostics.truncate(cut);
        }
    }
}

/// Sort diagnostics by file, then line, then column
fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.location
            .file
            .cmp(&b.location.file)
            .then_with(|| a.location.line.cmp(&b.location.line))
            .then_with(|| a.location.column.cmp(&b.location.column))
    });
}
