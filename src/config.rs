//! Configuration handling for endpoint-lint

use crate::rules::MarkerSet;
use crate::diagnostics::UnknownSeverity;
use crate::Severity;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file names searched, in order, in each directory
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".endpointlintrc.json",
    ".endpointlintrc.yaml",
    ".endpointlintrc.yml",
    ".endpointlintrc",
    "endpointlint.json",
    "endpointlint.yaml",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("Failed to parse JSON config: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("Failed to parse YAML config: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(#[from] globset::Error),
    #[error("Invalid severity in config: {0}")]
    InvalidSeverity(#[from] UnknownSeverity),
}

/// Runtime lint configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Only run these rules (if Some)
    pub enabled_rules: Option<Vec<String>>,
    /// Skip these rules
    pub disabled_rules: Vec<String>,
    /// Minimum severity to report
    pub min_severity: Severity,
    pub verbose: bool,
    pub statistics: bool,
    /// Exclude patterns as written
    pub exclude: Vec<String>,
    /// Compiled `exclude`
    pub exclude_patterns: GlobSet,
    /// Filename patterns to include (if set, only lint matching files)
    pub filename_patterns: Option<GlobSet>,
    /// Per-file rule overrides (file pattern -> disabled rules)
    pub per_file_ignores: HashMap<String, Vec<String>>,
    /// Severity overrides per rule
    pub severity_overrides: HashMap<String, Severity>,
    /// Max errors before stopping (0 = unlimited)
    pub max_errors: usize,
    /// Number of parallel jobs (0 = auto)
    pub jobs: usize,
    /// Annotations that mark a method's result as must-use
    pub markers: MarkerSet,
    /// Source roots parsed for declarations but never reported on
    pub source_paths: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled_rules: None,
            disabled_rules: Vec::new(),
            min_severity: Severity::Info,
            verbose: false,
            statistics: false,
            exclude: Vec::new(),
            exclude_patterns: GlobSet::empty(),
            filename_patterns: None,
            per_file_ignores: HashMap::new(),
            severity_overrides: HashMap::new(),
            max_errors: 0,
            jobs: 0,
            markers: MarkerSet::default(),
            source_paths: Vec::new(),
        }
    }
}

/// CLI options to merge into config
#[derive(Debug, Default)]
pub struct CliOptions {
    /// Rules to enable (replaces config if set)
    pub enabled_rules: Option<Vec<String>>,
    /// Rules to disable (adds to config)
    pub disabled_rules: Vec<String>,
    pub extend_ignore: Vec<String>,
    pub min_severity: Option<Severity>,
    pub verbose: bool,
    pub statistics: bool,
    pub max_errors: Option<usize>,
    pub jobs: Option<usize>,
    /// Exclude patterns (added to config)
    pub exclude: Vec<String>,
    /// Filename patterns (replace config if non-empty)
    pub filename: Vec<String>,
    /// Marker annotations added to the configured set
    pub extra_markers: Vec<String>,
    /// Context-only source roots (added to config)
    pub source_paths: Vec<PathBuf>,
}

/// Configuration file format (.endpointlintrc.json or .endpointlintrc.yaml)
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// Rules to enable (if specified, only these run)
    #[serde(default)]
    pub select: Vec<String>,

    #[serde(default)]
    pub ignore: Vec<String>,

    /// Additional rules to ignore (added to ignore, not replacing)
    #[serde(default)]
    pub extend_ignore: Vec<String>,

    /// Minimum severity: "error", "warning", or "info"
    #[serde(default)]
    pub min_severity: Option<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Filename patterns to include (only lint matching files)
    #[serde(default)]
    pub filename: Vec<String>,

    /// Per-file rule ignores: {"**/generated/**": ["UnusedCallObject"]}
    #[serde(default)]
    pub per_file_ignores: HashMap<String, Vec<String>>,

    /// Severity overrides: {"UnusedCallObject": "warning"}
    #[serde(default)]
    pub severity: HashMap<String, String>,

    #[serde(default)]
    pub max_errors: usize,

    #[serde(default)]
    pub jobs: usize,

    /// Replaces the default marker set when non-empty
    #[serde(default)]
    pub markers: Vec<String>,

    #[serde(default)]
    pub extend_markers: Vec<String>,

    /// Directories parsed for declarations only
    #[serde(default)]
    pub source_path: Vec<PathBuf>,
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config_file: ConfigFile = if path.extension().is_some_and(|e| e == "yaml" || e == "yml")
        {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        let mut config = Self::from_config_file(config_file)?;

        // relative source roots are taken from the config file's directory
        if let Some(dir) = path.parent() {
            for root in &mut config.source_paths {
                if root.is_relative() {
                    *root = dir.join(&*root);
                }
            }
        }

        Ok(config)
    }

    /// Try to find and load config from standard locations
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        let mut current = start_dir.to_path_buf();
        loop {
            for name in CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.is_file() {
                    let config = Self::from_file(&config_path)?;
                    return Ok(Some((config_path, config)));
                }
            }

            if !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Build config from a ConfigFile
    pub fn from_config_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let exclude_patterns = build_glob_set(&file.exclude)?;

        let filename_patterns = if file.filename.is_empty() {
            None
        } else {
            Some(build_glob_set(&file.filename)?)
        };

        // Reject bad per-file patterns up front
        for pattern in file.per_file_ignores.keys() {
            Glob::new(pattern)?;
        }

        let mut severity_overrides = HashMap::new();
        for (rule, sev) in &file.severity {
            severity_overrides.insert(rule.clone(), sev.parse()?);
        }

        let min_severity = match &file.min_severity {
            Some(s) => s.parse()?,
            None => Severity::Info,
        };

        let mut disabled_rules = file.ignore;
        disabled_rules.extend(file.extend_ignore);

        let base = if file.markers.is_empty() {
            MarkerSet::default()
        } else {
            MarkerSet::new(file.markers)
        };
        let markers = base.with(file.extend_markers);

        Ok(Self {
            enabled_rules: if file.select.is_empty() {
                None
            } else {
                Some(file.select)
            },
            disabled_rules,
            min_severity,
            verbose: false,
            statistics: false,
            exclude: file.exclude,
            exclude_patterns,
            filename_patterns,
            per_file_ignores: file.per_file_ignores,
            severity_overrides,
            max_errors: file.max_errors,
            jobs: file.jobs,
            markers,
            source_paths: file.source_path,
        })
    }

    /// Merge CLI options into this config (CLI takes precedence)
    pub fn merge_cli(&mut self, opts: CliOptions) -> Result<(), ConfigError> {
        if opts.enabled_rules.is_some() {
            self.enabled_rules = opts.enabled_rules;
        }

        self.disabled_rules.extend(opts.disabled_rules);
        self.disabled_rules.extend(opts.extend_ignore);

        if let Some(sev) = opts.min_severity {
            self.min_severity = sev;
        }

        self.verbose = opts.verbose;
        self.statistics = opts.statistics;

        if let Some(max) = opts.max_errors {
            self.max_errors = max;
        }

        if let Some(j) = opts.jobs {
            self.jobs = j;
        }

        if !opts.exclude.is_empty() {
            self.exclude.extend(opts.exclude);
            self.exclude_patterns = build_glob_set(&self.exclude)?;
        }

        if !opts.filename.is_empty() {
            self.filename_patterns = Some(build_glob_set(&opts.filename)?);
        }

        if !opts.extra_markers.is_empty() {
            self.markers = self.markers.with(opts.extra_markers);
        }

        self.source_paths.extend(opts.source_paths);

        Ok(())
    }

    /// Check if a file matches the filename pattern filter
    pub fn matches_filename_pattern(&self, file_path: &Path) -> bool {
        match &self.filename_patterns {
            Some(patterns) => patterns.is_match(file_path),
            None => true,
        }
    }

    /// Check if a rule is enabled
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        if self.disabled_rules.iter().any(|r| r == rule_id) {
            return false;
        }

        if let Some(ref enabled) = self.enabled_rules {
            return enabled.iter().any(|r| r == rule_id);
        }

        true
    }

    /// Check if a rule is enabled for a specific file
    pub fn is_rule_enabled_for_file(&self, rule_id: &str, file_path: &Path) -> bool {
        if !self.is_rule_enabled(rule_id) {
            return false;
        }

        let file_str = file_path.to_string_lossy();
        for (pattern, ignored_rules) in &self.per_file_ignores {
            if let Ok(glob) = Glob::new(pattern) {
                if glob.compile_matcher().is_match(file_str.as_ref())
                    && ignored_rules.iter().any(|r| r == rule_id)
                {
                    return false;
                }
            }
        }

        true
    }

    /// Check if a file should be excluded
    pub fn is_file_excluded(&self, file_path: &Path) -> bool {
        self.exclude_patterns.is_match(file_path)
    }

    /// Get effective severity for a rule (considering overrides)
    pub fn get_severity(&self, rule_id: &str, default: Severity) -> Severity {
        self.severity_overrides
            .get(rule_id)
            .copied()
            .unwrap_or(default)
    }

    /// Check if a severity should be reported
    pub fn should_report(&self, severity: Severity) -> bool {
        severity >= self.min_severity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_config() {
        let json = r#"{
            "select": ["UnusedCallObject"],
            "ignore": ["SomeOtherRule"],
            "minSeverity": "warning",
            "exclude": ["**/generated/**", "*.g.java"],
            "perFileIgnores": {
                "tests/*.java": ["UnusedCallObject"]
            },
            "severity": {
                "UnusedCallObject": "warning"
            }
        }"#;

        let config_file: ConfigFile = serde_json::from_str(json).unwrap();
        let config = Config::from_config_file(config_file).unwrap();

        assert_eq!(config.enabled_rules, Some(vec!["UnusedCallObject".to_string()]));
        assert_eq!(config.disabled_rules, vec!["SomeOtherRule".to_string()]);
        assert_eq!(config.min_severity, Severity::Warning);
        assert_eq!(
            config.severity_overrides.get("UnusedCallObject"),
            Some(&Severity::Warning)
        );
    }

    #[test]
    fn test_parse_yaml_config() {
        let yaml = "minSeverity: error\nmaxErrors: 100\nextendMarkers:\n  - com.acme.Endpoint\n";
        let config_file: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        let config = Config::from_config_file(config_file).unwrap();

        assert_eq!(config.min_severity, Severity::Error);
        assert_eq!(config.max_errors, 100);
        assert!(config.markers.contains("com.acme.Endpoint"));
        assert!(config.markers.contains("retrofit2.http.GET"));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.enabled_rules.is_none());
        assert!(config.disabled_rules.is_empty());
        assert_eq!(config.min_severity, Severity::Info);
        assert!(!config.verbose);
        assert!(!config.statistics);
        assert_eq!(config.max_errors, 0);
        assert_eq!(config.jobs, 0);
        assert_eq!(config.markers, MarkerSet::default());
        assert!(config.source_paths.is_empty());
    }

    #[test]
    fn test_markers_replace_default_set() {
        let json = r#"{ "markers": ["com.acme.Endpoint"] }"#;
        let config_file: ConfigFile = serde_json::from_str(json).unwrap();
        let config = Config::from_config_file(config_file).unwrap();

        assert_eq!(config.markers.len(), 1);
        assert!(!config.markers.contains("retrofit2.http.GET"));
    }

    #[test]
    fn test_rule_enabled() {
        let mut config = Config::default();
        config.disabled_rules = vec!["UnusedCallObject".to_string()];

        assert!(config.is_rule_enabled("SomeRule"));
        assert!(!config.is_rule_enabled("UnusedCallObject"));
    }

    #[test]
    fn test_rule_enabled_with_select() {
        let mut config = Config::default();
        config.enabled_rules = Some(vec!["allowed-rule".to_string()]);

        assert!(config.is_rule_enabled("allowed-rule"));
        assert!(!config.is_rule_enabled("UnusedCallObject"));
    }

    #[test]
    fn test_rule_enabled_for_file() {
        let mut config = Config::default();
        config
            .per_file_ignores
            .insert("tests/*.java".to_string(), vec!["UnusedCallObject".to_string()]);

        assert!(config.is_rule_enabled_for_file("UnusedCallObject", Path::new("src/Main.java")));
        assert!(!config.is_rule_enabled_for_file("UnusedCallObject", Path::new("tests/Foo.java")));
        assert!(config.is_rule_enabled_for_file("other-rule", Path::new("tests/Foo.java")));
    }

    #[test]
    fn test_rule_disabled_globally_not_enabled_for_file() {
        let mut config = Config::default();
        config.disabled_rules = vec!["UnusedCallObject".to_string()];

        assert!(!config.is_rule_enabled_for_file("UnusedCallObject", Path::new("any/File.java")));
    }

    #[test]
    fn test_is_file_excluded() {
        let json = r#"{ "exclude": ["**/generated/**", "*.g.java"] }"#;
        let config_file: ConfigFile = serde_json::from_str(json).unwrap();
        let config = Config::from_config_file(config_file).unwrap();

        assert!(config.is_file_excluded(Path::new("src/generated/Api.java")));
        assert!(config.is_file_excluded(Path::new("Api.g.java")));
        assert!(!config.is_file_excluded(Path::new("Api.java")));
    }

    #[test]
    fn test_invalid_glob_is_rejected() {
        let json = r#"{ "exclude": ["src/[unclosed"] }"#;
        let config_file: ConfigFile = serde_json::from_str(json).unwrap();
        assert!(matches!(
            Config::from_config_file(config_file),
            Err(ConfigError::InvalidGlob(_))
        ));

        let json = r#"{ "perFileIgnores": { "a/{b": ["UnusedCallObject"] } }"#;
        let config_file: ConfigFile = serde_json::from_str(json).unwrap();
        assert!(Config::from_config_file(config_file).is_err());
    }

    #[test]
    fn test_invalid_severity_is_rejected() {
        let json = r#"{ "severity": { "UnusedCallObject": "critical" } }"#;
        let config_file: ConfigFile = serde_json::from_str(json).unwrap();
        assert!(matches!(
            Config::from_config_file(config_file),
            Err(ConfigError::InvalidSeverity(_))
        ));

        let json = r#"{ "minSeverity": "loud" }"#;
        let config_file: ConfigFile = serde_json::from_str(json).unwrap();
        assert!(Config::from_config_file(config_file).is_err());
    }

    #[test]
    fn test_matches_filename_pattern() {
        let json = r#"{ "filename": ["*Client.java"] }"#;
        let config_file: ConfigFile = serde_json::from_str(json).unwrap();
        let config = Config::from_config_file(config_file).unwrap();

        assert!(config.matches_filename_pattern(Path::new("TestClient.java")));
        assert!(!config.matches_filename_pattern(Path::new("ApiInterface.java")));
        assert!(Config::default().matches_filename_pattern(Path::new("anything.txt")));
    }

    #[test]
    fn test_get_severity_with_override() {
        let mut config = Config::default();
        config
            .severity_overrides
            .insert("UnusedCallObject".to_string(), Severity::Warning);

        assert_eq!(config.get_severity("UnusedCallObject", Severity::Error), Severity::Warning);
        assert_eq!(config.get_severity("other-rule", Severity::Error), Severity::Error);
    }

    #[test]
    fn test_should_report() {
        let mut config = Config::default();
        assert!(config.should_report(Severity::Error));
        assert!(config.should_report(Severity::Info));

        config.min_severity = Severity::Warning;
        assert!(config.should_report(Severity::Error));
        assert!(config.should_report(Severity::Warning));
        assert!(!config.should_report(Severity::Info));

        config.min_severity = Severity::Error;
        assert!(!config.should_report(Severity::Warning));
    }

    #[test]
    fn test_merge_cli() {
        let mut config = Config::default();
        config.disabled_rules = vec!["existing-rule".to_string()];

        config
            .merge_cli(CliOptions {
                enabled_rules: Some(vec!["cli-enabled".to_string()]),
                disabled_rules: vec!["cli-disabled".to_string()],
                extend_ignore: vec!["cli-extend-ignore".to_string()],
                min_severity: Some(Severity::Error),
                verbose: true,
                statistics: true,
                max_errors: Some(10),
                jobs: Some(4),
                exclude: vec!["**/build/**".to_string()],
                filename: vec!["*.java".to_string()],
                extra_markers: vec!["com.acme.Endpoint".to_string()],
                source_paths: vec![PathBuf::from("libs/api")],
            })
            .unwrap();

        assert_eq!(config.enabled_rules, Some(vec!["cli-enabled".to_string()]));
        assert!(config.disabled_rules.contains(&"existing-rule".to_string()));
        assert!(config.disabled_rules.contains(&"cli-disabled".to_string()));
        assert!(config.disabled_rules.contains(&"cli-extend-ignore".to_string()));
        assert_eq!(config.min_severity, Severity::Error);
        assert!(config.verbose);
        assert!(config.statistics);
        assert_eq!(config.max_errors, 10);
        assert_eq!(config.jobs, 4);
        assert!(config.is_file_excluded(Path::new("app/build/Gen.java")));
        assert!(!config.matches_filename_pattern(Path::new("README.md")));
        assert!(config.markers.contains("com.acme.Endpoint"));
        assert!(config.markers.contains("retrofit2.http.POST"));
        assert_eq!(config.source_paths, vec![PathBuf::from("libs/api")]);
    }

    #[test]
    fn test_merge_cli_partial() {
        let mut config = Config::default();
        config.enabled_rules = Some(vec!["original-rule".to_string()]);
        config.max_errors = 5;
        config.jobs = 2;

        config.merge_cli(CliOptions::default()).unwrap();

        assert_eq!(config.enabled_rules, Some(vec!["original-rule".to_string()]));
        assert_eq!(config.max_errors, 5);
        assert_eq!(config.jobs, 2);
        assert_eq!(config.markers, MarkerSet::default());
    }

    #[test]
    fn test_extend_ignore_combines() {
        let json = r#"{ "ignore": ["rule1"], "extendIgnore": ["rule2", "rule3"] }"#;
        let config_file: ConfigFile = serde_json::from_str(json).unwrap();
        let config = Config::from_config_file(config_file).unwrap();

        assert_eq!(config.disabled_rules.len(), 3);
        assert!(config.disabled_rules.contains(&"rule3".to_string()));
    }

    #[test]
    fn test_empty_select_means_all_enabled() {
        let config_file: ConfigFile = serde_json::from_str(r#"{ "select": [] }"#).unwrap();
        let config = Config::from_config_file(config_file).unwrap();

        assert!(config.enabled_rules.is_none());
        assert!(config.is_rule_enabled("UnusedCallObject"));
    }

    #[test]
    fn test_find_and_load_walks_upward() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("app/src/main/java");
        fs::create_dir_all(&nested).unwrap();

        let config_path = dir.path().join(".endpointlintrc.yaml");
        fs::write(&config_path, "ignore: [UnusedCallObject]\nsourcePath: [libs]\n").unwrap();

        let (found, config) = Config::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(found, config_path);
        assert!(!config.is_rule_enabled("UnusedCallObject"));
        assert_eq!(config.source_paths, vec![dir.path().join("libs")]);
    }

    #[test]
    fn test_find_and_load_none() {
        let dir = tempfile::tempdir().unwrap();
        // A directory tree with no config may still find one further up on
        // the host, so only check that the search itself succeeds
        assert!(Config::find_and_load(dir.path()).is_ok());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("endpointlint.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Config::from_file(&path), Err(ConfigError::ParseJson(_))));
    }
}
