//! endpoint-lint CLI entry point

use clap::Parser;
use endpoint_lint::config::CliOptions;
use endpoint_lint::rules::{all_rules, find_rule, Rule};
use endpoint_lint::{output, Config, LintEngine, LintStatistics, Severity, SourceFile};
use log::{debug, info};
use miette::{miette, IntoDiagnostic, Result};
use std::collections::HashSet;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "endpoint-lint")]
#[command(author, version, about = "Flags HTTP endpoint call objects that are created but never used", long_about = None)]
struct Cli {
    /// Java files, directories or glob patterns to lint. Use "-" for stdin.
    #[arg(required_unless_present_any = ["explain", "list_rules"])]
    paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Config file path (default: auto-detect .endpointlintrc.json)
    #[arg(short, long, env = "ENDPOINT_LINT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable specific rule (can be used multiple times)
    #[arg(short, long = "rule", value_name = "RULE")]
    rules: Vec<String>,

    /// Disable specific rule (can be used multiple times)
    #[arg(short, long = "ignore", value_name = "RULE")]
    ignore: Vec<String>,

    /// Add to ignored rules without replacing (can be used multiple times)
    #[arg(long = "extend-ignore", value_name = "RULE")]
    extend_ignore: Vec<String>,

    /// Minimum severity level to report
    #[arg(short, long, value_enum)]
    severity: Option<SeverityFilter>,

    /// Only output errors (equivalent to --severity=error)
    #[arg(short, long)]
    quiet: bool,

    /// Show statistics at the end
    #[arg(long)]
    statistics: bool,

    /// Only show count of diagnostics (no details)
    #[arg(long)]
    count: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Exclude files matching pattern (can be used multiple times)
    #[arg(long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Only lint files matching pattern (can be used multiple times)
    #[arg(long = "filename", value_name = "PATTERN")]
    filename: Vec<String>,

    /// Stop after this many errors (0 = unlimited)
    #[arg(long = "max-errors", value_name = "N")]
    max_errors: Option<usize>,

    /// Number of parallel jobs (0 = auto, 1 = sequential)
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    jobs: Option<usize>,

    /// Additional marker annotation, fully qualified (can be used multiple times)
    #[arg(long = "marker", value_name = "ANNOTATION")]
    markers: Vec<String>,

    /// Source root parsed for declarations only (can be used multiple times)
    #[arg(long = "source-path", value_name = "DIR")]
    source_paths: Vec<PathBuf>,

    /// Show details about a rule and exit
    #[arg(long, value_name = "RULE")]
    explain: Option<String>,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Sarif,
    /// Android lint style report
    Lint,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum SeverityFilter {
    Error,
    Warning,
    Info,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    if let Some(ref rule_id) = cli.explain {
        let rule = find_rule(rule_id).ok_or_else(|| miette!("Unknown rule: {}", rule_id))?;
        explain_rule(rule);
        return Ok(ExitCode::SUCCESS);
    }

    if cli.list_rules {
        println!("Available rules:");
        println!();
        for rule in all_rules() {
            println!("  {:24} {:8} {}", rule.id, rule.severity.as_str(), rule.description);
        }
        return Ok(ExitCode::SUCCESS);
    }

    // Load or create configuration
    let mut config = if let Some(ref config_path) = cli.config {
        Config::from_file(config_path).into_diagnostic()?
    } else {
        let start_dir = std::env::current_dir().into_diagnostic()?;
        match Config::find_and_load(&start_dir).into_diagnostic()? {
            Some((path, cfg)) => {
                info!("using config: {}", path.display());
                cfg
            }
            None => Config::default(),
        }
    };

    let cli_severity = if cli.quiet {
        Some(Severity::Error)
    } else {
        cli.severity.map(|s| match s {
            SeverityFilter::Error => Severity::Error,
            SeverityFilter::Warning => Severity::Warning,
            SeverityFilter::Info => Severity::Info,
        })
    };

    config
        .merge_cli(CliOptions {
            enabled_rules: if cli.rules.is_empty() { None } else { Some(cli.rules) },
            disabled_rules: cli.ignore,
            extend_ignore: cli.extend_ignore,
            min_severity: cli_severity,
            verbose: cli.verbose,
            statistics: cli.statistics,
            max_errors: cli.max_errors,
            jobs: cli.jobs,
            exclude: cli.exclude,
            filename: cli.filename,
            extra_markers: cli.markers,
            source_paths: cli.source_paths,
        })
        .into_diagnostic()?;

    if config.jobs > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.jobs)
            .build_global()
            .into_diagnostic()?;
    }

    // Collect files to lint
    let mut targets = Vec::new();
    let mut stdin_source = None;
    for path in &cli.paths {
        let path_str = path.to_string_lossy();

        if path_str == "-" {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content).into_diagnostic()?;
            stdin_source = Some(SourceFile::new("<stdin>", content));
            continue;
        }

        if path_str.contains(['*', '?', '[']) {
            for entry in glob::glob(&path_str).into_diagnostic()? {
                let path = entry.into_diagnostic()?;
                if path.is_dir() {
                    targets.extend(java_files(&path, &config));
                } else if should_lint_file(&path, &config) {
                    targets.push(path);
                }
            }
        } else if path.is_dir() {
            targets.extend(java_files(path, &config));
        } else if should_lint_file(path, &config) {
            targets.push(path.clone());
        }
    }

    let target_set: HashSet<&PathBuf> = targets.iter().collect();
    let context: Vec<PathBuf> = config
        .source_paths
        .iter()
        .flat_map(|root| {
            if root.is_dir() {
                java_files_unfiltered(root)
            } else {
                vec![root.clone()]
            }
        })
        .filter(|p| !target_set.contains(p))
        .collect();

    if targets.is_empty() && stdin_source.is_none() {
        eprintln!("No files to lint");
        return Ok(ExitCode::SUCCESS);
    }

    debug!("linting {} files with {} context files", targets.len(), context.len());

    let engine = LintEngine::new(config.clone());
    let report = match stdin_source {
        Some(stdin) => {
            // stdin is linted alongside the on-disk targets
            let mut sources = vec![stdin];
            let mut failures = Vec::new();
            for path in &targets {
                match SourceFile::read(path) {
                    Ok(source) => sources.push(source),
                    Err(e) => failures.push(e),
                }
            }
            let context_sources = context
                .iter()
                .filter_map(|p| SourceFile::read(p).ok())
                .collect();
            let mut report = engine.lint_sources(sources, context_sources);
            report.failures.extend(failures);
            report
        }
        None => engine.lint_paths(&targets, &context),
    };

    for failure in &report.failures {
        eprintln!("{}", failure);
    }

    let stats = &report.statistics;
    let diagnostics = &report.diagnostics;

    if cli.count {
        println!("{}", diagnostics.len());
        return Ok(exit_code(stats, !report.failures.is_empty()));
    }

    match cli.format {
        OutputFormat::Text => output::print_text(diagnostics),
        OutputFormat::Json => output::print_json(diagnostics).into_diagnostic()?,
        OutputFormat::Sarif => output::print_sarif(diagnostics).into_diagnostic()?,
        OutputFormat::Lint => output::print_lint(diagnostics),
    }

    if config.statistics {
        print_statistics(stats);
    }

    if !cli.quiet && matches!(cli.format, OutputFormat::Text) {
        let file_count = stats.files_linted;
        let file_word = if file_count == 1 { "file" } else { "files" };
        let error_count = stats.error_count();
        let warning_count = stats.warning_count();

        if error_count == 0 && warning_count == 0 {
            eprintln!("\nNo issues found in {} {}", file_count, file_word);
        } else {
            eprintln!(
                "\nFound {} error{} and {} warning{} in {} {}",
                error_count,
                if error_count == 1 { "" } else { "s" },
                warning_count,
                if warning_count == 1 { "" } else { "s" },
                file_count,
                file_word
            );
        }
    }

    Ok(exit_code(stats, !report.failures.is_empty()))
}

/// 2 when any input failed, 1 when an error was reported, 0 otherwise
fn exit_code(stats: &LintStatistics, had_failures: bool) -> ExitCode {
    if had_failures {
        ExitCode::from(2)
    } else if stats.error_count() > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn should_lint_file(path: &Path, config: &Config) -> bool {
    !config.is_file_excluded(path) && config.matches_filename_pattern(path)
}

fn is_java_file(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "java")
}

/// Java files under `root` that pass the exclude and filename filters
fn java_files(root: &Path, config: &Config) -> Vec<PathBuf> {
    java_files_unfiltered(root)
        .into_iter()
        .filter(|p| should_lint_file(p, config))
        .collect()
}

fn java_files_unfiltered(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_java_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

fn explain_rule(rule: &Rule) {
    println!("Rule Details");
    println!();
    println!("  ID: {}", rule.id);
    println!("  Name: {}", rule.name);
    println!("  Severity: {}", rule.severity.colored());
    println!("  Category: {}", rule.category);
    println!("  Priority: {}/10", rule.priority);
    println!();
    println!("  Description");
    println!("  {}", rule.description);
    println!();
    println!("  Explanation");
    println!("  {}", rule.explanation);
    println!();
    println!("  Fix");
    println!("  {}", rule.help);
}

fn print_statistics(stats: &LintStatistics) {
    eprintln!("\n\x1b[1mStatistics:\x1b[0m");
    eprintln!("  Files linted: {}", stats.files_linted);
    eprintln!("  Files with errors: {}", stats.files_with_errors);
    eprintln!();

    if !stats.per_rule.is_empty() {
        eprintln!("  \x1b[1mBy rule:\x1b[0m");
        let mut rules: Vec<_> = stats.per_rule.iter().collect();
        rules.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (rule, count) in rules {
            eprintln!("    {:40} {}", rule, count);
        }
    }

    eprintln!();
    eprintln!("  \x1b[1mBy severity:\x1b[0m");
    eprintln!("    \x1b[1;31mErrors:\x1b[0m   {}", stats.error_count());
    eprintln!("    \x1b[1;33mWarnings:\x1b[0m {}", stats.warning_count());
    eprintln!("    \x1b[1;36mInfo:\x1b[0m     {}", stats.info_count());
}
