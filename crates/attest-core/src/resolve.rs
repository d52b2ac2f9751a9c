//! Configuration resolution: merging CLI and file options into one snapshot.
//!
//! [`resolve`] folds the two configuration sources into a single immutable
//! [`ResolvedConfig`] under one rule, applied independently per option: an
//! option explicitly set on the command line wins; otherwise the file value
//! applies; otherwise a hard-coded default. The fold is expressed through
//! [`select`]/[`select_switch`] so every option's resolution reads the same
//! way and can be audited in isolation.
//!
//! A handful of options carry extra derivation on top of the fold: suite
//! selection, cache-path chains, column clamping, coverage/logging
//! suppression, reporter precedence, and the color cascade. Each is
//! documented on the helper that implements it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use is_terminal::IsTerminal;

use crate::error::{Error, Result};
use crate::file_config::FileConfig;
use crate::options::{CliOptions, ColorMode, Columns, ExecutionOrder, ReporterKind};
use crate::suite::{self, TestSuite, DEFAULT_SUFFIXES};

/// Narrowest output width the reporters can render.
pub const MIN_COLUMNS: u16 = 16;

/// Output width used when neither source sets one.
pub const DEFAULT_COLUMNS: u16 = 80;

/// Default complexity threshold for the complexity coverage report.
pub const DEFAULT_COMPLEXITY_THRESHOLD: u32 = 30;

/// Default HTML coverage band bounds (low-upper, high-lower), percent.
pub const DEFAULT_HTML_BOUNDS: (u8, u8) = (50, 90);

/// Filename of the result cache when no explicit path is resolved.
pub const RESULT_CACHE_FILENAME: &str = ".attest.result.cache";

/// Environment marker set when attest runs under its own test harness.
pub const SELFTEST_MARKER: &str = "ATTEST_TESTSUITE";

/// Resolved HTML coverage report settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHtmlReport {
    /// Directory the report is written into.
    pub target: PathBuf,
    /// Upper bound of the "low coverage" band, percent.
    pub low_upper_bound: u8,
    /// Lower bound of the "high coverage" band, percent.
    pub high_lower_bound: u8,
}

/// Resolved complexity-risk coverage report settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedComplexityReport {
    /// Where the report is written.
    pub target: PathBuf,
    /// Complexity score above which an uncovered unit is flagged.
    pub threshold: u32,
}

/// Resolved text coverage report settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTextReport {
    /// Where the report is written.
    pub target: PathBuf,
    /// List files without coverage in the report.
    pub show_uncovered_files: bool,
    /// Render only the summary block.
    pub show_only_summary: bool,
}

/// The single immutable configuration snapshot governing one run.
///
/// Every field holds exactly one value, chosen by [`resolve`]. A new run
/// produces a new instance; nothing mutates an existing one.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ResolvedConfig {
    /// The selected test suite.
    pub suite: TestSuite,
    /// Filename suffixes used by directory discovery.
    pub test_suffixes: Vec<String>,
    /// Groups included in execution; empty means all.
    pub include_groups: Vec<String>,
    /// Groups excluded from execution, include-set already subtracted.
    pub exclude_groups: Vec<String>,

    /// Cache directory, when one resolved.
    pub cache_directory: Option<PathBuf>,
    /// Coverage cache directory, when one resolved.
    pub coverage_cache_directory: Option<PathBuf>,
    /// Result cache file path.
    pub result_cache_file: PathBuf,
    /// Whether results are cached at all.
    pub cache_results: bool,

    /// Clover coverage report target.
    pub coverage_clover: Option<PathBuf>,
    /// Cobertura coverage report target.
    pub coverage_cobertura: Option<PathBuf>,
    /// Complexity coverage report settings.
    pub coverage_complexity: Option<ResolvedComplexityReport>,
    /// HTML coverage report settings.
    pub coverage_html: Option<ResolvedHtmlReport>,
    /// JSON coverage snapshot target.
    pub coverage_json: Option<PathBuf>,
    /// Text coverage report settings.
    pub coverage_text: Option<ResolvedTextReport>,
    /// XML coverage report target directory.
    pub coverage_xml: Option<PathBuf>,

    /// Plain text log target.
    pub log_text: Option<PathBuf>,
    /// JUnit XML report target.
    pub log_junit: Option<PathBuf>,
    /// Structured JSON-lines event log target.
    pub log_events: Option<PathBuf>,
    /// Documentation-style text report target.
    pub doc_text: Option<PathBuf>,
    /// Documentation-style HTML report target.
    pub doc_html: Option<PathBuf>,
    /// Documentation-style XML report target.
    pub doc_xml: Option<PathBuf>,

    /// Progress reporter flavor.
    pub reporter: ReporterKind,
    /// Base execution order.
    pub execution_order: ExecutionOrder,
    /// Run previously defective tests first.
    pub defects_first: bool,
    /// Seed for random execution order.
    pub random_seed: u64,

    /// Stop after the first error or failure.
    pub stop_on_defect: bool,
    /// Stop after the first error.
    pub stop_on_error: bool,
    /// Stop after the first failure.
    pub stop_on_failure: bool,
    /// Stop after the first warning.
    pub stop_on_warning: bool,
    /// Stop after the first risky test.
    pub stop_on_risky: bool,
    /// Stop after the first skipped test.
    pub stop_on_skipped: bool,
    /// Stop after the first incomplete test.
    pub stop_on_incomplete: bool,

    /// Fail when the suite contains no tests.
    pub fail_on_empty_test_suite: bool,
    /// Fail when any test emitted a warning.
    pub fail_on_warning: bool,
    /// Fail when any test was risky.
    pub fail_on_risky: bool,
    /// Fail when any test was skipped.
    pub fail_on_skipped: bool,
    /// Fail when any test was incomplete.
    pub fail_on_incomplete: bool,

    /// Output width in columns.
    pub columns: u16,
    /// Whether the requested width was below [`MIN_COLUMNS`] and clamped.
    pub too_few_columns: bool,
    /// Whether output uses ANSI colors.
    pub colors: bool,
    /// Verbose output.
    pub verbose: bool,
    /// Debug output.
    pub debug: bool,

    /// Run each test in an isolated child process.
    pub process_isolation: bool,
    /// Per-test time limit in seconds.
    pub default_time_limit: Option<u64>,
    /// Classify tests exceeding the time limit as risky.
    pub enforce_time_limit: bool,

    /// Bootstrap script run before the suite.
    pub bootstrap: Option<PathBuf>,
    /// Environment variables applied to the run and to test processes.
    pub env: BTreeMap<String, String>,
    /// Entries prepended to the search path, in order.
    pub path_prefix: Vec<PathBuf>,

    /// Non-fatal warnings accumulated across loading and resolution.
    pub warnings: Vec<String>,
    /// The configuration file this run was resolved from, when any.
    pub config_file: Option<PathBuf>,
}

/// CLI-over-file-over-default fold for valued options.
fn select<T: Clone>(cli: Option<&T>, file: Option<&T>, default: T) -> T {
    cli.or(file).cloned().unwrap_or(default)
}

/// CLI-over-file fold for presence-only switches: the switch cannot be
/// negated from the command line, so absence falls through to the file.
fn select_switch(cli: bool, file: Option<bool>) -> bool {
    cli || file.unwrap_or(false)
}

/// Per-format target fold: CLI paths are used verbatim, file paths are
/// interpreted relative to the configuration file's directory.
fn select_target(cli: Option<&PathBuf>, file: Option<&PathBuf>, base_dir: &Path) -> Option<PathBuf> {
    cli.cloned().or_else(|| file.map(|p| base_dir.join(p)))
}

/// Merge CLI and file configuration into one immutable snapshot.
///
/// Total unless a referenced path is unusable. Two calls with identical
/// inputs produce field-for-field identical snapshots, except the random
/// seed default, which is wall-clock derived by design.
///
/// # Errors
///
/// - [`Error::TestPathNotFound`] when the positional test path does not
///   exist.
/// - [`Error::PathResolution`] when a cache directory cannot be created.
/// - [`Error::BootstrapUnreadable`] when the bootstrap script cannot be
///   read.
pub fn resolve(cli: &CliOptions, file: &FileConfig) -> Result<ResolvedConfig> {
    let base_dir = match file.loaded_from.as_ref().and_then(|p| p.parent()) {
        Some(parent) => parent.to_path_buf(),
        None => std::env::current_dir()?,
    };

    let mut warnings = file.warnings.clone();

    let test_suffixes = select(
        cli.test_suffixes.as_ref(),
        file.run.test_suffixes.as_ref(),
        DEFAULT_SUFFIXES.iter().map(ToString::to_string).collect(),
    );

    let suite = resolve_suite(cli, file, &test_suffixes, &base_dir)?;
    let (include_groups, exclude_groups) = resolve_groups(cli, file);
    let caches = resolve_caches(cli, file, &base_dir)?;
    let (columns, too_few_columns) = resolve_columns(cli, file, &mut warnings);

    let bootstrap = resolve_bootstrap(cli, file, &base_dir)?;

    if cli.debug && std::env::var_os(SELFTEST_MARKER).is_none() {
        warnings.push("The --debug option is deprecated".to_string());
    }

    let mut env = file.runtime.env.clone();
    for (key, value) in &cli.runtime_env {
        env.insert(key.clone(), value.clone());
    }
    let mut path_prefix = cli.path_prefix.clone().unwrap_or_default();
    path_prefix.extend(file.runtime.path_prefix.iter().map(|p| base_dir.join(p)));

    let reporter = if cli.ci_reporter {
        ReporterKind::Ci
    } else if cli.doc_reporter {
        ReporterKind::Doc
    } else {
        ReporterKind::Default
    };

    let execution_order = select(
        cli.execution_order.as_ref(),
        file.run.order_by.as_ref(),
        ExecutionOrder::Default,
    );
    // An explicit CLI ordering suppresses the file's defects-first request.
    let defects_first = if cli.execution_order.is_some() || cli.defects_first.is_some() {
        cli.defects_first.unwrap_or(false)
    } else {
        file.run.defects_first.unwrap_or(false)
    };

    let random_seed = match cli.random_seed {
        Some(seed) => seed,
        None => wall_clock_seed(),
    };

    let mut resolved = ResolvedConfig {
        suite,
        test_suffixes,
        include_groups,
        exclude_groups,

        cache_directory: caches.cache_directory,
        coverage_cache_directory: caches.coverage_cache_directory,
        result_cache_file: caches.result_cache_file,
        cache_results: select(cli.cache_results.as_ref(), file.run.cache_results.as_ref(), true),

        coverage_clover: None,
        coverage_cobertura: None,
        coverage_complexity: None,
        coverage_html: None,
        coverage_json: None,
        coverage_text: None,
        coverage_xml: None,

        log_text: None,
        log_junit: None,
        log_events: None,
        doc_text: None,
        doc_html: None,
        doc_xml: None,

        reporter,
        execution_order,
        defects_first,
        random_seed,

        stop_on_defect: select_switch(cli.stop_on_defect, file.run.stop_on_defect),
        stop_on_error: select_switch(cli.stop_on_error, file.run.stop_on_error),
        stop_on_failure: select_switch(cli.stop_on_failure, file.run.stop_on_failure),
        stop_on_warning: select_switch(cli.stop_on_warning, file.run.stop_on_warning),
        stop_on_risky: select_switch(cli.stop_on_risky, file.run.stop_on_risky),
        stop_on_skipped: select_switch(cli.stop_on_skipped, file.run.stop_on_skipped),
        stop_on_incomplete: select_switch(cli.stop_on_incomplete, file.run.stop_on_incomplete),

        fail_on_empty_test_suite: select_switch(
            cli.fail_on_empty_test_suite,
            file.run.fail_on_empty_test_suite,
        ),
        fail_on_warning: select_switch(cli.fail_on_warning, file.run.fail_on_warning),
        fail_on_risky: select_switch(cli.fail_on_risky, file.run.fail_on_risky),
        fail_on_skipped: select_switch(cli.fail_on_skipped, file.run.fail_on_skipped),
        fail_on_incomplete: select_switch(cli.fail_on_incomplete, file.run.fail_on_incomplete),

        columns,
        too_few_columns,
        colors: resolve_colors(cli, file, stdout_supports_color()),
        verbose: cli.verbose,
        debug: cli.debug,

        process_isolation: select_switch(cli.process_isolation, file.run.process_isolation),
        default_time_limit: cli
            .default_time_limit
            .or(file.run.default_time_limit),
        enforce_time_limit: select_switch(cli.enforce_time_limit, file.run.enforce_time_limit),

        bootstrap,
        env,
        path_prefix,

        warnings,
        config_file: file.loaded_from.clone(),
    };

    resolve_coverage(&mut resolved, cli, file, &base_dir);
    resolve_logging(&mut resolved, cli, file, &base_dir);

    tracing::debug!(
        suite = %resolved.suite.name,
        tests = resolved.suite.len(),
        warnings = resolved.warnings.len(),
        "configuration resolved"
    );
    Ok(resolved)
}

fn resolve_suite(
    cli: &CliOptions,
    file: &FileConfig,
    suffixes: &[String],
    base_dir: &Path,
) -> Result<TestSuite> {
    if let Some(path) = &cli.test_path {
        return suite::discover_path(path, suffixes);
    }

    let include: Vec<String> = cli
        .include_suites
        .clone()
        .unwrap_or_else(|| file.run.default_suite.iter().cloned().collect());
    let exclude: Vec<String> = cli
        .exclude_suites
        .clone()
        .unwrap_or_else(|| file.run.exclude_suite.iter().cloned().collect());

    suite::from_definitions(&file.suites, &include, &exclude, suffixes, base_dir)
}

/// Exclude-group normalization: a group present in both lists is included,
/// not excluded.
fn resolve_groups(cli: &CliOptions, file: &FileConfig) -> (Vec<String>, Vec<String>) {
    let include = select(
        cli.include_groups.as_ref(),
        Some(&file.groups.include),
        Vec::new(),
    );
    let mut exclude = select(
        cli.exclude_groups.as_ref(),
        Some(&file.groups.exclude),
        Vec::new(),
    );
    exclude.retain(|g| !include.contains(g));
    (include, exclude)
}

struct ResolvedCaches {
    cache_directory: Option<PathBuf>,
    coverage_cache_directory: Option<PathBuf>,
    result_cache_file: PathBuf,
}

/// Cache-path derivation chain.
///
/// A resolved cache directory provides both derived paths. Without one, the
/// coverage cache falls back to an explicit CLI-or-file path, and the result
/// cache file falls back through: explicit path, next to the configuration
/// file, next to the running executable, bare relative filename.
fn resolve_caches(cli: &CliOptions, file: &FileConfig, base_dir: &Path) -> Result<ResolvedCaches> {
    let cache_directory = if let Some(dir) = &cli.cache_directory {
        create_cache_dir(dir, "cache-directory")?;
        Some(dir.clone())
    } else if let Some(dir) = &file.run.cache_directory {
        let dir = base_dir.join(dir);
        create_cache_dir(&dir, "run.cache_directory")?;
        Some(dir)
    } else {
        None
    };

    if let Some(dir) = &cache_directory {
        return Ok(ResolvedCaches {
            coverage_cache_directory: Some(dir.join("coverage")),
            result_cache_file: dir.join("results"),
            cache_directory,
        });
    }

    let coverage_cache_directory = select_target(
        cli.coverage_cache_directory.as_ref(),
        file.coverage.cache_directory.as_ref(),
        base_dir,
    );

    let result_cache_file = select_target(
        cli.result_cache_file.as_ref(),
        file.run.result_cache_file.as_ref(),
        base_dir,
    )
    .or_else(|| {
        file.loaded_from
            .as_ref()
            .and_then(|p| p.parent())
            .map(|dir| dir.join(RESULT_CACHE_FILENAME))
    })
    .or_else(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|dir| dir.join(RESULT_CACHE_FILENAME)))
    })
    .unwrap_or_else(|| PathBuf::from(RESULT_CACHE_FILENAME));

    Ok(ResolvedCaches {
        cache_directory: None,
        coverage_cache_directory,
        result_cache_file,
    })
}

fn create_cache_dir(dir: &Path, option: &'static str) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| Error::PathResolution {
        option,
        path: dir.to_path_buf(),
        source,
    })
}

/// Column resolution with the narrow-terminal clamp.
fn resolve_columns(
    cli: &CliOptions,
    file: &FileConfig,
    warnings: &mut Vec<String>,
) -> (u16, bool) {
    let requested = match cli.columns {
        Some(Columns::Max) => terminal_width().unwrap_or(DEFAULT_COLUMNS),
        Some(Columns::Count(n)) => n,
        None => file.run.columns.unwrap_or(DEFAULT_COLUMNS),
    };

    if requested < MIN_COLUMNS {
        warnings.push(format!(
            "Less than {MIN_COLUMNS} columns requested, number of columns set to {MIN_COLUMNS}"
        ));
        (MIN_COLUMNS, true)
    } else {
        (requested, false)
    }
}

fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(terminal_size::Width(w), _)| w)
}

/// Color cascade: CLI mode wins outright; the file is only consulted when
/// the command line is silent; `auto` defers to the stream probe.
fn resolve_colors(cli: &CliOptions, file: &FileConfig, supported: bool) -> bool {
    match cli.colors.or(file.run.colors) {
        Some(ColorMode::Always) => true,
        Some(ColorMode::Auto) => supported,
        Some(ColorMode::Never) | None => false,
    }
}

fn stdout_supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn resolve_bootstrap(
    cli: &CliOptions,
    file: &FileConfig,
    base_dir: &Path,
) -> Result<Option<PathBuf>> {
    let Some(path) = select_target(cli.bootstrap.as_ref(), file.run.bootstrap.as_ref(), base_dir)
    else {
        return Ok(None);
    };
    if fs::File::open(&path).is_err() {
        return Err(Error::BootstrapUnreadable(path));
    }
    Ok(Some(path))
}

/// Coverage targets: suppressed entirely by `--no-coverage`, otherwise each
/// format resolves independently. The HTML bounds, complexity threshold and
/// text display flags are file-sourced only.
fn resolve_coverage(
    resolved: &mut ResolvedConfig,
    cli: &CliOptions,
    file: &FileConfig,
    base_dir: &Path,
) {
    if cli.no_coverage {
        return;
    }
    let report = &file.coverage.report;

    resolved.coverage_clover = select_target(
        cli.coverage_clover.as_ref(),
        report.clover.as_ref().map(|r| &r.target),
        base_dir,
    );
    resolved.coverage_cobertura = select_target(
        cli.coverage_cobertura.as_ref(),
        report.cobertura.as_ref().map(|r| &r.target),
        base_dir,
    );
    resolved.coverage_complexity = select_target(
        cli.coverage_complexity.as_ref(),
        report.complexity.as_ref().and_then(|r| r.target.as_ref()),
        base_dir,
    )
    .map(|target| ResolvedComplexityReport {
        target,
        threshold: report
            .complexity
            .as_ref()
            .and_then(|r| r.threshold)
            .unwrap_or(DEFAULT_COMPLEXITY_THRESHOLD),
    });
    resolved.coverage_html = select_target(
        cli.coverage_html.as_ref(),
        report.html.as_ref().map(|r| &r.target),
        base_dir,
    )
    .map(|target| ResolvedHtmlReport {
        target,
        low_upper_bound: report
            .html
            .as_ref()
            .and_then(|r| r.low_upper_bound)
            .unwrap_or(DEFAULT_HTML_BOUNDS.0),
        high_lower_bound: report
            .html
            .as_ref()
            .and_then(|r| r.high_lower_bound)
            .unwrap_or(DEFAULT_HTML_BOUNDS.1),
    });
    resolved.coverage_json = select_target(
        cli.coverage_json.as_ref(),
        report.json.as_ref().map(|r| &r.target),
        base_dir,
    );
    resolved.coverage_text = select_target(
        cli.coverage_text.as_ref(),
        report.text.as_ref().map(|r| &r.target),
        base_dir,
    )
    .map(|target| ResolvedTextReport {
        target,
        show_uncovered_files: report
            .text
            .as_ref()
            .and_then(|r| r.show_uncovered_files)
            .unwrap_or(false),
        show_only_summary: report
            .text
            .as_ref()
            .and_then(|r| r.show_only_summary)
            .unwrap_or(false),
    });
    resolved.coverage_xml = select_target(
        cli.coverage_xml.as_ref(),
        report.xml.as_ref().map(|r| &r.target),
        base_dir,
    );
}

/// Logging targets: suppressed entirely by `--no-logging`; the file side is
/// only consulted when logging is active.
fn resolve_logging(
    resolved: &mut ResolvedConfig,
    cli: &CliOptions,
    file: &FileConfig,
    base_dir: &Path,
) {
    if cli.no_logging {
        return;
    }
    let logging = &file.logging;

    resolved.log_text = select_target(
        cli.log_text.as_ref(),
        logging.text.as_ref().map(|r| &r.target),
        base_dir,
    );
    resolved.log_junit = select_target(
        cli.log_junit.as_ref(),
        logging.junit.as_ref().map(|r| &r.target),
        base_dir,
    );
    resolved.log_events = select_target(
        cli.log_events.as_ref(),
        logging.events.as_ref().map(|r| &r.target),
        base_dir,
    );
    resolved.doc_text = select_target(
        cli.doc_text.as_ref(),
        logging.doc_text.as_ref().map(|r| &r.target),
        base_dir,
    );
    resolved.doc_html = select_target(
        cli.doc_html.as_ref(),
        logging.doc_html.as_ref().map(|r| &r.target),
        base_dir,
    );
    resolved.doc_xml = select_target(
        cli.doc_xml.as_ref(),
        logging.doc_xml.as_ref().map(|r| &r.target),
        base_dir,
    );
}

fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
