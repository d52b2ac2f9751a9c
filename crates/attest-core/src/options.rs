//! Typed view over parsed command-line options.
//!
//! [`CliOptions`] is the sparse, presence-checked half of the configuration
//! pair consumed by the resolver: a field is `None` (or `false` for pure
//! switches) exactly when the option was not given on the command line, so
//! the resolver can tell "explicitly set" apart from "defaulted". The
//! argument tokenizer lives in the CLI crate; this type is what it produces.
//!
//! Immutable by convention: construct once per run, never mutate afterwards.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Color output mode requested on the command line or in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Never emit ANSI colors.
    Never,
    /// Emit colors when the output stream supports them.
    Auto,
    /// Always emit colors.
    Always,
}

impl FromStr for ColorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "never" => Ok(Self::Never),
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            other => Err(Error::Config(format!("unknown color mode: {other}"))),
        }
    }
}

/// Requested output width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Columns {
    /// Use the full width of the attached terminal.
    Max,
    /// Use a fixed column count.
    Count(u16),
}

impl FromStr for Columns {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "max" {
            return Ok(Self::Max);
        }
        s.parse::<u16>()
            .map(Self::Count)
            .map_err(|_| Error::Config(format!("unknown column width: {s}")))
    }
}

/// Order in which the suite's tests are executed.
///
/// Defects-first is tracked separately (see
/// [`CliOptions::defects_first`]) because it composes with any base order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionOrder {
    /// Run tests in discovery order.
    #[default]
    Default,
    /// Run the quickest tests first, using cached durations.
    Duration,
    /// Shuffle tests using the resolved random seed.
    Random,
    /// Run tests in reverse discovery order.
    Reverse,
}

/// Progress reporter flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReporterKind {
    /// Dot-per-test progress output.
    #[default]
    Default,
    /// Machine-parsable service messages for CI integration.
    Ci,
    /// Documentation-style sentences, one per test.
    Doc,
}

/// Sparse set of options parsed from the command line.
///
/// Pure switches (`--no-coverage`, `--stop-on-failure`, ...) are plain
/// `bool`s: presence is the value. Everything else is an `Option` so the
/// resolver can apply CLI-over-file precedence per option.
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct CliOptions {
    /// Positional test file or directory; short-circuits named-suite
    /// selection when present.
    pub test_path: Option<PathBuf>,

    /// Explicit configuration file (or directory to search).
    pub configuration: Option<PathBuf>,
    /// Disable default configuration-file discovery.
    pub no_configuration: bool,

    /// Bootstrap script run before the suite.
    pub bootstrap: Option<PathBuf>,

    /// Named suites to include.
    pub include_suites: Option<Vec<String>>,
    /// Named suites to exclude.
    pub exclude_suites: Option<Vec<String>>,
    /// Groups to include.
    pub include_groups: Option<Vec<String>>,
    /// Groups to exclude.
    pub exclude_groups: Option<Vec<String>>,
    /// Test filename suffixes used by directory discovery.
    pub test_suffixes: Option<Vec<String>>,

    /// Cache directory for derived caches.
    pub cache_directory: Option<PathBuf>,
    /// Explicit coverage cache directory.
    pub coverage_cache_directory: Option<PathBuf>,
    /// Explicit result cache file.
    pub result_cache_file: Option<PathBuf>,
    /// Enable or disable the result cache (`--cache-results` /
    /// `--do-not-cache-results`).
    pub cache_results: Option<bool>,

    /// Suppress all coverage report targets.
    pub no_coverage: bool,
    /// Clover coverage report target.
    pub coverage_clover: Option<PathBuf>,
    /// Cobertura coverage report target.
    pub coverage_cobertura: Option<PathBuf>,
    /// Complexity coverage report target.
    pub coverage_complexity: Option<PathBuf>,
    /// HTML coverage report target directory.
    pub coverage_html: Option<PathBuf>,
    /// JSON coverage snapshot target.
    pub coverage_json: Option<PathBuf>,
    /// Text coverage report target.
    pub coverage_text: Option<PathBuf>,
    /// XML coverage report target directory.
    pub coverage_xml: Option<PathBuf>,

    /// Suppress all logging targets.
    pub no_logging: bool,
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

    /// Use the CI-integration reporter.
    pub ci_reporter: bool,
    /// Use the documentation-style reporter.
    pub doc_reporter: bool,

    /// Base execution order named on the command line.
    pub execution_order: Option<ExecutionOrder>,
    /// Run previously defective tests first.
    pub defects_first: Option<bool>,
    /// Seed for random execution order.
    pub random_seed: Option<u64>,

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

    /// Requested output width.
    pub columns: Option<Columns>,
    /// Requested color mode.
    pub colors: Option<ColorMode>,
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

    /// Environment directives (`-d KEY=VALUE`).
    pub runtime_env: Vec<(String, String)>,
    /// Entries prepended to the search path.
    pub path_prefix: Option<Vec<PathBuf>>,
}

impl CliOptions {
    /// Whether any option that selects tests was given.
    #[must_use]
    pub const fn has_test_selection(&self) -> bool {
        self.test_path.is_some() || self.include_suites.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_mode_from_str() {
        assert_eq!("never".parse::<ColorMode>().ok(), Some(ColorMode::Never));
        assert_eq!("auto".parse::<ColorMode>().ok(), Some(ColorMode::Auto));
        assert_eq!("always".parse::<ColorMode>().ok(), Some(ColorMode::Always));
        assert!("sometimes".parse::<ColorMode>().is_err());
    }

    #[test]
    fn test_columns_from_str() {
        assert_eq!("max".parse::<Columns>().ok(), Some(Columns::Max));
        assert_eq!("96".parse::<Columns>().ok(), Some(Columns::Count(96)));
        assert!("wide".parse::<Columns>().is_err());
        assert!("-3".parse::<Columns>().is_err());
    }

    #[test]
    fn test_default_is_sparse() {
        let options = CliOptions::default();
        assert!(options.test_path.is_none());
        assert!(options.columns.is_none());
        assert!(!options.no_coverage);
        assert!(!options.has_test_selection());
    }
}
