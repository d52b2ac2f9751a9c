//! # CLI Structure and Argument Parsing
//!
//! The command-line surface of `attest`, built with `clap` derive macros.
//! Unlike subcommand-style tools, `attest` is flag-driven: one optional
//! positional test path plus options, several of which are early-exit
//! commands that replace the normal run sequence.
//!
//! ## Usage Patterns
//!
//! ```bash
//! # Run a directory of script tests
//! attest tests/
//!
//! # Run the suites declared in attest.toml
//! attest --suite unit
//!
//! # Policy and ordering
//! attest tests/ --fail-on-warning --order-by random --random-seed 42
//!
//! # Early-exit commands
//! attest --list-tests --suite unit
//! attest --generate-configuration
//! attest --migrate-configuration
//! ```
//!
//! The parsed [`Cli`] is converted into the core crate's
//! [`CliOptions`] by [`Cli::to_options`]; the conversion is where
//! `--order-by`, `--columns` and `--colors` values are validated, so an
//! unrecognized ordering option surfaces as a user-input error after the
//! earlier early-exit commands have had their chance to dispatch.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::bail;
use clap::Parser;

use attest_core::{CliOptions, ColorMode, Columns, ExecutionOrder};

/// Main CLI structure for the `attest` command.
#[derive(Parser, Clone, Debug)]
#[command(name = "attest")]
#[command(version)]
#[command(about = "attest - test-execution orchestrator for script test suites", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Test file or directory to run (bypasses suite definitions)
    #[arg(value_name = "PATH")]
    pub test_path: Option<PathBuf>,

    /// Configuration file, or a directory to search for one. Also via `ATTEST_CONFIG`.
    #[arg(short = 'c', long, value_name = "FILE", env = "ATTEST_CONFIG")]
    pub configuration: Option<PathBuf>,

    /// Ignore default configuration file discovery
    #[arg(long)]
    pub no_configuration: bool,

    /// Script run before the test suite
    #[arg(long, value_name = "FILE")]
    pub bootstrap: Option<PathBuf>,

    /// Only run the named suite(s)
    #[arg(long = "suite", value_name = "NAME", value_delimiter = ',')]
    pub suite: Option<Vec<String>>,

    /// Exclude the named suite(s)
    #[arg(long = "exclude-suite", value_name = "NAME", value_delimiter = ',')]
    pub exclude_suite: Option<Vec<String>>,

    /// Only run tests from the named group(s)
    #[arg(long = "group", value_name = "GROUP", value_delimiter = ',')]
    pub group: Option<Vec<String>>,

    /// Exclude tests from the named group(s)
    #[arg(long = "exclude-group", value_name = "GROUP", value_delimiter = ',')]
    pub exclude_group: Option<Vec<String>>,

    /// Filename suffix(es) collected by directory discovery
    #[arg(long = "test-suffix", value_name = "SUFFIX", value_delimiter = ',')]
    pub test_suffix: Option<Vec<String>>,

    /// Directory for derived caches
    #[arg(long, value_name = "DIR")]
    pub cache_directory: Option<PathBuf>,

    /// Directory for the coverage cache
    #[arg(long, value_name = "DIR")]
    pub coverage_cache_directory: Option<PathBuf>,

    /// File the test results are cached in
    #[arg(long, value_name = "FILE")]
    pub result_cache_file: Option<PathBuf>,

    /// Cache test results between runs
    #[arg(long, overrides_with = "do_not_cache_results")]
    pub cache_results: bool,

    /// Do not cache test results between runs
    #[arg(long, overrides_with = "cache_results")]
    pub do_not_cache_results: bool,

    /// Disable all coverage report targets
    #[arg(long)]
    pub no_coverage: bool,

    /// Write Clover coverage report to FILE
    #[arg(long, value_name = "FILE")]
    pub coverage_clover: Option<PathBuf>,

    /// Write Cobertura coverage report to FILE
    #[arg(long, value_name = "FILE")]
    pub coverage_cobertura: Option<PathBuf>,

    /// Write complexity-risk coverage report to FILE
    #[arg(long, value_name = "FILE")]
    pub coverage_complexity: Option<PathBuf>,

    /// Write HTML coverage report to DIR
    #[arg(long, value_name = "DIR")]
    pub coverage_html: Option<PathBuf>,

    /// Write JSON coverage snapshot to FILE
    #[arg(long, value_name = "FILE")]
    pub coverage_json: Option<PathBuf>,

    /// Write text coverage report to FILE
    #[arg(long, value_name = "FILE")]
    pub coverage_text: Option<PathBuf>,

    /// Write per-file XML coverage report to DIR
    #[arg(long, value_name = "DIR")]
    pub coverage_xml: Option<PathBuf>,

    /// Disable all logging targets
    #[arg(long)]
    pub no_logging: bool,

    /// Write plain text log to FILE
    #[arg(long, value_name = "FILE")]
    pub log_text: Option<PathBuf>,

    /// Write JUnit XML report to FILE
    #[arg(long, value_name = "FILE")]
    pub log_junit: Option<PathBuf>,

    /// Write JSON-lines event log to FILE
    #[arg(long, value_name = "FILE")]
    pub log_events: Option<PathBuf>,

    /// Write documentation-style text report to FILE
    #[arg(long, value_name = "FILE")]
    pub doc_text: Option<PathBuf>,

    /// Write documentation-style HTML report to FILE
    #[arg(long, value_name = "FILE")]
    pub doc_html: Option<PathBuf>,

    /// Write documentation-style XML report to FILE
    #[arg(long, value_name = "FILE")]
    pub doc_xml: Option<PathBuf>,

    /// Report progress as CI service messages
    #[arg(long)]
    pub ci: bool,

    /// Report progress documentation-style
    #[arg(long)]
    pub doc: bool,

    /// Run order: default, defects, duration, random, reverse (comma-separated)
    #[arg(long, value_name = "ORDER")]
    pub order_by: Option<String>,

    /// Seed for random test order
    #[arg(long, value_name = "SEED")]
    pub random_seed: Option<u64>,

    /// Stop after the first error or failure
    #[arg(long)]
    pub stop_on_defect: bool,
    /// Stop after the first error
    #[arg(long)]
    pub stop_on_error: bool,
    /// Stop after the first failure
    #[arg(long)]
    pub stop_on_failure: bool,
    /// Stop after the first warning
    #[arg(long)]
    pub stop_on_warning: bool,
    /// Stop after the first risky test
    #[arg(long)]
    pub stop_on_risky: bool,
    /// Stop after the first skipped test
    #[arg(long)]
    pub stop_on_skipped: bool,
    /// Stop after the first incomplete test
    #[arg(long)]
    pub stop_on_incomplete: bool,

    /// Fail when the suite contains no tests
    #[arg(long)]
    pub fail_on_empty_test_suite: bool,
    /// Fail when a test emits a warning
    #[arg(long)]
    pub fail_on_warning: bool,
    /// Fail when a test is risky
    #[arg(long)]
    pub fail_on_risky: bool,
    /// Fail when a test is skipped
    #[arg(long)]
    pub fail_on_skipped: bool,
    /// Fail when a test is incomplete
    #[arg(long)]
    pub fail_on_incomplete: bool,

    /// Output width: a number of columns, or "max" for the terminal width
    #[arg(long, value_name = "COLUMNS")]
    pub columns: Option<String>,

    /// Use ANSI colors: never, auto, always
    #[arg(
        long,
        value_name = "WHEN",
        num_args = 0..=1,
        default_missing_value = "auto"
    )]
    pub colors: Option<String>,

    /// Verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Debug output
    #[arg(long)]
    pub debug: bool,

    /// Run each test in an isolated child process
    #[arg(long)]
    pub process_isolation: bool,

    /// Per-test time limit in seconds
    #[arg(long, value_name = "SECS")]
    pub default_time_limit: Option<u64>,

    /// Classify tests exceeding the time limit as risky
    #[arg(long)]
    pub enforce_time_limit: bool,

    /// Set an environment directive KEY=VALUE for the run
    #[arg(short = 'd', value_name = "KEY=VALUE")]
    pub define: Vec<String>,

    /// Prepend PATHS (colon-separated) to the search path
    #[arg(long, value_name = "PATHS")]
    pub include_path: Option<String>,

    /// Write a configuration file template and exit
    #[arg(long)]
    pub generate_configuration: bool,

    /// Rewrite a legacy configuration file to the current schema and exit
    #[arg(long)]
    pub migrate_configuration: bool,

    /// Exit successfully when this version of attest is at least VERSION
    #[arg(long, value_name = "VERSION")]
    pub at_least_version: Option<String>,

    /// Check whether a newer version of attest is available and exit
    #[arg(long)]
    pub check_version: bool,

    /// List the groups of the selected suite and exit
    #[arg(long)]
    pub list_groups: bool,

    /// List the suites defined in the configuration file and exit
    #[arg(long)]
    pub list_suites: bool,

    /// List the tests of the selected suite and exit
    #[arg(long)]
    pub list_tests: bool,

    /// Write an XML listing of the selected suite to FILE and exit
    #[arg(long, value_name = "FILE")]
    pub list_tests_xml: Option<PathBuf>,

    /// Create the coverage cache directory tree and exit
    #[arg(long)]
    pub warm_coverage_cache: bool,
}

impl Cli {
    /// Convert the parsed arguments into the core crate's sparse option set.
    ///
    /// # Errors
    ///
    /// Fails on an unrecognized `--order-by`, `--columns` or `--colors`
    /// value; the caller reports these as user-input errors.
    pub fn to_options(&self) -> anyhow::Result<CliOptions> {
        let (execution_order, defects_first) = parse_order_by(self.order_by.as_deref())?;

        let columns = self
            .columns
            .as_deref()
            .map(Columns::from_str)
            .transpose()?;
        let colors = self
            .colors
            .as_deref()
            .map(ColorMode::from_str)
            .transpose()?;

        let cache_results = match (self.cache_results, self.do_not_cache_results) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };

        let runtime_env = self
            .define
            .iter()
            .map(|directive| {
                let (key, value) = directive
                    .split_once('=')
                    .unwrap_or((directive.as_str(), ""));
                (key.to_string(), value.to_string())
            })
            .collect();

        let path_prefix = self
            .include_path
            .as_ref()
            .map(|raw| std::env::split_paths(raw).collect());

        Ok(CliOptions {
            test_path: self.test_path.clone(),
            configuration: self.configuration.clone(),
            no_configuration: self.no_configuration,
            bootstrap: self.bootstrap.clone(),
            include_suites: self.suite.clone(),
            exclude_suites: self.exclude_suite.clone(),
            include_groups: self.group.clone(),
            exclude_groups: self.exclude_group.clone(),
            test_suffixes: self.test_suffix.clone(),
            cache_directory: self.cache_directory.clone(),
            coverage_cache_directory: self.coverage_cache_directory.clone(),
            result_cache_file: self.result_cache_file.clone(),
            cache_results,
            no_coverage: self.no_coverage,
            coverage_clover: self.coverage_clover.clone(),
            coverage_cobertura: self.coverage_cobertura.clone(),
            coverage_complexity: self.coverage_complexity.clone(),
            coverage_html: self.coverage_html.clone(),
            coverage_json: self.coverage_json.clone(),
            coverage_text: self.coverage_text.clone(),
            coverage_xml: self.coverage_xml.clone(),
            no_logging: self.no_logging,
            log_text: self.log_text.clone(),
            log_junit: self.log_junit.clone(),
            log_events: self.log_events.clone(),
            doc_text: self.doc_text.clone(),
            doc_html: self.doc_html.clone(),
            doc_xml: self.doc_xml.clone(),
            ci_reporter: self.ci,
            doc_reporter: self.doc,
            execution_order,
            defects_first,
            random_seed: self.random_seed,
            stop_on_defect: self.stop_on_defect,
            stop_on_error: self.stop_on_error,
            stop_on_failure: self.stop_on_failure,
            stop_on_warning: self.stop_on_warning,
            stop_on_risky: self.stop_on_risky,
            stop_on_skipped: self.stop_on_skipped,
            stop_on_incomplete: self.stop_on_incomplete,
            fail_on_empty_test_suite: self.fail_on_empty_test_suite,
            fail_on_warning: self.fail_on_warning,
            fail_on_risky: self.fail_on_risky,
            fail_on_skipped: self.fail_on_skipped,
            fail_on_incomplete: self.fail_on_incomplete,
            columns,
            colors,
            verbose: self.verbose,
            debug: self.debug,
            process_isolation: self.process_isolation,
            default_time_limit: self.default_time_limit,
            enforce_time_limit: self.enforce_time_limit,
            runtime_env,
            path_prefix,
        })
    }
}

/// Parse the comma-separated `--order-by` value.
///
/// `defects` composes with any base order; everything else replaces it.
fn parse_order_by(
    raw: Option<&str>,
) -> anyhow::Result<(Option<ExecutionOrder>, Option<bool>)> {
    let Some(raw) = raw else {
        return Ok((None, None));
    };
    let mut execution_order = None;
    let mut defects_first = None;
    for token in raw.split(',') {
        match token.trim() {
            "default" => execution_order = Some(ExecutionOrder::Default),
            "duration" => execution_order = Some(ExecutionOrder::Duration),
            "random" => execution_order = Some(ExecutionOrder::Random),
            "reverse" => execution_order = Some(ExecutionOrder::Reverse),
            "defects" => defects_first = Some(true),
            other => bail!("unrecognized --order-by option: {other}"),
        }
    }
    Ok((execution_order, defects_first))
}
