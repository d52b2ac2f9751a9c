//! Suite execution: running script tests and summarizing their outcomes.
//!
//! Each test is a script run through `/bin/sh` in its own child process.
//! The exit status classifies the outcome; everything the exit-code policy
//! needs is accumulated into a [`RunSummary`].
//!
//! The executor honors the resolved execution order (defects- and
//! duration-based ordering read the result cache, random ordering uses the
//! resolved seed), the stop-on-* flags, and the group filters. Process
//! isolation and the per-test time limit are resolved values plumbed
//! through from the configuration.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::options::ExecutionOrder;
use crate::resolve::ResolvedConfig;
use crate::suite::{TestCase, TestSuite};

/// Classification of one test's outcome.
///
/// Script tests communicate their outcome through the exit status; see
/// [`TestStatus::from_exit_status`] for the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// The test passed.
    Passed,
    /// An assertion failed.
    Failed,
    /// The test could not run to completion.
    Errored,
    /// The test skipped itself.
    Skipped,
    /// The test declared itself incomplete.
    Incomplete,
    /// The test passed but was not harmless.
    Risky,
    /// The test passed with a warning.
    Warning,
}

impl TestStatus {
    /// Map a child process exit status to a test outcome.
    ///
    /// `0` pass, `1` fail, `2` error, `3` skip, `4` incomplete, `5` risky,
    /// `6` warning. Anything else, including death by signal, is an error.
    #[must_use]
    pub const fn from_exit_status(code: Option<i32>) -> Self {
        match code {
            Some(0) => Self::Passed,
            Some(1) => Self::Failed,
            Some(3) => Self::Skipped,
            Some(4) => Self::Incomplete,
            Some(5) => Self::Risky,
            Some(6) => Self::Warning,
            _ => Self::Errored,
        }
    }

    /// Whether the outcome counts as a defect for ordering and stopping.
    #[must_use]
    pub const fn is_defect(self) -> bool {
        matches!(self, Self::Errored | Self::Failed | Self::Risky | Self::Warning)
    }

    /// Lowercase status name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Errored => "errored",
            Self::Skipped => "skipped",
            Self::Incomplete => "incomplete",
            Self::Risky => "risky",
            Self::Warning => "warning",
        }
    }
}

/// The recorded result of one executed test.
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    /// Test display name.
    pub name: String,
    /// Outcome classification.
    pub status: TestStatus,
    /// Wall-clock duration of the child process.
    #[serde(skip)]
    pub duration: Duration,
    /// Captured stdout and stderr.
    pub output: String,
}

/// Aggregated result of one suite execution.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of tests executed.
    pub tests_run: usize,
    /// Tests that errored.
    pub errors: usize,
    /// Tests that failed.
    pub failures: usize,
    /// Tests that emitted warnings.
    pub warnings: usize,
    /// Tests that were risky.
    pub risky: usize,
    /// Tests that skipped themselves.
    pub skipped: usize,
    /// Tests that declared themselves incomplete.
    pub incomplete: usize,
    /// Wall-clock duration of the whole run.
    pub duration: Duration,
    /// Individual outcomes, in execution order.
    pub outcomes: Vec<TestOutcome>,
}

impl RunSummary {
    /// Record one outcome, updating the counters.
    pub fn record(&mut self, outcome: TestOutcome) {
        self.tests_run += 1;
        match outcome.status {
            TestStatus::Passed => {},
            TestStatus::Failed => self.failures += 1,
            TestStatus::Errored => self.errors += 1,
            TestStatus::Skipped => self.skipped += 1,
            TestStatus::Incomplete => self.incomplete += 1,
            TestStatus::Risky => self.risky += 1,
            TestStatus::Warning => self.warnings += 1,
        }
        self.outcomes.push(outcome);
    }

    /// Whether the run finished without errors, failures, or warnings.
    #[must_use]
    pub const fn was_successful(&self) -> bool {
        self.was_successful_ignoring_warnings() && self.warnings == 0
    }

    /// Whether the run finished without errors or failures.
    #[must_use]
    pub const fn was_successful_ignoring_warnings(&self) -> bool {
        self.errors == 0 && self.failures == 0
    }
}

/// One cached result of a previous run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CachedResult {
    /// Whether the test was defective (errored or failed).
    pub defective: bool,
    /// Duration of the previous execution, milliseconds.
    pub duration_ms: u64,
}

/// Persisted per-test results from previous runs.
///
/// Consumed by defects-first and duration-based ordering; written back when
/// result caching is enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultCache {
    /// Cached result per test name.
    #[serde(default)]
    pub entries: BTreeMap<String, CachedResult>,
}

impl ResultCache {
    /// Load the cache from disk; a missing or unreadable cache is empty.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Record the outcome of one test.
    pub fn record(&mut self, outcome: &TestOutcome) {
        self.entries.insert(
            outcome.name.clone(),
            CachedResult {
                defective: matches!(outcome.status, TestStatus::Errored | TestStatus::Failed),
                duration_ms: u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
            },
        );
    }

    /// Write the cache to disk, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string(self)
            .map_err(|e| crate::error::Error::Config(format!("result cache: {e}")))?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// A strategy that executes a suite under a resolved configuration.
pub trait TestExecutor {
    /// Execute the suite, reporting each outcome through `observer` as it
    /// lands.
    fn execute(
        &mut self,
        suite: &TestSuite,
        config: &ResolvedConfig,
        observer: &mut dyn FnMut(&TestOutcome),
    ) -> Result<RunSummary>;
}

/// Executes each script test in its own `/bin/sh` child process.
#[derive(Debug, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    /// Create a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TestExecutor for ProcessExecutor {
    fn execute(
        &mut self,
        suite: &TestSuite,
        config: &ResolvedConfig,
        observer: &mut dyn FnMut(&TestOutcome),
    ) -> Result<RunSummary> {
        let mut cache = ResultCache::load(&config.result_cache_file);
        let mut cases =
            filter_by_groups(&suite.tests, &config.include_groups, &config.exclude_groups);
        order_cases(&mut cases, config, &cache);

        let path_env = prefixed_path(&config.path_prefix);
        let started = Instant::now();
        let mut summary = RunSummary::default();

        for case in &cases {
            let outcome = run_case(case, config, path_env.as_deref());
            observer(&outcome);
            cache.record(&outcome);
            let status = outcome.status;
            summary.record(outcome);
            if should_stop(status, config) {
                tracing::debug!(test = %case.name, ?status, "stopping early");
                break;
            }
        }

        summary.duration = started.elapsed();

        if config.cache_results {
            if let Err(err) = cache.save(&config.result_cache_file) {
                tracing::warn!(
                    path = %config.result_cache_file.display(),
                    "failed to persist result cache: {err}"
                );
            }
        }

        Ok(summary)
    }
}

/// Apply the resolved group filters.
///
/// With a non-empty include set only member tests run; the exclude set then
/// removes its members. The include set has already had precedence applied
/// by the resolver.
fn filter_by_groups(
    tests: &[TestCase],
    include: &[String],
    exclude: &[String],
) -> Vec<TestCase> {
    tests
        .iter()
        .filter(|t| include.is_empty() || t.groups.iter().any(|g| include.contains(g)))
        .filter(|t| !t.groups.iter().any(|g| exclude.contains(g)))
        .cloned()
        .collect()
}

fn order_cases(cases: &mut Vec<TestCase>, config: &ResolvedConfig, cache: &ResultCache) {
    match config.execution_order {
        ExecutionOrder::Default => {},
        ExecutionOrder::Reverse => cases.reverse(),
        ExecutionOrder::Random => {
            let mut rng = StdRng::seed_from_u64(config.random_seed);
            cases.shuffle(&mut rng);
        },
        ExecutionOrder::Duration => {
            cases.sort_by_key(|c| {
                cache
                    .entries
                    .get(&c.name)
                    .map_or(0, |entry| entry.duration_ms)
            });
        },
    }

    if config.defects_first {
        // Stable partition keeps the base order within each half.
        cases.sort_by_key(|c| {
            let defective = cache
                .entries
                .get(&c.name)
                .is_some_and(|entry| entry.defective);
            !defective
        });
    }
}

fn run_case(case: &TestCase, config: &ResolvedConfig, path_env: Option<&OsStr>) -> TestOutcome {
    let started = Instant::now();
    let mut command = Command::new("/bin/sh");
    command.arg(&case.path).envs(&config.env);
    if let Some(path) = path_env {
        command.env("PATH", path);
    }

    match command.output() {
        Ok(output) => {
            let duration = started.elapsed();
            let mut status = TestStatus::from_exit_status(output.status.code());
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));

            if status == TestStatus::Passed && exceeded_time_limit(config, duration) {
                status = TestStatus::Risky;
                text.push_str("test exceeded the configured time limit\n");
            }

            TestOutcome {
                name: case.name.clone(),
                status,
                duration,
                output: text,
            }
        },
        Err(err) => TestOutcome {
            name: case.name.clone(),
            status: TestStatus::Errored,
            duration: started.elapsed(),
            output: format!("failed to spawn test process: {err}\n"),
        },
    }
}

fn exceeded_time_limit(config: &ResolvedConfig, duration: Duration) -> bool {
    config.enforce_time_limit
        && config
            .default_time_limit
            .is_some_and(|limit| duration.as_secs() >= limit && limit > 0)
}

const fn should_stop(status: TestStatus, config: &ResolvedConfig) -> bool {
    match status {
        TestStatus::Passed => false,
        TestStatus::Errored => config.stop_on_error || config.stop_on_defect,
        TestStatus::Failed => config.stop_on_failure || config.stop_on_defect,
        TestStatus::Warning => config.stop_on_warning || config.stop_on_defect,
        TestStatus::Risky => config.stop_on_risky || config.stop_on_defect,
        TestStatus::Skipped => config.stop_on_skipped,
        TestStatus::Incomplete => config.stop_on_incomplete,
    }
}

fn prefixed_path(prefix: &[PathBuf]) -> Option<OsString> {
    if prefix.is_empty() {
        return None;
    }
    let current = std::env::var_os("PATH").unwrap_or_default();
    let mut paths: Vec<PathBuf> = prefix.to_vec();
    paths.extend(std::env::split_paths(&current));
    std::env::join_paths(paths).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_config::FileConfig;
    use crate::options::CliOptions;
    use crate::resolve::resolve;

    fn case(name: &str, groups: &[&str]) -> TestCase {
        TestCase {
            name: name.to_string(),
            path: PathBuf::from(name),
            groups: groups.iter().map(ToString::to_string).collect(),
        }
    }

    fn config() -> ResolvedConfig {
        let cli = CliOptions {
            random_seed: Some(1),
            cache_results: Some(false),
            ..CliOptions::default()
        };
        resolve(&cli, &FileConfig::default()).unwrap()
    }

    mod status {
        use super::*;

        #[test]
        fn test_exit_status_mapping() {
            assert_eq!(TestStatus::from_exit_status(Some(0)), TestStatus::Passed);
            assert_eq!(TestStatus::from_exit_status(Some(1)), TestStatus::Failed);
            assert_eq!(TestStatus::from_exit_status(Some(2)), TestStatus::Errored);
            assert_eq!(TestStatus::from_exit_status(Some(3)), TestStatus::Skipped);
            assert_eq!(TestStatus::from_exit_status(Some(4)), TestStatus::Incomplete);
            assert_eq!(TestStatus::from_exit_status(Some(5)), TestStatus::Risky);
            assert_eq!(TestStatus::from_exit_status(Some(6)), TestStatus::Warning);
            assert_eq!(TestStatus::from_exit_status(Some(42)), TestStatus::Errored);
            assert_eq!(TestStatus::from_exit_status(None), TestStatus::Errored);
        }
    }

    mod summary {
        use super::*;

        fn outcome(status: TestStatus) -> TestOutcome {
            TestOutcome {
                name: "t".to_string(),
                status,
                duration: Duration::from_millis(1),
                output: String::new(),
            }
        }

        #[test]
        fn test_counters_follow_status() {
            let mut summary = RunSummary::default();
            summary.record(outcome(TestStatus::Passed));
            summary.record(outcome(TestStatus::Failed));
            summary.record(outcome(TestStatus::Errored));
            summary.record(outcome(TestStatus::Warning));
            summary.record(outcome(TestStatus::Risky));
            summary.record(outcome(TestStatus::Skipped));
            summary.record(outcome(TestStatus::Incomplete));

            assert_eq!(summary.tests_run, 7);
            assert_eq!(summary.failures, 1);
            assert_eq!(summary.errors, 1);
            assert_eq!(summary.warnings, 1);
            assert_eq!(summary.risky, 1);
            assert_eq!(summary.skipped, 1);
            assert_eq!(summary.incomplete, 1);
        }

        #[test]
        fn test_success_definitions() {
            let mut summary = RunSummary::default();
            summary.record(outcome(TestStatus::Passed));
            assert!(summary.was_successful());

            summary.record(outcome(TestStatus::Warning));
            assert!(!summary.was_successful());
            assert!(summary.was_successful_ignoring_warnings());

            summary.record(outcome(TestStatus::Failed));
            assert!(!summary.was_successful_ignoring_warnings());
        }
    }

    mod groups {
        use super::*;

        #[test]
        fn test_include_keeps_members_only() {
            let tests = vec![case("a", &["fast"]), case("b", &["slow"]), case("c", &[])];
            let kept = filter_by_groups(&tests, &["fast".to_string()], &[]);
            assert_eq!(kept.len(), 1);
            assert_eq!(kept[0].name, "a");
        }

        #[test]
        fn test_exclude_removes_members() {
            let tests = vec![case("a", &["fast"]), case("b", &["slow"]), case("c", &[])];
            let kept = filter_by_groups(&tests, &[], &["slow".to_string()]);
            assert_eq!(kept.len(), 2);
        }

        #[test]
        fn test_no_filters_keep_everything() {
            let tests = vec![case("a", &[]), case("b", &[])];
            assert_eq!(filter_by_groups(&tests, &[], &[]).len(), 2);
        }
    }

    mod ordering {
        use super::*;

        fn names(cases: &[TestCase]) -> Vec<&str> {
            cases.iter().map(|c| c.name.as_str()).collect()
        }

        #[test]
        fn test_reverse_order() {
            let mut cases = vec![case("a", &[]), case("b", &[]), case("c", &[])];
            let mut config = config();
            config.execution_order = ExecutionOrder::Reverse;
            order_cases(&mut cases, &config, &ResultCache::default());
            assert_eq!(names(&cases), vec!["c", "b", "a"]);
        }

        #[test]
        fn test_random_order_is_seed_deterministic() {
            let build = || {
                vec![
                    case("a", &[]),
                    case("b", &[]),
                    case("c", &[]),
                    case("d", &[]),
                    case("e", &[]),
                ]
            };
            let mut config = config();
            config.execution_order = ExecutionOrder::Random;
            config.random_seed = 99;

            let mut first = build();
            order_cases(&mut first, &config, &ResultCache::default());
            let mut second = build();
            order_cases(&mut second, &config, &ResultCache::default());
            assert_eq!(names(&first), names(&second));
        }

        #[test]
        fn test_duration_order_puts_quick_tests_first() {
            let mut cache = ResultCache::default();
            cache.entries.insert(
                "slow".to_string(),
                CachedResult {
                    defective: false,
                    duration_ms: 900,
                },
            );
            cache.entries.insert(
                "quick".to_string(),
                CachedResult {
                    defective: false,
                    duration_ms: 5,
                },
            );

            let mut cases = vec![case("slow", &[]), case("quick", &[])];
            let mut config = config();
            config.execution_order = ExecutionOrder::Duration;
            order_cases(&mut cases, &config, &cache);
            assert_eq!(names(&cases), vec!["quick", "slow"]);
        }

        #[test]
        fn test_defects_first_is_stable() {
            let mut cache = ResultCache::default();
            cache.entries.insert(
                "b".to_string(),
                CachedResult {
                    defective: true,
                    duration_ms: 1,
                },
            );

            let mut cases = vec![case("a", &[]), case("b", &[]), case("c", &[])];
            let mut config = config();
            config.defects_first = true;
            order_cases(&mut cases, &config, &cache);
            assert_eq!(names(&cases), vec!["b", "a", "c"]);
        }
    }

    mod stopping {
        use super::*;

        #[test]
        fn test_stop_on_failure() {
            let mut config = config();
            config.stop_on_failure = true;
            assert!(should_stop(TestStatus::Failed, &config));
            assert!(!should_stop(TestStatus::Errored, &config));
        }

        #[test]
        fn test_stop_on_defect_covers_all_defects() {
            let mut config = config();
            config.stop_on_defect = true;
            assert!(should_stop(TestStatus::Failed, &config));
            assert!(should_stop(TestStatus::Errored, &config));
            assert!(should_stop(TestStatus::Risky, &config));
            assert!(should_stop(TestStatus::Warning, &config));
            assert!(!should_stop(TestStatus::Skipped, &config));
        }

        #[test]
        fn test_passed_never_stops() {
            let mut config = config();
            config.stop_on_defect = true;
            config.stop_on_error = true;
            assert!(!should_stop(TestStatus::Passed, &config));
        }
    }

    mod result_cache {
        use super::*;

        #[test]
        fn test_round_trip() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("nested/.attest.result.cache");

            let mut cache = ResultCache::default();
            cache.record(&TestOutcome {
                name: "a".to_string(),
                status: TestStatus::Failed,
                duration: Duration::from_millis(25),
                output: String::new(),
            });
            cache.save(&path).unwrap();

            let loaded = ResultCache::load(&path);
            let entry = loaded.entries.get("a").unwrap();
            assert!(entry.defective);
            assert_eq!(entry.duration_ms, 25);
        }

        #[test]
        fn test_missing_cache_is_empty() {
            let cache = ResultCache::load(Path::new("/no/such/cache"));
            assert!(cache.entries.is_empty());
        }
    }

    mod execution {
        use super::*;

        fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
            let path = dir.join(name);
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            path
        }

        fn suite_of(paths: &[PathBuf]) -> TestSuite {
            TestSuite {
                name: "exec".to_string(),
                tests: paths
                    .iter()
                    .map(|p| TestCase {
                        name: p.file_name().unwrap().to_string_lossy().into_owned(),
                        path: p.clone(),
                        groups: Vec::new(),
                    })
                    .collect(),
            }
        }

        #[test]
        fn test_executes_and_classifies() {
            let dir = tempfile::tempdir().unwrap();
            let pass = script(dir.path(), "pass_test.sh", "exit 0");
            let fail = script(dir.path(), "fail_test.sh", "exit 1");
            let skip = script(dir.path(), "skip_test.sh", "exit 3");

            let suite = suite_of(&[pass, fail, skip]);
            let mut seen = Vec::new();
            let summary = ProcessExecutor::new()
                .execute(&suite, &config(), &mut |outcome| {
                    seen.push(outcome.name.clone());
                })
                .unwrap();

            assert_eq!(summary.tests_run, 3);
            assert_eq!(summary.failures, 1);
            assert_eq!(summary.skipped, 1);
            assert_eq!(summary.errors, 0);
            assert_eq!(seen.len(), 3);
        }

        #[test]
        fn test_stop_on_failure_halts_the_run() {
            let dir = tempfile::tempdir().unwrap();
            let fail = script(dir.path(), "a_fail_test.sh", "exit 1");
            let pass = script(dir.path(), "b_pass_test.sh", "exit 0");

            let suite = suite_of(&[fail, pass]);
            let mut config = config();
            config.stop_on_failure = true;
            let summary = ProcessExecutor::new()
                .execute(&suite, &config, &mut |_| {})
                .unwrap();
            assert_eq!(summary.tests_run, 1);
        }

        #[test]
        fn test_env_reaches_test_processes() {
            let dir = tempfile::tempdir().unwrap();
            let probe = script(
                dir.path(),
                "env_test.sh",
                "[ \"$ATTEST_PROBE\" = \"yes\" ] || exit 1",
            );

            let suite = suite_of(&[probe]);
            let mut config = config();
            config
                .env
                .insert("ATTEST_PROBE".to_string(), "yes".to_string());
            let summary = ProcessExecutor::new()
                .execute(&suite, &config, &mut |_| {})
                .unwrap();
            assert_eq!(summary.failures, 0);
            assert_eq!(summary.tests_run, 1);
        }

        #[test]
        fn test_output_is_captured() {
            let dir = tempfile::tempdir().unwrap();
            let noisy = script(dir.path(), "noisy_test.sh", "echo hello; exit 0");

            let suite = suite_of(&[noisy]);
            let summary = ProcessExecutor::new()
                .execute(&suite, &config(), &mut |_| {})
                .unwrap();
            assert!(summary.outcomes[0].output.contains("hello"));
        }
    }
}
