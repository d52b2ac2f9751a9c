//! Typed view over the declarative configuration file.
//!
//! The file is TOML, loaded into [`FileConfig`] once per run. Its shape
//! mirrors the file itself: top-level run settings, a coverage sub-tree, a
//! logging sub-tree, named suite definitions, group defaults, and
//! process-runtime settings.
//!
//! Loading tolerates the pre-1.0 schema, which used camelCase keys: legacy
//! keys are honored, rewritten to their snake_case names in memory, and
//! recorded as non-fatal warnings. `--migrate-configuration` rewrites the
//! file itself.
//!
//! ## Example
//!
//! ```toml
//! [run]
//! bootstrap = "tests/bootstrap.sh"
//! cache_directory = ".attest-cache"
//! colors = "auto"
//! columns = 100
//! fail_on_warning = true
//!
//! [coverage.report.html]
//! target = "coverage/html"
//! low_upper_bound = 50
//! high_lower_bound = 90
//!
//! [logging.junit]
//! target = "reports/junit.xml"
//!
//! [[suite]]
//! name = "unit"
//! files = ["tests/smoke.t"]
//!
//! [[suite.directory]]
//! path = "tests/unit"
//! suffix = "_test.sh"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::options::{ColorMode, ExecutionOrder};

/// Top-level run settings from the `[run]` table.
///
/// Every field is optional: `None` means the file did not set the option,
/// letting the resolver fall through to the hard-coded default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Bootstrap script run before the suite.
    pub bootstrap: Option<PathBuf>,
    /// Cache directory for derived caches.
    pub cache_directory: Option<PathBuf>,
    /// Explicit result cache file.
    pub result_cache_file: Option<PathBuf>,
    /// Enable the result cache.
    pub cache_results: Option<bool>,
    /// Color mode.
    pub colors: Option<ColorMode>,
    /// Output width.
    pub columns: Option<u16>,
    /// Base execution order.
    pub order_by: Option<ExecutionOrder>,
    /// Run previously defective tests first.
    pub defects_first: Option<bool>,
    /// Run each test in an isolated child process.
    pub process_isolation: Option<bool>,
    /// Test filename suffixes used by directory discovery.
    pub test_suffixes: Option<Vec<String>>,
    /// Suite selected when the command line names none.
    pub default_suite: Option<String>,
    /// Suite excluded when the command line names none.
    pub exclude_suite: Option<String>,
    /// Per-test time limit in seconds.
    pub default_time_limit: Option<u64>,
    /// Classify tests exceeding the time limit as risky.
    pub enforce_time_limit: Option<bool>,

    /// Stop after the first error or failure.
    pub stop_on_defect: Option<bool>,
    /// Stop after the first error.
    pub stop_on_error: Option<bool>,
    /// Stop after the first failure.
    pub stop_on_failure: Option<bool>,
    /// Stop after the first warning.
    pub stop_on_warning: Option<bool>,
    /// Stop after the first risky test.
    pub stop_on_risky: Option<bool>,
    /// Stop after the first skipped test.
    pub stop_on_skipped: Option<bool>,
    /// Stop after the first incomplete test.
    pub stop_on_incomplete: Option<bool>,

    /// Fail when the suite contains no tests.
    pub fail_on_empty_test_suite: Option<bool>,
    /// Fail when any test emitted a warning.
    pub fail_on_warning: Option<bool>,
    /// Fail when any test was risky.
    pub fail_on_risky: Option<bool>,
    /// Fail when any test was skipped.
    pub fail_on_skipped: Option<bool>,
    /// Fail when any test was incomplete.
    pub fail_on_incomplete: Option<bool>,
}

/// A coverage report that only needs a target path.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportTarget {
    /// Where the report is written.
    pub target: PathBuf,
}

/// HTML coverage report settings.
///
/// The bound thresholds split line coverage into low/medium/high bands for
/// rendering; they are only configurable from the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HtmlReport {
    /// Directory the HTML report is written into.
    pub target: PathBuf,
    /// Upper bound of the "low coverage" band, percent.
    pub low_upper_bound: Option<u8>,
    /// Lower bound of the "high coverage" band, percent.
    pub high_lower_bound: Option<u8>,
}

/// Complexity-risk coverage report settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComplexityReport {
    /// Where the report is written.
    pub target: Option<PathBuf>,
    /// Complexity score above which an uncovered unit is flagged.
    pub threshold: Option<u32>,
}

/// Text coverage report settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextReport {
    /// Where the report is written.
    pub target: PathBuf,
    /// List files without coverage in the report.
    pub show_uncovered_files: Option<bool>,
    /// Render only the summary block.
    pub show_only_summary: Option<bool>,
}

/// Per-format coverage report targets from `[coverage.report.*]`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CoverageReports {
    /// Clover XML report.
    pub clover: Option<ReportTarget>,
    /// Cobertura XML report.
    pub cobertura: Option<ReportTarget>,
    /// Complexity-risk report.
    pub complexity: Option<ComplexityReport>,
    /// HTML report.
    pub html: Option<HtmlReport>,
    /// JSON coverage snapshot.
    pub json: Option<ReportTarget>,
    /// Plain text report.
    pub text: Option<TextReport>,
    /// Per-file XML report directory.
    pub xml: Option<ReportTarget>,
}

/// The `[coverage]` sub-tree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CoverageSettings {
    /// Coverage cache directory.
    pub cache_directory: Option<PathBuf>,
    /// Report targets.
    pub report: CoverageReports,
}

/// The `[logging]` sub-tree: per-format log targets.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Plain text log.
    pub text: Option<ReportTarget>,
    /// JUnit XML report.
    pub junit: Option<ReportTarget>,
    /// Structured JSON-lines event log.
    pub events: Option<ReportTarget>,
    /// Documentation-style text report.
    pub doc_text: Option<ReportTarget>,
    /// Documentation-style HTML report.
    pub doc_html: Option<ReportTarget>,
    /// Documentation-style XML report.
    pub doc_xml: Option<ReportTarget>,
}

/// A directory selector inside a suite definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DirectorySelector {
    /// Directory scanned recursively for test files.
    pub path: PathBuf,
    /// Filename suffix collected from this directory; the resolved global
    /// suffix list applies when absent.
    pub suffix: Option<String>,
    /// Group assigned to every test collected from this directory.
    pub group: Option<String>,
}

/// A named suite definition from a `[[suite]]` block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SuiteDefinition {
    /// Suite name, referenced by `--suite` / `--exclude-suite`.
    pub name: String,
    /// Directory selectors.
    #[serde(rename = "directory", default)]
    pub directories: Vec<DirectorySelector>,
    /// Individual test files.
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Paths removed from the collected set.
    #[serde(default)]
    pub exclude: Vec<PathBuf>,
    /// Group assigned to every test in this suite.
    pub group: Option<String>,
}

/// Default group filters from the `[groups]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GroupSettings {
    /// Groups included by default.
    pub include: Vec<String>,
    /// Groups excluded by default.
    pub exclude: Vec<String>,
}

/// Process-runtime settings from the `[runtime]` table.
///
/// Applied to the orchestrating process before resolution and plumbed to
/// test child processes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Environment variables set for the run.
    pub env: BTreeMap<String, String>,
    /// Entries prepended to the search path, in order.
    pub path_prefix: Vec<PathBuf>,
}

/// Typed view over the parsed declarative configuration file.
///
/// Immutable after construction. Carries provenance (`loaded_from`) and any
/// non-fatal schema warnings collected during loading. A detached default
/// instance (via `FileConfig::default()`) stands in when no file was found.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Top-level run settings.
    pub run: RunSettings,
    /// Coverage sub-tree.
    pub coverage: CoverageSettings,
    /// Logging sub-tree.
    pub logging: LoggingSettings,
    /// Named suite definitions.
    #[serde(rename = "suite")]
    pub suites: Vec<SuiteDefinition>,
    /// Default group filters.
    pub groups: GroupSettings,
    /// Process-runtime settings.
    pub runtime: RuntimeSettings,

    /// Path the configuration was loaded from, when applicable.
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
    /// Non-fatal schema warnings collected while loading.
    #[serde(skip)]
    pub warnings: Vec<String>,
}

impl FileConfig {
    /// Load a configuration file from disk.
    ///
    /// Legacy camelCase keys are normalized to the current snake_case schema
    /// in memory, each producing a non-fatal warning on the returned value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the file cannot be read, is not valid
    /// TOML, or does not match the schema.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Parse(format!("{}: {e}", path.display())))?;
        let mut value: toml::Value = content
            .parse()
            .map_err(|e| Error::Parse(format!("{}: {e}", path.display())))?;

        let mut warnings = Vec::new();
        normalize_legacy_keys(&mut value, &mut warnings);

        let mut config: Self = value
            .try_into()
            .map_err(|e| Error::Parse(format!("{}: {e}", path.display())))?;
        config.loaded_from = Some(path.to_path_buf());
        config.warnings = warnings;
        Ok(config)
    }

    /// Whether this configuration came from a file on disk.
    #[must_use]
    pub const fn was_loaded_from_file(&self) -> bool {
        self.loaded_from.is_some()
    }

    /// Look up a suite definition by name.
    #[must_use]
    pub fn suite(&self, name: &str) -> Option<&SuiteDefinition> {
        self.suites.iter().find(|s| s.name == name)
    }
}

/// Convert a legacy camelCase key to the current snake_case schema.
#[must_use]
pub fn legacy_key_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Whether a key uses the legacy camelCase convention.
#[must_use]
pub fn is_legacy_key(key: &str) -> bool {
    key.chars().any(|c| c.is_ascii_uppercase())
}

fn normalize_legacy_keys(value: &mut toml::Value, warnings: &mut Vec<String>) {
    match value {
        toml::Value::Table(table) => {
            let legacy: Vec<String> = table
                .keys()
                .filter(|k| is_legacy_key(k))
                .cloned()
                .collect();
            for key in legacy {
                let snake = legacy_key_to_snake(&key);
                warnings.push(format!(
                    "configuration key `{key}` uses the legacy schema, use `{snake}` \
                     (or run --migrate-configuration)"
                ));
                if let Some(entry) = table.remove(&key) {
                    // A current-schema key wins over its legacy spelling.
                    table.entry(snake).or_insert(entry);
                }
            }
            for (_, entry) in table.iter_mut() {
                normalize_legacy_keys(entry, warnings);
            }
        },
        toml::Value::Array(items) => {
            for item in items {
                normalize_legacy_keys(item, warnings);
            }
        },
        _ => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("attest.toml");
        fs::write(&path, content).unwrap();
        path
    }

    mod loading {
        use super::*;

        #[test]
        fn test_load_full_schema() {
            let dir = tempfile::tempdir().unwrap();
            let path = write_config(
                &dir,
                r#"
                [run]
                bootstrap = "tests/bootstrap.sh"
                cache_directory = ".attest-cache"
                colors = "auto"
                columns = 100
                order_by = "duration"
                defects_first = true
                fail_on_warning = true
                test_suffixes = ["_test.sh"]

                [coverage.report.html]
                target = "coverage/html"
                low_upper_bound = 40
                high_lower_bound = 85

                [coverage.report.complexity]
                threshold = 25

                [logging.junit]
                target = "reports/junit.xml"

                [[suite]]
                name = "unit"
                files = ["tests/smoke.t"]

                [[suite.directory]]
                path = "tests/unit"
                suffix = "_test.sh"
                group = "fast"

                [groups]
                exclude = ["slow"]

                [runtime.env]
                APP_ENV = "test"
                "#,
            );

            let config = FileConfig::load(&path).unwrap();
            assert!(config.was_loaded_from_file());
            assert_eq!(config.loaded_from.as_deref(), Some(path.as_path()));
            assert!(config.warnings.is_empty());

            assert_eq!(config.run.colors, Some(ColorMode::Auto));
            assert_eq!(config.run.columns, Some(100));
            assert_eq!(config.run.order_by, Some(ExecutionOrder::Duration));
            assert_eq!(config.run.defects_first, Some(true));
            assert_eq!(config.run.fail_on_warning, Some(true));

            let html = config.coverage.report.html.as_ref().unwrap();
            assert_eq!(html.low_upper_bound, Some(40));
            assert_eq!(html.high_lower_bound, Some(85));
            assert_eq!(
                config.coverage.report.complexity.as_ref().unwrap().threshold,
                Some(25)
            );

            let unit = config.suite("unit").unwrap();
            assert_eq!(unit.directories.len(), 1);
            assert_eq!(unit.directories[0].group.as_deref(), Some("fast"));
            assert_eq!(unit.files, vec![PathBuf::from("tests/smoke.t")]);

            assert_eq!(config.groups.exclude, vec!["slow".to_string()]);
            assert_eq!(
                config.runtime.env.get("APP_ENV").map(String::as_str),
                Some("test")
            );
        }

        #[test]
        fn test_load_missing_file_is_parse_error() {
            let err = FileConfig::load(Path::new("/nonexistent/attest.toml")).unwrap_err();
            assert!(matches!(err, Error::Parse(_)));
        }

        #[test]
        fn test_load_invalid_toml_is_parse_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = write_config(&dir, "[run\ncolors = ");
            let err = FileConfig::load(&path).unwrap_err();
            assert!(matches!(err, Error::Parse(_)));
        }

        #[test]
        fn test_default_is_detached() {
            let config = FileConfig::default();
            assert!(!config.was_loaded_from_file());
            assert!(config.suites.is_empty());
            assert!(config.warnings.is_empty());
        }
    }

    mod legacy_schema {
        use super::*;

        #[test]
        fn test_legacy_keys_are_honored_and_warned() {
            let dir = tempfile::tempdir().unwrap();
            let path = write_config(
                &dir,
                r#"
                [run]
                stopOnFailure = true
                cacheDirectory = ".cache"
                "#,
            );

            let config = FileConfig::load(&path).unwrap();
            assert_eq!(config.run.stop_on_failure, Some(true));
            assert_eq!(config.run.cache_directory, Some(PathBuf::from(".cache")));
            assert_eq!(config.warnings.len(), 2);
            assert!(config.warnings.iter().any(|w| w.contains("stopOnFailure")));
        }

        #[test]
        fn test_current_key_wins_over_legacy_spelling() {
            let dir = tempfile::tempdir().unwrap();
            let path = write_config(
                &dir,
                r#"
                [run]
                columns = 120
                "#,
            );
            // No conflict case first: plain load works.
            assert_eq!(FileConfig::load(&path).unwrap().run.columns, Some(120));

            let path = write_config(
                &dir,
                "[run]\ncolumns = 120\n\n[coverage]\ncacheDirectory = \"legacy\"\ncache_directory = \"current\"\n",
            );
            let config = FileConfig::load(&path).unwrap();
            assert_eq!(
                config.coverage.cache_directory,
                Some(PathBuf::from("current"))
            );
            assert_eq!(config.warnings.len(), 1);
        }

        #[test]
        fn test_key_conversion() {
            assert_eq!(legacy_key_to_snake("stopOnFailure"), "stop_on_failure");
            assert_eq!(legacy_key_to_snake("columns"), "columns");
            assert!(is_legacy_key("failOnRisky"));
            assert!(!is_legacy_key("fail_on_risky"));
        }
    }
}
