//! # attest-core
//!
//! Core functionality for attest - a test-execution orchestrator for script
//! test suites.
//!
//! This crate owns the correctness-critical half of the tool: merging
//! command-line and file configuration into one immutable snapshot,
//! selecting and discovering the test suite, executing it, and turning the
//! result into a process exit code.
//!
//! ## Architecture
//!
//! - **Options**: typed views over the two configuration sources
//!   ([`CliOptions`], [`FileConfig`])
//! - **Resolution**: the precedence engine producing a [`ResolvedConfig`]
//!   snapshot, published once per run through a [`ConfigContext`]
//! - **Suites**: filesystem discovery and named suite definitions
//! - **Execution**: the `/bin/sh` script-test executor and its run summary
//! - **Exit codes**: the pure pass/fail/defect policy calculator
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use attest_core::{compute, CliOptions, ConfigContext, ExitPolicy, FileConfig};
//! use attest_core::{ProcessExecutor, TestExecutor};
//!
//! let cli = CliOptions::default();
//! let file = FileConfig::default();
//!
//! let context = ConfigContext::new();
//! let config = context.init(&cli, &file)?;
//!
//! let mut executor = ProcessExecutor::new();
//! let summary = executor.execute(&config.suite, config, &mut |_| {})?;
//! let exit_code = compute(&summary, &ExitPolicy::from_config(config));
//! # Ok::<(), attest_core::Error>(())
//! ```
//!
//! ## Precedence
//!
//! Every option resolves the same way: a value set on the command line
//! wins; otherwise the configuration file's value applies; otherwise a
//! hard-coded default. The resolved snapshot never changes after
//! construction; a new run produces a new instance.

/// The configuration context publishing one snapshot per run
pub mod context;
/// Error types and result aliases
pub mod error;
/// Suite execution and run summaries
pub mod exec;
/// Exit-code policy
pub mod exit_code;
/// Typed view over the declarative configuration file
pub mod file_config;
/// Typed view over parsed command-line options
pub mod options;
/// Report and log writers
pub mod report;
/// Configuration resolution and the resolved snapshot
pub mod resolve;
/// Test suite model and filesystem discovery
pub mod suite;

// Re-export commonly used types
pub use context::ConfigContext;
pub use error::{Error, Result};
pub use exec::{
    ProcessExecutor, ResultCache, RunSummary, TestExecutor, TestOutcome, TestStatus,
};
pub use exit_code::{compute, ExitPolicy, RunExitCode};
pub use file_config::{FileConfig, SuiteDefinition};
pub use options::{CliOptions, ColorMode, Columns, ExecutionOrder, ReporterKind};
pub use resolve::{resolve, ResolvedConfig};
pub use suite::{TestCase, TestSuite, DEFAULT_SUFFIXES, SCRIPT_SUFFIX};
