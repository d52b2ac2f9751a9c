//! Listing commands: `--list-groups`, `--list-suites`, `--list-tests`,
//! `--list-tests-xml`.

use std::fs;
use std::path::Path;

use anyhow::Context;

use attest_core::{report, FileConfig, ResolvedConfig, RunExitCode};

/// Print the groups occurring in the selected suite.
#[must_use]
pub fn groups(config: &ResolvedConfig) -> RunExitCode {
    let names = config.suite.group_names();
    println!("Available test group(s):");
    for name in names {
        println!(" - {name}");
    }
    RunExitCode::Success
}

/// Print the suites defined in the configuration file.
#[must_use]
pub fn suites(file: &FileConfig) -> RunExitCode {
    println!("Available test suite(s):");
    for suite in &file.suites {
        println!(" - {}", suite.name);
    }
    RunExitCode::Success
}

/// Print the tests of the selected suite.
#[must_use]
pub fn tests(config: &ResolvedConfig) -> RunExitCode {
    println!("Available test(s):");
    for test in &config.suite.tests {
        println!(" - {}", test.name);
    }
    RunExitCode::Success
}

/// Write an XML listing of the selected suite.
///
/// # Errors
///
/// Returns an error when the listing cannot be produced or written.
pub fn tests_xml(config: &ResolvedConfig, target: &Path) -> anyhow::Result<RunExitCode> {
    let xml = report::list_tests_xml(&config.suite)?;
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    fs::write(target, xml).with_context(|| format!("failed to write {}", target.display()))?;
    println!("Wrote list of tests that would have been run to {}", target.display());
    Ok(RunExitCode::Success)
}
