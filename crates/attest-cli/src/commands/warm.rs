//! `--warm-coverage-cache`: create the coverage cache directory tree.

use std::fs;

use anyhow::Context;

use attest_core::{ResolvedConfig, RunExitCode};

/// Create the resolved coverage cache directory.
///
/// # Errors
///
/// Returns an error when the directory cannot be created.
pub fn execute(config: &ResolvedConfig) -> anyhow::Result<RunExitCode> {
    let Some(directory) = &config.coverage_cache_directory else {
        println!("Cannot warm the coverage cache, no coverage cache directory is configured");
        return Ok(RunExitCode::Failure);
    };

    fs::create_dir_all(directory)
        .with_context(|| format!("failed to create {}", directory.display()))?;
    println!("Warmed coverage cache in {}", directory.display());
    Ok(RunExitCode::Success)
}
