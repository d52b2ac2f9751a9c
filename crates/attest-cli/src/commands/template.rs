//! `--generate-configuration`: write a configuration file template.

use std::fs;
use std::path::Path;

use attest_core::RunExitCode;

const TEMPLATE: &str = r#"# attest configuration
#
# Every setting here can be overridden on the command line; command-line
# values always win.

[run]
# bootstrap = "tests/bootstrap.sh"
cache_directory = ".attest-cache"
colors = "auto"
# columns = 100
# order_by = "default"
# defects_first = false
# fail_on_warning = true
# stop_on_failure = false
# test_suffixes = ["_test.sh", ".t"]

[[suite]]
name = "default"

[[suite.directory]]
path = "tests"

# [coverage.report.html]
# target = "coverage/html"
# low_upper_bound = 50
# high_lower_bound = 90

# [logging.junit]
# target = "reports/junit.xml"

# [runtime.env]
# APP_ENV = "test"
"#;

/// Write `attest.toml` into the working directory.
///
/// Refuses to overwrite an existing file.
///
/// # Errors
///
/// Returns an error when the file cannot be written.
pub fn execute() -> anyhow::Result<RunExitCode> {
    let target = Path::new("attest.toml");
    if target.exists() {
        println!("attest.toml already exists, not overwriting it");
        return Ok(RunExitCode::Failure);
    }
    fs::write(target, TEMPLATE)?;
    println!("Wrote configuration template to attest.toml");
    Ok(RunExitCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_valid_current_schema() {
        let config: attest_core::FileConfig = toml::from_str(TEMPLATE).unwrap();
        assert_eq!(config.suites.len(), 1);
        assert_eq!(config.suites[0].name, "default");
        assert!(config.run.cache_directory.is_some());
    }
}
