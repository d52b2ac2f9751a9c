//! Version probes: `--at-least-version` and `--check-version`.

use attest_core::RunExitCode;
use semver::Version;

/// URL answering with the latest released version.
const LATEST_RELEASE_URL: &str =
    "https://api.github.com/repos/attest-dev/attest/releases/latest";

/// The version of the running binary.
fn current_version() -> Version {
    // The build embeds a valid semver version.
    lenient_parse(env!("CARGO_PKG_VERSION")).unwrap_or_else(|| Version::new(0, 0, 0))
}

/// Parse a possibly partial version like `0.4` by padding missing parts.
fn lenient_parse(raw: &str) -> Option<Version> {
    if let Ok(version) = Version::parse(raw) {
        return Some(version);
    }
    let mut parts = raw.trim().splitn(3, '.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().unwrap_or("0").parse().ok()?;
    let patch = parts.next().unwrap_or("0").parse().ok()?;
    Some(Version::new(major, minor, patch))
}

/// `--at-least-version`: succeed when this binary is at least `requested`.
#[must_use]
pub fn at_least(requested: &str) -> RunExitCode {
    let Some(requested) = lenient_parse(requested) else {
        println!("not a valid version number: {requested}");
        return RunExitCode::Failure;
    };
    if current_version() >= requested {
        RunExitCode::Success
    } else {
        RunExitCode::Failure
    }
}

/// `--check-version`: fetch the latest released version and compare.
#[must_use]
pub fn check_latest() -> RunExitCode {
    let current = current_version();
    println!("attest {current}");
    println!();

    match fetch_latest_version() {
        Ok(latest) if latest > current => {
            println!("A newer version, attest {latest}, is available.");
            RunExitCode::Failure
        },
        Ok(_) => {
            println!("You are using the latest version of attest.");
            RunExitCode::Success
        },
        Err(err) => {
            println!("Could not check for a newer version: {err}");
            RunExitCode::Failure
        },
    }
}

fn fetch_latest_version() -> anyhow::Result<Version> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("attest/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(10))
        .build()?;
    let release: serde_json::Value = client
        .get(LATEST_RELEASE_URL)
        .send()?
        .error_for_status()?
        .json()?;
    let tag = release
        .get("tag_name")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("release feed did not contain a version tag"))?;
    lenient_parse(tag.trim_start_matches('v'))
        .ok_or_else(|| anyhow::anyhow!("release feed contained an invalid version: {tag}"))
}
