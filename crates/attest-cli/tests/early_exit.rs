#![allow(missing_docs)]

mod common;

use common::attest_cmd;
use predicates::prelude::*;

#[test]
fn version_flag_prints_and_succeeds() {
    attest_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("attest"));
}

#[test]
fn at_least_version_passes_for_old_versions() {
    attest_cmd()
        .args(["--at-least-version", "0.1"])
        .assert()
        .success();
}

#[test]
fn at_least_version_fails_for_future_versions() {
    attest_cmd()
        .args(["--at-least-version", "999.0"])
        .assert()
        .code(1);
}

#[test]
fn generate_configuration_writes_template_once() {
    let dir = tempfile::tempdir().unwrap();

    attest_cmd()
        .current_dir(dir.path())
        .arg("--generate-configuration")
        .assert()
        .success()
        .stdout(predicate::str::contains("attest.toml"));
    assert!(dir.path().join("attest.toml").is_file());

    attest_cmd()
        .current_dir(dir.path())
        .arg("--generate-configuration")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("not overwriting"));
}

#[test]
fn unrecognized_order_by_is_a_usage_failure() {
    let dir = tempfile::tempdir().unwrap();
    attest_cmd()
        .current_dir(dir.path())
        .args(["--order-by", "alphabetical"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("unrecognized --order-by option"));
}

#[test]
fn no_selection_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    attest_cmd()
        .current_dir(dir.path())
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn unknown_flag_fails_with_usage_error() {
    attest_cmd().arg("--no-such-flag").assert().code(1);
}
