#![allow(missing_docs)]

mod common;

use common::{attest_cmd, write_script};
use predicates::prelude::*;

#[test]
fn passing_suite_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "alpha_test.sh", "exit 0");
    write_script(dir.path(), "beta_test.sh", "exit 0");

    attest_cmd()
        .args(["--do-not-cache-results"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("OK (2 test(s))"));
}

#[test]
fn failing_test_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "alpha_test.sh", "exit 0");
    write_script(dir.path(), "beta_test.sh", "exit 1");

    attest_cmd()
        .args(["--do-not-cache-results"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAILURES!"));
}

#[test]
fn erroring_test_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "alpha_test.sh", "exit 0");
    write_script(dir.path(), "broken_test.sh", "exit 2");

    attest_cmd()
        .args(["--do-not-cache-results"])
        .arg(dir.path())
        .assert()
        .code(2);
}

#[test]
fn error_outranks_failure() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "fail_test.sh", "exit 1");
    write_script(dir.path(), "broken_test.sh", "exit 2");

    attest_cmd()
        .args(["--do-not-cache-results"])
        .arg(dir.path())
        .assert()
        .code(2);
}

#[test]
fn skipped_test_passes_unless_policy_says_otherwise() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "skip_test.sh", "exit 3");

    attest_cmd()
        .args(["--do-not-cache-results"])
        .arg(dir.path())
        .assert()
        .success();

    attest_cmd()
        .args(["--do-not-cache-results", "--fail-on-skipped"])
        .arg(dir.path())
        .assert()
        .code(1);
}

#[test]
fn empty_suite_fails_only_with_policy() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("empty")).unwrap();

    attest_cmd()
        .args(["--do-not-cache-results"])
        .arg(dir.path().join("empty"))
        .assert()
        .success();

    attest_cmd()
        .args(["--do-not-cache-results", "--fail-on-empty-test-suite"])
        .arg(dir.path().join("empty"))
        .assert()
        .code(1);
}

#[test]
fn missing_test_path_exits_one() {
    attest_cmd()
        .args(["--do-not-cache-results", "--no-configuration"])
        .arg("/no/such/test/path")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Test path does not exist"));
}

#[test]
fn stop_on_failure_halts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "a_fail_test.sh", "exit 1");
    write_script(dir.path(), "b_pass_test.sh", "exit 0");

    attest_cmd()
        .args(["--do-not-cache-results", "--stop-on-failure"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Tests: 1"));
}

#[test]
fn single_script_test_runs_alone() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "smoke.t", "exit 0");

    attest_cmd()
        .args(["--do-not-cache-results"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK (1 test(s))"));
}

#[test]
fn bootstrap_runs_before_the_suite() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("bootstrapped");
    write_script(
        dir.path(),
        "bootstrap.sh",
        &format!("touch {}", marker.display()),
    );
    write_script(
        dir.path(),
        "tests/needs_bootstrap_test.sh",
        &format!("[ -f {} ] || exit 1", marker.display()),
    );

    attest_cmd()
        .args(["--do-not-cache-results", "--bootstrap"])
        .arg(dir.path().join("bootstrap.sh"))
        .arg(dir.path().join("tests"))
        .assert()
        .success();
}

#[test]
fn failing_bootstrap_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "bootstrap.sh", "exit 7");
    write_script(dir.path(), "tests/pass_test.sh", "exit 0");

    attest_cmd()
        .args(["--do-not-cache-results", "--bootstrap"])
        .arg(dir.path().join("bootstrap.sh"))
        .arg(dir.path().join("tests"))
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Bootstrap script failed"));
}

#[test]
fn environment_directives_reach_tests() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "env_test.sh",
        "[ \"$ATTEST_WIDGET\" = \"on\" ] || exit 1",
    );

    attest_cmd()
        .args(["--do-not-cache-results", "-d", "ATTEST_WIDGET=on"])
        .arg(dir.path())
        .assert()
        .success();
}
