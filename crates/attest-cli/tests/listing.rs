#![allow(missing_docs)]

mod common;

use common::{attest_cmd, write_config, write_script};
use predicates::prelude::*;

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "unit/alpha_test.sh", "exit 0");
    write_script(dir.path(), "unit/beta_test.sh", "exit 0");
    write_script(dir.path(), "integration/slow_test.sh", "exit 0");
    write_config(
        dir.path(),
        r#"
        [run]
        cache_results = false

        [[suite]]
        name = "unit"
        group = "fast"

        [[suite.directory]]
        path = "unit"

        [[suite]]
        name = "integration"
        group = "slow"

        [[suite.directory]]
        path = "integration"
        "#,
    );
    dir
}

#[test]
fn list_suites_names_definitions() {
    let dir = project();
    attest_cmd()
        .current_dir(dir.path())
        .arg("--list-suites")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Available test suite(s):")
                .and(predicate::str::contains(" - unit"))
                .and(predicate::str::contains(" - integration")),
        );
}

#[test]
fn list_tests_shows_selected_suite_only() {
    let dir = project();
    attest_cmd()
        .current_dir(dir.path())
        .args(["--list-tests", "--suite", "unit"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("alpha_test.sh")
                .and(predicate::str::contains("beta_test.sh"))
                .and(predicate::str::contains("slow_test.sh").not()),
        );
}

#[test]
fn list_tests_works_with_positional_path() {
    let dir = project();
    attest_cmd()
        .current_dir(dir.path())
        .arg("--list-tests")
        .arg(dir.path().join("unit"))
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha_test.sh"));
}

#[test]
fn list_groups_reports_suite_groups() {
    let dir = project();
    attest_cmd()
        .current_dir(dir.path())
        .arg("--list-groups")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Available test group(s):")
                .and(predicate::str::contains(" - fast"))
                .and(predicate::str::contains(" - slow")),
        );
}

#[test]
fn list_tests_xml_writes_document() {
    let dir = project();
    let target = dir.path().join("out/tests.xml");
    attest_cmd()
        .current_dir(dir.path())
        .args(["--suite", "unit"])
        .arg("--list-tests-xml")
        .arg(&target)
        .assert()
        .success();

    let xml = std::fs::read_to_string(&target).unwrap();
    assert!(xml.contains("<testSuite name=\"unit\">"));
    assert!(xml.contains("alpha_test.sh"));
    assert!(xml.contains("groups=\"fast\""));
}

#[test]
fn group_filters_limit_execution() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "unit/fast_test.sh", "exit 0");
    write_script(dir.path(), "unit/slow_test.sh", "exit 1");
    write_config(
        dir.path(),
        r#"
        [run]
        cache_results = false

        [[suite]]
        name = "unit"

        [[suite.directory]]
        path = "unit"
        suffix = "fast_test.sh"
        group = "fast"

        [[suite.directory]]
        path = "unit"
        suffix = "slow_test.sh"
        group = "slow"
        "#,
    );

    // Only the fast group runs, so the failing slow test never executes.
    attest_cmd()
        .current_dir(dir.path())
        .args(["--group", "fast"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK (1 test(s))"));
}

#[test]
fn excluded_group_present_in_both_lists_still_runs() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "unit/fast_test.sh", "exit 0");
    write_config(
        dir.path(),
        r#"
        [run]
        cache_results = false

        [[suite]]
        name = "unit"
        group = "fast"

        [[suite.directory]]
        path = "unit"
        "#,
    );

    attest_cmd()
        .current_dir(dir.path())
        .args(["--group", "fast", "--exclude-group", "fast"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK (1 test(s))"));
}
