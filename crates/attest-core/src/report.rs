//! Report and log writers for finished runs.
//!
//! Each resolved logging target gets its own format: a plain text log, a
//! JUnit XML report for CI systems, a JSON-lines event log, and the three
//! documentation-style reports. Targets that did not resolve are skipped;
//! writers create parent directories as needed.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{Error, Result};
use crate::exec::{RunSummary, TestStatus};
use crate::resolve::ResolvedConfig;
use crate::suite::TestSuite;

fn xml_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Config(format!("failed to write XML report: {e}"))
}

/// Write every resolved logging target for a finished run.
///
/// # Errors
///
/// Returns the first write failure; earlier targets stay written.
pub fn write_all(summary: &RunSummary, config: &ResolvedConfig) -> Result<()> {
    if let Some(target) = &config.log_text {
        write_target(target, &text_log(summary))?;
    }
    if let Some(target) = &config.log_junit {
        write_target(target, &junit_xml(&config.suite.name, summary)?)?;
    }
    if let Some(target) = &config.log_events {
        write_target(target, &events_log(summary)?)?;
    }
    if let Some(target) = &config.doc_text {
        write_target(target, &doc_text(summary))?;
    }
    if let Some(target) = &config.doc_html {
        write_target(target, &doc_html(summary))?;
    }
    if let Some(target) = &config.doc_xml {
        write_target(target, &doc_xml(summary)?)?;
    }
    Ok(())
}

fn write_target(target: &Path, content: &str) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(target, content)?;
    tracing::debug!(target = %target.display(), "report written");
    Ok(())
}

/// Plain text log: one line per test plus a summary footer.
#[must_use]
pub fn text_log(summary: &RunSummary) -> String {
    let mut out = String::new();
    for outcome in &summary.outcomes {
        out.push_str(&format!(
            "{:<10} {} ({:.3}s)\n",
            outcome.status.as_str().to_uppercase(),
            outcome.name,
            outcome.duration.as_secs_f64(),
        ));
    }
    out.push_str(&format!(
        "tests: {}, failures: {}, errors: {}, warnings: {}, risky: {}, skipped: {}, incomplete: {}\n",
        summary.tests_run,
        summary.failures,
        summary.errors,
        summary.warnings,
        summary.risky,
        summary.skipped,
        summary.incomplete,
    ));
    out
}

/// JUnit XML report for CI integration.
///
/// Risky and warning outcomes have no JUnit equivalent; they map to
/// failures with an explanatory type attribute so CI systems surface them.
pub fn junit_xml(suite_name: &str, summary: &RunSummary) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut suites = BytesStart::new("testsuites");
    suites.push_attribute(("name", "attest"));
    writer.write_event(Event::Start(suites)).map_err(xml_err)?;

    let mut suite = BytesStart::new("testsuite");
    suite.push_attribute(("name", suite_name));
    suite.push_attribute(("tests", summary.tests_run.to_string().as_str()));
    suite.push_attribute(("failures", summary.failures.to_string().as_str()));
    suite.push_attribute(("errors", summary.errors.to_string().as_str()));
    suite.push_attribute((
        "skipped",
        (summary.skipped + summary.incomplete).to_string().as_str(),
    ));
    suite.push_attribute(("time", format!("{:.3}", summary.duration.as_secs_f64()).as_str()));
    suite.push_attribute(("timestamp", chrono::Utc::now().to_rfc3339().as_str()));
    writer.write_event(Event::Start(suite)).map_err(xml_err)?;

    for outcome in &summary.outcomes {
        let mut case = BytesStart::new("testcase");
        case.push_attribute(("name", outcome.name.as_str()));
        case.push_attribute((
            "time",
            format!("{:.3}", outcome.duration.as_secs_f64()).as_str(),
        ));

        match outcome.status {
            TestStatus::Passed => {
                writer.write_event(Event::Empty(case)).map_err(xml_err)?;
            },
            status => {
                writer.write_event(Event::Start(case)).map_err(xml_err)?;
                let tag = match status {
                    TestStatus::Errored => "error",
                    TestStatus::Skipped | TestStatus::Incomplete => "skipped",
                    _ => "failure",
                };
                let mut detail = BytesStart::new(tag);
                detail.push_attribute(("type", status.as_str()));
                if outcome.output.is_empty() {
                    writer.write_event(Event::Empty(detail)).map_err(xml_err)?;
                } else {
                    writer.write_event(Event::Start(detail)).map_err(xml_err)?;
                    writer
                        .write_event(Event::Text(BytesText::new(&outcome.output)))
                        .map_err(xml_err)?;
                    writer
                        .write_event(Event::End(BytesEnd::new(tag)))
                        .map_err(xml_err)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new("testcase")))
                    .map_err(xml_err)?;
            },
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new("testsuite")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("testsuites")))
        .map_err(xml_err)?;

    String::from_utf8(writer.into_inner()).map_err(xml_err)
}

/// JSON-lines event log: one `test` event per outcome plus a `summary`
/// footer event.
pub fn events_log(summary: &RunSummary) -> Result<String> {
    let mut out = String::new();
    for outcome in &summary.outcomes {
        let event = serde_json::json!({
            "event": "test",
            "name": outcome.name,
            "status": outcome.status.as_str(),
            "duration_ms": u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
        });
        out.push_str(&event.to_string());
        out.push('\n');
    }
    let footer = serde_json::json!({
        "event": "summary",
        "tests": summary.tests_run,
        "failures": summary.failures,
        "errors": summary.errors,
        "warnings": summary.warnings,
        "risky": summary.risky,
        "skipped": summary.skipped,
        "incomplete": summary.incomplete,
        "duration_ms": u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
    });
    out.push_str(&footer.to_string());
    out.push('\n');
    Ok(out)
}

/// Documentation-style text report, one sentence per test.
#[must_use]
pub fn doc_text(summary: &RunSummary) -> String {
    let mut out = String::new();
    for outcome in &summary.outcomes {
        let marker = match outcome.status {
            TestStatus::Passed => "[x]",
            TestStatus::Skipped | TestStatus::Incomplete => "[-]",
            _ => "[ ]",
        };
        out.push_str(&format!("{marker} {}\n", outcome.name));
    }
    out
}

/// Documentation-style HTML report.
#[must_use]
pub fn doc_html(summary: &RunSummary) -> String {
    let mut out = String::from(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>attest</title></head>\n<body>\n<ul>\n",
    );
    for outcome in &summary.outcomes {
        out.push_str(&format!(
            "<li class=\"{}\">{}</li>\n",
            outcome.status.as_str(),
            html_escape(&outcome.name),
        ));
    }
    out.push_str("</ul>\n</body>\n</html>\n");
    out
}

/// Documentation-style XML report.
pub fn doc_xml(summary: &RunSummary) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("tests")))
        .map_err(xml_err)?;
    for outcome in &summary.outcomes {
        let mut test = BytesStart::new("test");
        test.push_attribute(("name", outcome.name.as_str()));
        test.push_attribute(("status", outcome.status.as_str()));
        writer.write_event(Event::Empty(test)).map_err(xml_err)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("tests")))
        .map_err(xml_err)?;
    String::from_utf8(writer.into_inner()).map_err(xml_err)
}

/// XML listing of the selected suite, for `--list-tests-xml`.
pub fn list_tests_xml(suite: &TestSuite) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut root = BytesStart::new("testSuite");
    root.push_attribute(("name", suite.name.as_str()));
    writer.write_event(Event::Start(root)).map_err(xml_err)?;

    for test in &suite.tests {
        let mut el = BytesStart::new("test");
        el.push_attribute(("name", test.name.as_str()));
        if !test.groups.is_empty() {
            el.push_attribute(("groups", test.groups.join(",").as_str()));
        }
        writer.write_event(Event::Empty(el)).map_err(xml_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("testSuite")))
        .map_err(xml_err)?;
    String::from_utf8(writer.into_inner()).map_err(xml_err)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
