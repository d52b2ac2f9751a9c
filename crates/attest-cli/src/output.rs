//! Progress and summary rendering for test runs.
//!
//! Three reporter flavors: the default dot-per-test progress line, CI
//! service messages, and documentation-style sentences. The summary footer
//! is shared.

use colored::Colorize;

use attest_core::{ReporterKind, ResolvedConfig, RunSummary, TestOutcome, TestStatus};

/// Print the version banner.
pub fn print_banner() {
    println!("attest {} by Attest Contributors.", env!("CARGO_PKG_VERSION"));
    println!();
}

/// Streams per-test progress while the suite runs.
pub struct ProgressPrinter {
    reporter: ReporterKind,
    columns: u16,
    emitted: u16,
}

impl ProgressPrinter {
    /// Create a printer for the resolved reporter flavor.
    #[must_use]
    pub const fn new(config: &ResolvedConfig) -> Self {
        Self {
            reporter: config.reporter,
            columns: config.columns,
            emitted: 0,
        }
    }

    /// Report one finished test.
    pub fn on_outcome(&mut self, outcome: &TestOutcome) {
        match self.reporter {
            ReporterKind::Default => self.print_progress_char(outcome.status),
            ReporterKind::Ci => print_ci_message(outcome),
            ReporterKind::Doc => print_doc_line(outcome),
        }
    }

    /// Terminate the progress line.
    pub fn finish(&self) {
        if self.reporter == ReporterKind::Default && self.emitted > 0 {
            println!();
        }
    }

    fn print_progress_char(&mut self, status: TestStatus) {
        let marker = match status {
            TestStatus::Passed => ".".normal(),
            TestStatus::Failed => "F".red(),
            TestStatus::Errored => "E".red(),
            TestStatus::Skipped => "S".cyan(),
            TestStatus::Incomplete => "I".yellow(),
            TestStatus::Risky => "R".yellow(),
            TestStatus::Warning => "W".yellow(),
        };
        print!("{marker}");
        self.emitted += 1;
        if self.emitted % self.columns.max(1) == 0 {
            println!();
        }
    }
}

fn print_ci_message(outcome: &TestOutcome) {
    println!(
        "##attest[testFinished name='{}' status='{}' duration='{}']",
        ci_escape(&outcome.name),
        outcome.status.as_str(),
        outcome.duration.as_millis(),
    );
}

fn print_doc_line(outcome: &TestOutcome) {
    let marker = match outcome.status {
        TestStatus::Passed => "[x]",
        TestStatus::Skipped | TestStatus::Incomplete => "[-]",
        _ => "[ ]",
    };
    println!("{marker} {}", outcome.name);
}

fn ci_escape(value: &str) -> String {
    value.replace('|', "||").replace('\'', "|'").replace('\n', "|n")
}

/// Print the defect details and the result footer.
pub fn print_summary(summary: &RunSummary, config: &ResolvedConfig) {
    println!();
    println!(
        "Time: {:.3}s, Tests: {}",
        summary.duration.as_secs_f64(),
        summary.tests_run
    );
    println!();

    let defects: Vec<&TestOutcome> = summary
        .outcomes
        .iter()
        .filter(|o| o.status.is_defect())
        .collect();
    for (index, outcome) in defects.iter().enumerate() {
        println!("{}) {} [{}]", index + 1, outcome.name, outcome.status.as_str());
        if config.verbose && !outcome.output.is_empty() {
            println!("{}", outcome.output.trim_end());
            println!();
        }
    }
    if !defects.is_empty() {
        println!();
    }

    if summary.was_successful() {
        let line = format!("OK ({} test(s))", summary.tests_run);
        println!("{}", if config.colors { line.green().to_string() } else { line });
    } else {
        let line = format!(
            "FAILURES! Tests: {}, Failures: {}, Errors: {}, Warnings: {}, Risky: {}, Skipped: {}, Incomplete: {}.",
            summary.tests_run,
            summary.failures,
            summary.errors,
            summary.warnings,
            summary.risky,
            summary.skipped,
            summary.incomplete,
        );
        println!("{}", if config.colors { line.red().to_string() } else { line });
    }
}
