//! attest CLI - test-execution orchestrator for script test suites
//!
//! This is the binary entry point; the run sequence lives in the library
//! crate so integration tests can exercise it end to end.

use std::process::ExitCode;

fn main() -> ExitCode {
    attest_cli::run()
}
