//! Process exit-code policy.
//!
//! The exit code is a pure function of the run summary and the resolved
//! fail-on-* policy flags. The code set is closed: success, failure,
//! exception. Errors outrank every other determination.

use crate::exec::RunSummary;
use crate::resolve::ResolvedConfig;

/// The closed set of process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunExitCode {
    /// Everything the policy cares about went well.
    Success = 0,
    /// At least one test failed, or a fail-on-* policy was triggered.
    Failure = 1,
    /// At least one test errored, or the run itself faulted.
    Exception = 2,
}

impl RunExitCode {
    /// Numeric process exit code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// The fail-on-* policy flags consulted by [`compute`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExitPolicy {
    /// Fail when the suite executed zero tests.
    pub fail_on_empty_test_suite: bool,
    /// Fail when any test was risky.
    pub fail_on_risky: bool,
    /// Fail when any test emitted a warning.
    pub fail_on_warning: bool,
    /// Fail when any test was incomplete.
    pub fail_on_incomplete: bool,
    /// Fail when any test was skipped.
    pub fail_on_skipped: bool,
}

impl ExitPolicy {
    /// Extract the policy flags from a resolved configuration.
    #[must_use]
    pub const fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            fail_on_empty_test_suite: config.fail_on_empty_test_suite,
            fail_on_risky: config.fail_on_risky,
            fail_on_warning: config.fail_on_warning,
            fail_on_incomplete: config.fail_on_incomplete,
            fail_on_skipped: config.fail_on_skipped,
        }
    }
}

/// Compute the process exit code for a finished run.
///
/// The fail-on-* gates only apply when the run was successful ignoring
/// warnings; a run that already failed does not need them. Errors override
/// everything at the end.
#[must_use]
pub fn compute(summary: &RunSummary, policy: &ExitPolicy) -> RunExitCode {
    let mut code = if summary.was_successful() {
        RunExitCode::Success
    } else {
        RunExitCode::Failure
    };

    if policy.fail_on_empty_test_suite && summary.tests_run == 0 {
        code = RunExitCode::Failure;
    }

    if summary.was_successful_ignoring_warnings() {
        let policy_failed = (policy.fail_on_risky && summary.risky > 0)
            || (policy.fail_on_warning && summary.warnings > 0)
            || (policy.fail_on_incomplete && summary.incomplete > 0)
            || (policy.fail_on_skipped && summary.skipped > 0);
        if policy_failed {
            code = RunExitCode::Failure;
        }
    }

    if summary.errors > 0 {
        code = RunExitCode::Exception;
    }

    code
}
