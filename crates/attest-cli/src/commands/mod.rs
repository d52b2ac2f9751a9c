//! Early-exit command implementations for the attest CLI
//!
//! Each command fully replaces the normal run sequence for its invocation:
//! it prints its own output and yields the exit code the orchestrator
//! terminates with.

mod list;
mod migrate;
mod template;
mod version;
mod warm;

pub use list::{groups as list_groups, suites as list_suites, tests as list_tests, tests_xml as list_tests_xml};
pub use migrate::execute as migrate_configuration;
pub use template::execute as generate_configuration;
pub use version::{at_least as at_least_version, check_latest as check_version};
pub use warm::execute as warm_coverage_cache;
