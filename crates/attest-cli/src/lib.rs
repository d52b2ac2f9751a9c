//! attest CLI - test-execution orchestrator for script test suites
//!
//! The run sequence lives here: parse arguments, dispatch early-exit
//! commands, locate and load the configuration file, resolve the
//! configuration, run the suite, and compute the process exit code.
//!
//! Each sequencing step yields a [`Flow`]: either the state the next step
//! needs, or a terminal exit code. The orchestrator stops at the first
//! `Exit`, which is how early-exit commands (help, version probes,
//! listings, migrations) replace the rest of the sequence without
//! non-local control flow.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use clap::{CommandFactory, Parser};

use attest_core::error::Error as CoreError;
use attest_core::{
    compute, CliOptions, ConfigContext, ExitPolicy, FileConfig, ProcessExecutor, ResolvedConfig,
    RunExitCode, TestExecutor,
};

mod cli;
mod commands;
mod output;
mod utils;

use cli::Cli;

/// Configuration file names searched, in priority order.
pub const DEFAULT_CONFIG_FILES: [&str; 3] = ["attest.toml", "attest.dist.toml", "attest.toml.dist"];

/// Outcome of one sequencing step: carry state forward, or terminate with a
/// code. Output, when any, has already been printed by the step.
enum Flow<T> {
    /// Continue the sequence with this state.
    Continue(T),
    /// Terminate the process with this exit code.
    Exit(RunExitCode),
}

/// Execute the attest CLI with the current process arguments.
#[must_use]
pub fn run() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version requests are not failures.
            let code = if err.use_stderr() {
                RunExitCode::Failure.code()
            } else {
                RunExitCode::Success.code()
            };
            let _ = err.print();
            return ExitCode::from(code);
        },
    };

    match execute(&cli) {
        Ok(code) => ExitCode::from(code.code()),
        Err(fault) => {
            // Uncaught fault during the run itself.
            println!("{fault}");
            ExitCode::from(RunExitCode::Exception.code())
        },
    }
}

fn execute(cli: &Cli) -> anyhow::Result<RunExitCode> {
    utils::initialize_logging(cli)?;

    // Early-exit commands that need no configuration, in dispatch order.
    if cli.generate_configuration {
        return commands::generate_configuration();
    }
    if let Some(version) = &cli.at_least_version {
        return Ok(commands::at_least_version(version));
    }
    if cli.check_version {
        return Ok(commands::check_version());
    }

    // Option conversion validates --order-by, --columns and --colors; an
    // unrecognized value is a user-input error.
    let options = match cli.to_options() {
        Ok(options) => options,
        Err(err) => {
            println!("{err}");
            return Ok(RunExitCode::Failure);
        },
    };

    // CLI-side runtime settings: environment directives first, then the
    // search-path prefix.
    apply_env_directives(options.runtime_env.iter().cloned());
    if let Some(prefix) = &options.path_prefix {
        apply_path_prefix(prefix);
    }

    let file = match load_file_config(&options) {
        Flow::Continue(file) => file,
        Flow::Exit(code) => return Ok(code),
    };

    if cli.migrate_configuration {
        return commands::migrate_configuration(file.loaded_from.as_deref());
    }

    // File-side runtime settings.
    apply_env_directives(file.runtime.env.iter().map(|(k, v)| (k.clone(), v.clone())));
    apply_path_prefix(&file.runtime.path_prefix);

    let context = ConfigContext::new();
    let config = match init_context(&context, &options, &file) {
        Flow::Continue(config) => config,
        Flow::Exit(code) => return Ok(code),
    };

    if let Flow::Exit(code) = dispatch_resolved_commands(cli, config, &file)? {
        return Ok(code);
    }

    // Nothing selects any tests: neither a positional path nor a suite
    // definition. Show help instead of silently running nothing.
    if options.test_path.is_none() && file.suites.is_empty() {
        Cli::command().print_help()?;
        return Ok(RunExitCode::Exception);
    }

    run_suite(config)
}

/// Locate and load the configuration file (steps 4 and 5 of the sequence).
///
/// An explicit `--configuration` pointing at a directory searches that
/// directory for the default file names; without an explicit path the
/// working directory is searched unless discovery is disabled.
fn load_file_config(options: &CliOptions) -> Flow<FileConfig> {
    let Some(path) = locate_config_file(options) else {
        return Flow::Continue(FileConfig::default());
    };
    match FileConfig::load(&path) {
        Ok(file) => {
            tracing::debug!(path = %path.display(), "configuration file loaded");
            Flow::Continue(file)
        },
        Err(err) => {
            println!("{err}");
            Flow::Exit(RunExitCode::Failure)
        },
    }
}

fn locate_config_file(options: &CliOptions) -> Option<PathBuf> {
    if let Some(path) = &options.configuration {
        if path.is_dir() {
            let found = DEFAULT_CONFIG_FILES
                .iter()
                .map(|name| path.join(name))
                .find(|candidate| candidate.is_file());
            // No hit: hand the loader the primary name so the failure
            // message points somewhere concrete.
            return Some(found.unwrap_or_else(|| path.join(DEFAULT_CONFIG_FILES[0])));
        }
        return Some(path.clone());
    }

    if options.no_configuration {
        return None;
    }

    let cwd = std::env::current_dir().ok()?;
    DEFAULT_CONFIG_FILES
        .iter()
        .map(|name| cwd.join(name))
        .find(|candidate| candidate.is_file())
}

/// Resolve and publish the configuration (step 8).
///
/// A user-input failure (missing test path, unloadable file) exits with the
/// failure code; everything else prints the version banner once and exits
/// with the exception code.
fn init_context<'a>(
    context: &'a ConfigContext,
    options: &CliOptions,
    file: &FileConfig,
) -> Flow<&'a ResolvedConfig> {
    match context.init(options, file) {
        Ok(config) => Flow::Continue(config),
        Err(err) if err.is_user_error() => {
            println!("{err}");
            Flow::Exit(RunExitCode::Failure)
        },
        Err(err) => {
            output::print_banner();
            println!("{err}");
            Flow::Exit(RunExitCode::Exception)
        },
    }
}

/// Early-exit commands that need the resolved configuration (step 9), in
/// dispatch order.
fn dispatch_resolved_commands(
    cli: &Cli,
    config: &ResolvedConfig,
    file: &FileConfig,
) -> anyhow::Result<Flow<()>> {
    if cli.warm_coverage_cache {
        return commands::warm_coverage_cache(config).map(Flow::Exit);
    }
    if cli.list_groups {
        return Ok(Flow::Exit(commands::list_groups(config)));
    }
    if cli.list_suites {
        return Ok(Flow::Exit(commands::list_suites(file)));
    }
    if cli.list_tests {
        return Ok(Flow::Exit(commands::list_tests(config)));
    }
    if let Some(target) = &cli.list_tests_xml {
        return commands::list_tests_xml(config, target).map(Flow::Exit);
    }
    Ok(Flow::Continue(()))
}

/// Run the bootstrap script and the suite, write reports, compute the exit
/// code (steps 11 and 12).
fn run_suite(config: &ResolvedConfig) -> anyhow::Result<RunExitCode> {
    colored::control::set_override(config.colors);
    output::print_banner();
    for warning in &config.warnings {
        println!("Warning: {warning}");
    }
    if !config.warnings.is_empty() {
        println!();
    }

    if let Some(bootstrap) = &config.bootstrap {
        run_bootstrap(bootstrap)?;
    }

    let mut printer = output::ProgressPrinter::new(config);
    let mut executor = ProcessExecutor::new();
    let summary = executor.execute(&config.suite, config, &mut |outcome| {
        printer.on_outcome(outcome);
    })?;
    printer.finish();

    attest_core::report::write_all(&summary, config)?;
    output::print_summary(&summary, config);

    Ok(compute(&summary, &ExitPolicy::from_config(config)))
}

fn run_bootstrap(path: &Path) -> attest_core::Result<()> {
    let status = Command::new("/bin/sh")
        .arg(path)
        .status()
        .map_err(|err| CoreError::BootstrapFailed {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    if !status.success() {
        return Err(CoreError::BootstrapFailed {
            path: path.to_path_buf(),
            message: match status.code() {
                Some(code) => format!("exit status {code}"),
                None => "terminated by signal".to_string(),
            },
        });
    }
    Ok(())
}

fn apply_env_directives(directives: impl Iterator<Item = (String, String)>) {
    for (key, value) in directives {
        tracing::debug!(%key, "applying environment directive");
        std::env::set_var(key, value);
    }
}

fn apply_path_prefix(prefix: &[PathBuf]) {
    if prefix.is_empty() {
        return;
    }
    let current = std::env::var_os("PATH").unwrap_or_default();
    let mut paths: Vec<PathBuf> = prefix.to_vec();
    paths.extend(std::env::split_paths(&current));
    if let Ok(joined) = std::env::join_paths(paths) {
        std::env::set_var("PATH", joined);
    }
}
