//! Error types and handling for attest-core operations.
//!
//! This module provides the error type covering every failure the
//! configuration and run-orchestration layer can produce. Errors carry enough
//! context for the CLI to print a single actionable line and pick the right
//! process exit code.
//!
//! ## Error Categories
//!
//! - **Configuration errors**: resolver-detected inconsistencies, unusable
//!   option values
//! - **Path errors**: a path named by a specific option cannot be created or
//!   accessed
//! - **Selection errors**: a positional test path that does not exist
//! - **Bootstrap errors**: the bootstrap script is unreadable or fails
//! - **Parse errors**: the declarative configuration file cannot be loaded
//! - **I/O errors**: file system operations

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for attest-core operations.
///
/// All public functions in attest-core return `Result<T, Error>` for
/// consistent error handling. `Display` is a single user-facing line; `Debug`
/// preserves the full source chain.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers file system operations like reading test scripts, writing
    /// reports, and creating cache directories, where no more specific
    /// variant applies.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is invalid or inconsistent.
    ///
    /// Raised by the resolver for option values it cannot honor, and by the
    /// configuration context when it is initialized more than once.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The declarative configuration file could not be loaded.
    ///
    /// The file exists but is not valid TOML or does not deserialize into
    /// the expected schema.
    #[error("Failed to read configuration file: {0}")]
    Parse(String),

    /// A path referenced by a named option is unusable.
    ///
    /// The option name is the user-facing flag/key so the message points at
    /// the exact setting to fix.
    #[error("Cannot resolve path for `{option}`: {}: {source}", path.display())]
    PathResolution {
        /// The option whose value failed to resolve.
        option: &'static str,
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The positional test path does not exist on the filesystem.
    #[error("Test path does not exist: {}", .0.display())]
    TestPathNotFound(PathBuf),

    /// The bootstrap script cannot be read.
    #[error("Bootstrap script is not readable: {}", .0.display())]
    BootstrapUnreadable(PathBuf),

    /// The bootstrap script ran but terminated unsuccessfully.
    #[error("Bootstrap script failed: {}: {message}", path.display())]
    BootstrapFailed {
        /// The script that failed.
        path: PathBuf,
        /// Why it failed, including the exit status when available.
        message: String,
    },
}

impl Error {
    /// Whether this error stems from user input rather than configuration
    /// resolution.
    ///
    /// User-input errors exit with the failure code; configuration errors
    /// exit with the exception code after the version banner.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::TestPathNotFound(_) | Self::Parse(_))
    }
}

/// Result type alias for attest-core operations.
pub type Result<T> = std::result::Result<T, Error>;
