//! The configuration context: one published snapshot per run.
//!
//! Exactly one [`ResolvedConfig`] governs one test run. Rather than hiding
//! that invariant behind process-global state, [`ConfigContext`] is an
//! explicit handle created once at process start and passed to every
//! downstream consumer. The handle enforces the lifecycle: `init` resolves
//! and publishes exactly once, `get` reads thereafter.

use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::file_config::FileConfig;
use crate::options::CliOptions;
use crate::resolve::{resolve, ResolvedConfig};

/// Holder of the run's published configuration snapshot.
///
/// Construction happens-before every read in the single thread of control,
/// so reads need no synchronization beyond the publication slot itself.
#[derive(Debug, Default)]
pub struct ConfigContext {
    slot: OnceLock<ResolvedConfig>,
}

impl ConfigContext {
    /// Create an empty, not-yet-initialized context.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Resolve the configuration and publish it.
    ///
    /// Callable exactly once per context; a second call is a configuration
    /// error, not a silent overwrite.
    ///
    /// # Errors
    ///
    /// Propagates resolution failures, and fails when the context was
    /// already initialized.
    pub fn init(&self, cli: &CliOptions, file: &FileConfig) -> Result<&ResolvedConfig> {
        if self.slot.get().is_some() {
            return Err(Error::Config(
                "configuration was already resolved for this run".to_string(),
            ));
        }
        let resolved = resolve(cli, file)?;
        Ok(self.slot.get_or_init(|| resolved))
    }

    /// The published snapshot.
    ///
    /// # Panics
    ///
    /// Panics when called before [`ConfigContext::init`]: reading
    /// configuration that was never resolved is a programming error, not a
    /// recoverable condition.
    #[must_use]
    #[allow(clippy::panic)]
    pub fn get(&self) -> &ResolvedConfig {
        self.slot.get().map_or_else(
            || panic!("configuration accessed before it was resolved"),
            |config| config,
        )
    }

    /// The published snapshot, or `None` before initialization.
    #[must_use]
    pub fn try_get(&self) -> Option<&ResolvedConfig> {
        self.slot.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> (CliOptions, FileConfig) {
        let cli = CliOptions {
            random_seed: Some(1),
            ..CliOptions::default()
        };
        (cli, FileConfig::default())
    }

    #[test]
    fn test_init_publishes_snapshot() {
        let context = ConfigContext::new();
        let (cli, file) = inputs();
        let resolved = context.init(&cli, &file).unwrap().clone();
        assert_eq!(context.get(), &resolved);
        assert!(context.try_get().is_some());
    }

    #[test]
    fn test_second_init_is_rejected() {
        let context = ConfigContext::new();
        let (cli, file) = inputs();
        context.init(&cli, &file).unwrap();
        let err = context.init(&cli, &file).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    #[should_panic(expected = "before it was resolved")]
    fn test_get_before_init_panics() {
        let context = ConfigContext::new();
        let _ = context.get();
    }

    #[test]
    fn test_try_get_before_init_is_none() {
        let context = ConfigContext::new();
        assert!(context.try_get().is_none());
    }

    #[test]
    fn test_failed_init_leaves_context_usable() {
        let context = ConfigContext::new();
        let (mut cli, file) = inputs();
        cli.test_path = Some(std::path::PathBuf::from("/no/such/path"));
        assert!(context.init(&cli, &file).is_err());

        let (cli, file) = inputs();
        assert!(context.init(&cli, &file).is_ok());
    }
}
