//! Logging setup for the dbintrospect binary.
//!
//! The library itself only emits `tracing` events. Installing a subscriber
//! is left to the host process; this helper is what the CLI uses.

use crate::Result;
use crate::error::IntrospectError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Maps CLI verbosity flags to a maximum log level.
///
/// `quiet` wins over any verbosity count.
pub const fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Builds the event filter for the given flags.
///
/// The verbosity level is the default directive; `overrides` uses
/// `RUST_LOG` syntax (e.g. `sqlx=warn,dbintrospect_core=trace`) and
/// refines it per target. Malformed directives are skipped.
pub fn filter_for(verbose: u8, quiet: bool, overrides: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level_for(verbose, quiet)).into())
        .parse_lossy(overrides)
}

/// Initializes structured logging based on verbosity level.
///
/// Logs go to stderr so stdout only carries operation output. Directives
/// in `RUST_LOG` refine the level chosen by the flags.
///
/// # Arguments
/// * `verbose` - Verbosity level (0=INFO, 1=DEBUG, 2+=TRACE)
/// * `quiet` - If true, only show ERROR level logs
///
/// # Errors
/// Returns `IntrospectError::Logging` if a global subscriber is already set.
///
/// # Example
/// ```rust,no_run
/// use dbintrospect_core::logging::init_logging;
///
/// init_logging(1, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let overrides = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbose, quiet, &overrides))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| IntrospectError::Logging {
            message: format!("Failed to initialize logging: {e}"),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // A global subscriber can only be installed once per test process,
    // so only the level mapping is exercised here.
    #[test]
    fn test_verbosity_levels() {
        let test_cases = [
            ((true, 0), tracing::Level::ERROR),
            ((true, 5), tracing::Level::ERROR),
            ((false, 0), tracing::Level::INFO),
            ((false, 1), tracing::Level::DEBUG),
            ((false, 2), tracing::Level::TRACE),
            ((false, 10), tracing::Level::TRACE),
        ];

        for ((quiet, verbose), expected) in test_cases {
            assert_eq!(
                level_for(verbose, quiet),
                expected,
                "Failed for quiet={quiet}, verbose={verbose}"
            );
        }
    }

    #[test]
    fn test_filter_defaults_to_flag_level() {
        assert_eq!(filter_for(0, true, "").to_string(), "error");
        assert_eq!(filter_for(1, false, "").to_string(), "debug");
    }

    #[test]
    fn test_filter_accepts_target_overrides() {
        let filter = filter_for(0, false, "sqlx=warn,scylla=loud").to_string();
        assert!(filter.contains("sqlx=warn"), "{filter}");
        assert!(!filter.contains("scylla"), "{filter}");
    }
}
