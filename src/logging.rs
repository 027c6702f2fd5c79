//! Logging initialization for the spectator fleet.
//!
//! Configures the `tracing` subscriber with level filtering via the
//! `SFLEET_LOG` environment variable. Falls back to `info` level when the
//! variable is unset.
//!
//! # Usage
//!
//! ```bash
//! # Default (info level)
//! sfleet run
//!
//! # Debug level
//! SFLEET_LOG=debug sfleet run
//!
//! # Module-specific filtering
//! SFLEET_LOG=spectator_fleet=debug,warn sfleet run
//! ```

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// Reads the `SFLEET_LOG` environment variable for filter directives.
/// Falls back to `info` level when the variable is unset or invalid.
///
/// Output is written to stderr so it never interleaves with command output
/// on stdout.
///
/// # Panics
///
/// Panics if a global subscriber has already been set (should only be
/// called once, at startup).
pub fn init() {
    let filter = EnvFilter::try_from_env("SFLEET_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::EnvFilter;

    #[test]
    fn env_filter_parses_valid_directives() {
        let directives = ["info", "debug", "warn", "error", "trace"];
        for d in directives {
            let filter = EnvFilter::try_new(d);
            assert!(filter.is_ok(), "failed to parse directive: {}", d);
        }
    }

    #[test]
    fn env_filter_parses_module_directive() {
        let filter = EnvFilter::try_new("spectator_fleet=debug,warn");
        assert!(filter.is_ok());
    }
}
