//! Tracing infrastructure.
//!
//! Structured, async-aware logging built on `tracing` and
//! `tracing-subscriber`. The filter honors `RUST_LOG` when set and otherwise
//! falls back to the configured level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// `level` is the fallback directive (e.g. `"info"`, `"thermolog=debug"`)
/// used when `RUST_LOG` is not set. Returns an error if a global subscriber
/// was already installed.
pub fn init(level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent_enough_for_tests() {
        // Only the first call installs a subscriber; later calls error but
        // must not panic.
        let _ = init("debug");
        assert!(init("info").is_err());
    }
}
