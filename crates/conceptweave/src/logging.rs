//! Subscriber setup for the binary and for embedding applications.
//!
//! `RUST_LOG` wins over the configured level. Records emitted through the
//! `log` facade (lopdf, leptess, reqwest internals) are forwarded into
//! `tracing` so they share the same filter and output format.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Builds the filter: `RUST_LOG` if set and valid, else the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&config.level).unwrap_or_else(|e| {
            eprintln!(
                "Invalid log level '{}' ({}), falling back to 'info'",
                config.level, e
            );
            EnvFilter::new("info")
        })
    })
}

/// Installs the global subscriber. Returns `false` when one is already
/// installed, which is not an error: tests and host applications may have
/// set their own.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let installed = if config.json {
        tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().json()),
        )
    } else {
        tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().with_target(false)),
        )
    };

    if installed.is_err() {
        return false;
    }

    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::debug!(error = %e, "log bridge already installed");
    }

    tracing::debug!(level = %config.level, json = config.json, "Tracing initialized");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_invalid_level_falls_back() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig {
            level: "conceptweave=loudest".to_string(),
            json: false,
        };
        let filter = env_filter(&config);
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    #[serial]
    fn test_rust_log_overrides_config() {
        std::env::set_var("RUST_LOG", "conceptweave=trace");
        let filter = env_filter(&LoggingConfig::default());
        std::env::remove_var("RUST_LOG");

        assert_eq!(filter.to_string(), "conceptweave=trace");
    }

    #[test]
    #[serial]
    fn test_second_init_is_noop() {
        let config = LoggingConfig::default();
        // Another test binary thread may have installed a subscriber first.
        let _ = init_tracing(&config);
        assert!(!init_tracing(&config));
    }
}
