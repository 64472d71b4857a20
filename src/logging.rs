//! Logging setup.
//!
//! All logs are written to **stderr**: stdout carries the handshake line the
//! host reads to find the gRPC address.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: log filter, `info` when unset.
//!
//! ```bash
//! # Log every API request and poll iteration
//! RUST_LOG=hemmer_provider_bitlaunch=debug ./hemmer-provider-bitlaunch
//!
//! # Include operation entry traces
//! RUST_LOG=hemmer_provider_bitlaunch=trace ./hemmer-provider-bitlaunch
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Install the global subscriber.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer())
        .init();
}

/// Try to install the global subscriber, returning false if one is already set.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    // The global subscriber can only be set once per process, so only the
    // idempotent entry point is exercised here.

    use super::*;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
        assert!(EnvFilter::try_new("hemmer_provider_bitlaunch=debug").is_ok());
        assert!(EnvFilter::try_new("warn,hemmer_provider_bitlaunch=trace").is_ok());
    }

    #[test]
    fn test_try_init_is_idempotent() {
        try_init_logging();
        assert!(!try_init_logging());
    }
}
