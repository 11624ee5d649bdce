//! Shared utilities for the NDAX connector workspace.

mod backoff;
mod environment;

pub use backoff::ExponentialBackoff;
pub use environment::NdaxEnvironment;

/// Initialize the global tracing subscriber.
///
/// Reads the filter from `RUST_LOG`, defaulting to `info`.
/// Intended to be called once from binary entry points.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
