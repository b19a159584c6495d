//! Diagnostics for a sweep, written to stderr.
//!
//! Filtered through `RUST_LOG`; defaults to `info` so every page, branch
//! and deletion shows up without extra setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// # Example
/// ```bash
/// RUST_LOG=branchsweep=debug branchsweep --glurl gitlab.local ...
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
