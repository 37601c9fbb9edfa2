//! Diagnostic tracing for the loop.
//!
//! Tracing goes to stderr and is controlled by `RUST_LOG`. It is separate from
//! the phase status lines `ordae run` prints on stdout and from the memory
//! ledger, neither of which depend on the log level.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `warn` if unset, so persona store fallbacks
/// and unreadable knowledge files are still reported.
///
/// # Example
/// ```bash
/// RUST_LOG=ordae=debug ordae run
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
