//! Tracing subscriber setup.
//!
//! The crate logs through both `log::` macros (worker and db layers) and
//! `tracing::` spans (pipeline), so the subscriber is paired with the
//! `tracing-log` bridge. Controlled via `RUST_LOG`, defaulting to `info`.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber and the `log` bridge.
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_log::LogTracer::init();
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
    }
}
