//! Log capture for unit tests.

use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness so it shows with a
/// failing test. `RUST_LOG` overrides the default `pathops=debug`.
pub(crate) fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pathops=debug"));
    // Another test may have installed it already.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
