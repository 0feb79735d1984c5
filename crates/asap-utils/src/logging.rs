//! Logging initialization shared by the CLI binary and integration tests.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber driven by `ASAP_LOG` (falling back to
/// `info`, or `debug` when `verbose` is set and `ASAP_LOG` is unset).
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("ASAP_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
