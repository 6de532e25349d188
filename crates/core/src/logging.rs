use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::CoreError;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "signal_board_core=info,signal_board=info";

/// Install a stderr `tracing` subscriber. For binaries only; the library
/// itself never installs one.
///
/// `verbose` raises the default filter to debug. `RUST_LOG` always wins.
pub fn init_logging(verbose: bool) -> Result<(), CoreError> {
    let default = if verbose {
        "signal_board_core=debug,signal_board=debug"
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init()
        .map_err(|e| CoreError::Config(format!("Failed to install log subscriber: {e}")))
}
