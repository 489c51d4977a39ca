//! Tracing subscriber setup for binaries and tests embedding windconf.
//!
//! The library itself only emits `tracing` events; nothing is printed unless
//! the host installs a subscriber, either its own or the one below.

use std::sync::OnceLock;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "windconf=info";

/// Filter used when `RUST_LOG` is not set and verbose output is requested
const VERBOSE_FILTER: &str = "windconf=debug";

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Build the filter for the given verbosity, honoring `RUST_LOG` when set.
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER }))
}

/// Install a formatted stderr subscriber.
///
/// Only the first call has any effect. If another global subscriber is
/// already installed, it is left in place.
pub fn init_logging(verbose: bool) {
    LOGGING_INITIALIZED.get_or_init(|| {
        let _ = tracing_subscriber::registry()
            .with(env_filter(verbose))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init();
    });
}
