//! Tracing initialization.
//!
//! The crate instruments its delegation boundaries with `tracing`; this
//! module wires up a subscriber for binaries and test runs that want to see
//! the output.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install a global fmt subscriber filtered at `level`.
///
/// `RUST_LOG` overrides the given level when set. Safe to call more than
/// once; only the first call installs a subscriber.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer().with_writer(std::io::stdout);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
