//! Tracing subscriber setup for the binary

use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "proxy_sift=debug"
    } else {
        "proxy_sift=info"
    }
}

/// Install the global subscriber. Logs go to stderr so stdout carries only
/// the run's own report lines.
pub fn init(verbose: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose).into());

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if let Err(e) = installed {
        debug!("keeping the existing tracing subscriber: {}", e);
    }
}
