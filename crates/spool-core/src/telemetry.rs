//! Tracing initialization.
//!
//! Installs a `tracing-subscriber` registry with an fmt layer. `RUST_LOG`
//! wins when set; otherwise `default_level` applies.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::{SubscriberInitExt as _, TryInitError};

/// Initialize the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber was already set.
pub fn init_tracing(default_level: &str) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}
