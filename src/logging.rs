//! Process-wide log subscriber.
//!
//! Uses `RUST_LOG` when set, otherwise logs this crate and the HTTP trace
//! layer at `info`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "murmur=info,tower_http=info";

/// Install the global `tracing` subscriber. Safe to call more than once;
/// later calls are ignored.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
