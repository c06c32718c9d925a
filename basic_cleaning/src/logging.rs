//! Process-wide tracing setup for the cleaning job.
//!
//! Reads `RUST_LOG` first. When unset, falls back to the filter passed in
//! (normally `logging.filter` from the job config, default `info`).
//! Output: stderr with timestamps.
//!
//! # Example
//! ```bash
//! RUST_LOG=basic_cleaning=debug,artifact_store=debug basic-cleaning ...
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber. Call once, from `main`.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
