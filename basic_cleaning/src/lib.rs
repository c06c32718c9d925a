//! Basic cleaning job for listings datasets.
//!
//! Fetches a raw CSV artifact, applies a fixed sequence of filters and
//! null-fills, and publishes the result as a new artifact version. The
//! architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic cleaning logic over an in-memory table.
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config files, CSV read/write).
//!
//! [`pipeline`] coordinates core logic, I/O, and the artifact store to
//! implement the CLI.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
