//! Stable exit codes for the `basic-cleaning` binary.

/// Cleaned artifact published.
pub const OK: i32 = 0;
/// Input file missing or malformed, or required columns absent/non-numeric.
pub const INPUT: i32 = 1;
/// Invalid command-line arguments (clap's own usage exit code).
pub const USAGE: i32 = 2;
/// Artifact store fetch/publish/bookkeeping failed.
pub const STORE: i32 = 3;
