//! Deterministic, pure cleaning logic.
//!
//! Core modules must be free of I/O side effects. They operate on an
//! in-memory [`table::Table`] and return deterministic outputs suitable for
//! tests.

pub mod error;
pub mod rules;
pub mod table;
