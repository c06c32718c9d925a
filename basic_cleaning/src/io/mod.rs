//! I/O helpers for the cleaning job.

pub mod config;
pub mod csv_table;
