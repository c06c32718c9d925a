//! Data-format errors raised by the cleaning core.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CleanError {
    #[error("missing required column '{column}'")]
    MissingColumn { column: String },

    /// `row` is the 1-based data row (header excluded).
    #[error("column '{column}' is not numeric: row {row} has value '{value}'")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid price range [{min}, {max}]: bounds must be finite and min <= max")]
    InvalidPriceRange { min: f64, max: f64 },
}
