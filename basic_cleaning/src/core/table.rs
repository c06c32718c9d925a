//! In-memory row collection: named columns over rows of nullable text cells.
//!
//! Cells keep their original text so untouched columns are written back
//! byte-for-byte. Typed views (`numeric_column`) are computed on demand.

use crate::core::error::CleanError;

/// One record; `None` is a null cell.
pub type Row = Vec<Option<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table, rejecting rows whose width differs from the header.
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Result<Self, CleanError> {
        for (index, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(CleanError::RaggedRow {
                    row: index + 1,
                    expected: headers.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, CleanError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| CleanError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Cells of column `index`, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows.iter().map(move |row| row[index].as_deref())
    }

    /// Parse every non-null cell of `name` as `f64`.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>, CleanError> {
        let index = self.column_index(name)?;
        self.column(index)
            .enumerate()
            .map(|(row, cell)| match cell {
                None => Ok(None),
                Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| {
                    CleanError::NonNumeric {
                        column: name.to_string(),
                        row: row + 1,
                        value: raw.to_string(),
                    }
                }),
            })
            .collect()
    }

    /// Keep rows whose `keep` entry is true, preserving order.
    ///
    /// Returns the number of rows dropped.
    pub fn retain(&mut self, keep: &[bool]) -> usize {
        debug_assert_eq!(keep.len(), self.rows.len());
        let before = self.rows.len();
        let mut flags = keep.iter();
        self.rows.retain(|_| flags.next().copied().unwrap_or(false));
        before - self.rows.len()
    }

    /// Replace null cells in column `index` with `value`; returns the count filled.
    pub fn fill_nulls(&mut self, index: usize, value: &str) -> usize {
        let mut filled = 0;
        for row in &mut self.rows {
            if row[index].is_none() {
                row[index] = Some(value.to_string());
                filled += 1;
            }
        }
        filled
    }

    /// Rewrite every cell of column `index` with `f`.
    pub fn map_column<F>(&mut self, index: usize, mut f: F)
    where
        F: FnMut(Option<&str>) -> Option<String>,
    {
        for row in &mut self.rows {
            row[index] = f(row[index].as_deref());
        }
    }
}
