//! CSV load/save for [`Table`].

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use tracing::debug;

use crate::core::table::{Row, Table};

/// Field values read as null (after trimming), in addition to the empty string.
const MISSING_TOKENS: [&str; 12] = [
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

fn to_cell(field: &str) -> Option<String> {
    let trimmed = field.trim();
    if trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed) {
        None
    } else {
        Some(field.to_string())
    }
}

/// Read a CSV file with a header row into a table.
pub fn read_table(path: &Path) -> Result<Table> {
    debug!(path = %path.display(), "reading csv");
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows: Vec<Row> = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("parse {} data row {}", path.display(), index + 1))?;
        rows.push(record.iter().map(to_cell).collect());
    }

    let table =
        Table::new(headers, rows).with_context(|| format!("load table {}", path.display()))?;
    debug!(rows = table.len(), columns = table.headers().len(), "csv loaded");
    Ok(table)
}

/// Write a table as CSV (temp file + rename); null cells become empty fields.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("csv.tmp");
    {
        let mut writer = WriterBuilder::new()
            .from_path(&tmp_path)
            .with_context(|| format!("create {}", tmp_path.display()))?;
        writer
            .write_record(table.headers())
            .context("write csv header")?;
        for (index, row) in table.rows().iter().enumerate() {
            writer
                .write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))
                .with_context(|| format!("write csv row {}", index + 1))?;
        }
        writer
            .flush()
            .with_context(|| format!("flush {}", tmp_path.display()))?;
    }
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    debug!(path = %path.display(), rows = table.len(), "csv written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::table;

    #[test]
    fn missing_tokens_become_null() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("in.csv");
        fs::write(&path, "a,b,c\n1,,NaN\n N/A ,x,null\n").expect("write");

        let loaded = read_table(&path).expect("read");
        assert_eq!(
            loaded,
            table(
                &["a", "b", "c"],
                &[&[Some("1"), None, None], &[None, Some("x"), None]]
            )
        );
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("in.csv");
        fs::write(&path, "a,b\n1,2\n3\n").expect("write");
        let err = read_table(&path).unwrap_err();
        assert!(format!("{err:#}").contains("data row 2"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(read_table(&temp.path().join("absent.csv")).is_err());
    }

    #[test]
    fn write_quotes_fields_and_blanks_nulls() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("out/clean.csv");
        let t = table(
            &["name", "price"],
            &[&[Some("Loft, sunny"), Some("50")], &[None, Some("75")]],
        );
        write_table(&path, &t).expect("write");

        let written = fs::read_to_string(&path).expect("read");
        assert_eq!(written, "name,price\n\"Loft, sunny\",50\n,75\n");
        assert!(!path.with_extension("csv.tmp").exists());
        assert_eq!(read_table(&path).expect("reread"), t);
    }
}
