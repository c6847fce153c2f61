//! Delimited text reader (csv/tsv).

use anyhow::{Context, Result};
use std::path::Path;

use super::{Cell, LoadedTable};

/// Read a delimited file into a table. The first record is the header.
pub fn read_delimited(path: &Path, delimiter: u8) -> Result<LoadedTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("Failed to open table file: {:?}", path))?;

    let mut table = LoadedTable::default();
    let mut first = true;

    for result in reader.records() {
        let record = result.with_context(|| format!("Failed to read record from {:?}", path))?;
        let cells: Vec<Cell> = record.iter().map(Cell::text).collect();

        if first {
            table.header = cells.into_iter().map(|c| c.to_string_value()).collect();
            first = false;
        } else {
            table.rows.push(cells);
        }
    }

    Ok(table)
}
