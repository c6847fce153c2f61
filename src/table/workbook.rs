//! Spreadsheet workbook reader (xlsx/xls/ods) via calamine.

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

use super::{Cell, LoadedTable};

/// Read one sheet of a workbook into a table. The first row is the header.
///
/// `sheet` selects by name; `None` takes the first sheet. A missing sheet is
/// an error so a typo'd name aborts the reload instead of syncing nothing.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<LoadedTable> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Failed to open workbook: {:?}", path))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .with_context(|| format!("Workbook has no sheets: {:?}", path))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Sheet '{}' not found in {:?}", sheet_name, path))?;

    let mut table = LoadedTable::default();
    let mut first = true;

    for row in range.rows() {
        let cells: Vec<Cell> = row.iter().map(convert_cell).collect();

        if first {
            table.header = cells.into_iter().map(|c| c.to_string_value()).collect();
            first = false;
        } else {
            table.rows.push(cells);
        }
    }

    Ok(table)
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Int(*i),
        Data::Bool(b) => Cell::Bool(*b),
        // Formula errors read as blanks; a #REF! cell should not become a name
        Data::Error(_) => Cell::Empty,
        other => Cell::text(&other.to_string()),
    }
}
