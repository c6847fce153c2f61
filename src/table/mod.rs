//! Tabular input readers.
//!
//! Production data arrives as delimited text or spreadsheet workbooks. Both
//! readers load eagerly into a [`LoadedTable`]; the [`ProductTable`] trait is
//! the surface the sync layer consumes, so tests can hand-roll tables without
//! touching the filesystem.

mod delimited;
mod workbook;

use anyhow::Result;
use std::path::Path;

/// One table cell, typed as far as the source format allows.
///
/// Delimited sources only ever produce `Text`/`Empty`; workbooks add numbers
/// and bools. Whitespace-only text collapses to `Empty`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Int(i64),
    Bool(bool),
}

impl Cell {
    /// Build a text cell, trimming and collapsing blank input to `Empty`.
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    /// Stringify the cell the way it would read in the sheet.
    ///
    /// `None` for empty cells. Whole-number floats drop the fraction so a
    /// spreadsheet `16` does not become `"16.0"` in names.
    pub fn to_string_value(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    Some(format!("{}", *f as i64))
                } else {
                    Some(format!("{}", f))
                }
            }
            Cell::Int(i) => Some(i.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }
}

/// A loaded production table: header row plus data rows.
pub trait ProductTable {
    /// Header cells in column order; `None` for blank header cells.
    fn header(&self) -> &[Option<String>];

    /// Data rows after the header.
    fn rows(&self) -> &[Vec<Cell>];
}

/// In-memory table produced by the file readers.
#[derive(Debug, Clone, Default)]
pub struct LoadedTable {
    pub header: Vec<Option<String>>,
    pub rows: Vec<Vec<Cell>>,
}

impl ProductTable for LoadedTable {
    fn header(&self) -> &[Option<String>] {
        &self.header
    }

    fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }
}

/// Open a table file, choosing the reader by extension.
///
/// `sheet` selects a workbook sheet by name (first sheet when `None`) and is
/// ignored for delimited files. `delimiter` overrides the extension default
/// (`,` for csv, tab for tsv/txt).
pub fn open_table(path: &Path, sheet: Option<&str>, delimiter: Option<u8>) -> Result<LoadedTable> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => delimited::read_delimited(path, delimiter.unwrap_or(b',')),
        "tsv" | "txt" => delimited::read_delimited(path, delimiter.unwrap_or(b'\t')),
        "xlsx" | "xlsm" | "xls" | "ods" => workbook::read_workbook(path, sheet),
        other => anyhow::bail!("Unsupported table format '{}': {:?}", other, path),
    }
}
