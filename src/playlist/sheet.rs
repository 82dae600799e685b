//! Spreadsheet readers for song lists.

use calamine::{open_workbook_auto, Data, Reader};
use std::fs::File;
use std::path::Path;

use super::PlaylistError;
use crate::table::{CellValue, Table};

/// Extensions handled by calamine.
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Loads the first sheet of a workbook, or a CSV file, as a table.
/// The first row holds the column names.
pub fn read_sheet(path: &Path) -> Result<Table, PlaylistError> {
    match extension_of(path).as_deref() {
        Some("csv") => read_csv(path),
        Some(ext) if WORKBOOK_EXTENSIONS.contains(&ext) => read_workbook(path),
        _ => Err(PlaylistError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn read_csv(path: &Path) -> Result<Table, PlaylistError> {
    let file = File::open(path).map_err(|e| PlaylistError::Sheet {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Table::from_csv_reader(file).map_err(|e| PlaylistError::Sheet {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        // Spreadsheets store every number as a float
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            CellValue::Int(*f as i64)
        }
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

fn read_workbook(path: &Path) -> Result<Table, PlaylistError> {
    let sheet_error = |message: String| PlaylistError::Sheet {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| sheet_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| sheet_error("Workbook has no sheets".to_string()))?
        .map_err(|e| sheet_error(e.to_string()))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| sheet_error("Sheet is empty".to_string()))?;
    let mut table = Table::new(header.iter().map(|c| c.to_string()));

    for row in rows {
        let cells: Vec<CellValue> = row.iter().map(cell_value).collect();
        // Fully blank rows inside the used range are not songs
        if cells.iter().all(CellValue::is_empty) {
            continue;
        }
        table
            .push_row(cells)
            .map_err(|e| sheet_error(e.to_string()))?;
    }
    Ok(table)
}
