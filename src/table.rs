//! In-memory tabular data shared by the song lists and the database helpers.

use serde::Serialize;
use std::fmt;
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Row has {actual} cells, expected {expected}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A single cell. Serializes to the plain JSON value (`null` for empty cells).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Sniffs the most specific value out of a piece of text.
    pub fn parse_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return CellValue::Float(f);
            }
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => CellValue::Bool(true),
            "false" => CellValue::Bool(false),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    /// Keeps text as it is. Only blank text becomes an empty cell.
    pub fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Ordered column names plus rows. Every row is exactly `columns.len()` wide.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::WidthMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Removes a column and its cells from every row.
    pub fn drop_column(&mut self, name: &str) -> Result<(), TableError> {
        let index = self
            .column_index(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))?;
        self.columns.remove(index);
        for row in self.rows.iter_mut() {
            row.remove(index);
        }
        Ok(())
    }

    /// Reads a CSV document whose first record holds the column names, sniffing
    /// the type of every cell. Short records are padded with empty cells.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        Self::read_csv(reader, CellValue::parse_text)
    }

    /// Like [`Table::from_csv_reader`], but every non-blank cell stays text.
    pub fn from_csv_text_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        Self::read_csv(reader, CellValue::from_text)
    }

    fn read_csv<R: Read>(reader: R, parse: fn(&str) -> CellValue) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut table = Table::new(reader.headers()?.iter());
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<CellValue> = record.iter().map(parse).collect();
            if row.len() < table.width() {
                row.resize(table.width(), CellValue::Empty);
            }
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Writes the header and every row as CSV. Empty cells become empty fields.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}
