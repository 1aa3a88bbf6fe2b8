//! In-memory tabular dataset: ordered, named columns of typed cells.

pub mod loader;

pub use loader::{LoadError, load_dataset};

use crate::config::ColumnType;
use crate::numerics::format_numeric;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Field values read as missing, mirroring the usual CSV null markers.
pub const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Missing,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Parses one raw field, honouring a forced column type when present.
    pub fn parse(raw: &str, column_type: Option<ColumnType>) -> Result<Self, ColumnType> {
        if is_missing_marker(raw) {
            return Ok(Self::Missing);
        }

        match column_type {
            None => Ok(infer_cell(raw)),
            Some(ColumnType::String) => Ok(Self::Text(raw.to_string())),
            Some(ColumnType::Int) => parse_int(raw)
                .map(Self::Int)
                .ok_or(ColumnType::Int),
            Some(ColumnType::Float) => parse_float(raw)
                .map(Self::Float)
                .ok_or(ColumnType::Float),
            Some(ColumnType::Bool) => parse_bool(raw)
                .map(Self::Bool)
                .ok_or(ColumnType::Bool),
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("<missing>"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => f.write_str(&format_numeric(*value)),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }
}

/// Ordered set of equally long columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, RaggedColumns> {
        let row_count = columns.first().map_or(0, |column| column.cells.len());
        if let Some(column) = columns
            .iter()
            .find(|column| column.cells.len() != row_count)
        {
            return Err(RaggedColumns {
                column: column.name.clone(),
                expected: row_count,
                actual: column.cells.len(),
            });
        }
        Ok(Self { columns, row_count })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name == name)
    }

    pub fn has_columns<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.iter().all(|name| self.has_column(name.as_ref()))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Drops a leading `#` from the first column name, once.
    pub fn strip_header_marker(&mut self) -> bool {
        match self.columns.first_mut() {
            Some(first) if first.name.starts_with('#') => {
                first.name.remove(0);
                true
            }
            _ => false,
        }
    }

    /// Applies `old -> new` renames simultaneously; unknown names are ignored.
    pub fn rename_columns(&mut self, renames: &BTreeMap<String, String>) {
        for column in &mut self.columns {
            if let Some(new_name) = renames.get(&column.name) {
                column.name = new_name.clone();
            }
        }
    }

    /// Keeps rows whose mask entry is `true`.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column
                .cells
                .retain(|_| flags.next().copied().unwrap_or(false));
        }
        self.row_count = keep.iter().take(self.row_count).filter(|flag| **flag).count();
    }

    /// Reduces the dataset to `names`, in that order. Unknown names are skipped.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let columns = names
            .iter()
            .filter_map(|name| self.column(name.as_ref()).cloned())
            .collect();
        Self {
            columns,
            row_count: self.row_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("column '{column}' has {actual} rows, expected {expected}")]
pub struct RaggedColumns {
    pub column: String,
    pub expected: usize,
    pub actual: usize,
}

pub fn is_missing_marker(raw: &str) -> bool {
    MISSING_MARKERS.contains(&raw)
}

fn infer_cell(raw: &str) -> Cell {
    if let Some(value) = parse_int(raw) {
        Cell::Int(value)
    } else if let Some(value) = parse_float(raw) {
        Cell::Float(value)
    } else if let Some(value) = parse_bool(raw) {
        Cell::Bool(value)
    } else {
        Cell::Text(raw.to_string())
    }
}

fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Unifies per-cell inference into one type per column: integer columns stay
/// integers, any float promotes the column, and mixed kinds fall back to text.
pub(crate) fn unify_column(raw: &[String], cells: Vec<Cell>) -> Vec<Cell> {
    if present(&cells).all(|cell| matches!(cell, Cell::Int(_))) {
        return cells;
    }
    if present(&cells).all(Cell::is_numeric) {
        return cells
            .into_iter()
            .map(|cell| match cell {
                Cell::Int(value) => Cell::Float(value as f64),
                other => other,
            })
            .collect();
    }
    if present(&cells).all(|cell| matches!(cell, Cell::Bool(_))) {
        return cells;
    }
    cells
        .into_iter()
        .zip(raw)
        .map(|(cell, raw)| match cell {
            Cell::Missing => Cell::Missing,
            Cell::Text(text) => Cell::Text(text),
            _ => Cell::Text(raw.clone()),
        })
        .collect()
}

fn present(cells: &[Cell]) -> impl Iterator<Item = &Cell> {
    cells.iter().filter(|cell| !cell.is_missing())
}
