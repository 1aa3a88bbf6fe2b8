use super::{Cell, Column, Dataset, unify_column};
use crate::config::ColumnType;
use crate::sink::DiagnosticSink;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const SIMM_JSON_FILE_NAME: &str = "simm.json";
pub const SIMM_REPORT_FIELD: &str = "simmReport";
const PORTFOLIO_COLUMN: &str = "portfolio";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("file '{}' is neither a csv nor a json file so cannot create a dataset", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("expected simm json file '{}' to contain the field simmReport", path.display())]
    UnsupportedContent { path: PathBuf },
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse delimited file '{}': {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("failed to parse json file '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(
        "value '{value}' in column '{column}' (row {row}) of '{}' is not a valid {expected:?}",
        path.display()
    )]
    CellType {
        path: PathBuf,
        column: String,
        row: usize,
        value: String,
        expected: ColumnType,
    },
    #[error("malformed dataset in '{}': {source}", path.display())]
    Shape {
        path: PathBuf,
        source: super::RaggedColumns,
    },
}

/// Reads one file into a [`Dataset`].
///
/// `.csv` and `.txt` files are parsed as comma-delimited text with a header
/// row; `simm.json` must carry a `simmReport` array of records. Anything else
/// is [`LoadError::UnsupportedFormat`]. Nothing is cached between calls.
pub fn load_dataset(
    path: &Path,
    col_types: Option<&BTreeMap<String, ColumnType>>,
    sink: &dyn DiagnosticSink,
) -> Result<Dataset, LoadError> {
    sink.debug(&format!(
        "Start creating dataset from file {}.",
        path.display()
    ));

    let extension = path.extension().and_then(|ext| ext.to_str());
    let file_name = path.file_name().and_then(|name| name.to_str());

    let dataset = match (extension, file_name) {
        (Some("csv" | "txt"), _) => {
            sink.debug(&format!(
                "Creating dataset from delimited file {}.",
                path.display()
            ));
            load_delimited(path, col_types)?
        }
        (Some("json"), Some(SIMM_JSON_FILE_NAME)) => {
            sink.debug(&format!(
                "Creating dataset from simm json file {}.",
                path.display()
            ));
            load_simm_json(path)?
        }
        _ => {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    sink.debug(&format!(
        "Finished creating dataset from file {} ({} columns, {} rows).",
        path.display(),
        dataset.column_count(),
        dataset.row_count()
    ));
    Ok(dataset)
}

fn load_delimited(
    path: &Path,
    col_types: Option<&BTreeMap<String, ColumnType>>,
) -> Result<Dataset, LoadError> {
    let csv_error = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(csv_error)?;
    let headers = dedupe_headers(reader.headers().map_err(csv_error)?.iter());

    let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        for (column, field) in raw_columns.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    let mut columns = Vec::with_capacity(headers.len());
    for (name, raw) in headers.into_iter().zip(raw_columns) {
        let forced = col_types.and_then(|types| types.get(&name).copied());
        let mut cells = Vec::with_capacity(raw.len());
        for (row, value) in raw.iter().enumerate() {
            let cell = Cell::parse(value, forced).map_err(|expected| LoadError::CellType {
                path: path.to_path_buf(),
                column: name.clone(),
                row: row + 1,
                value: value.clone(),
                expected,
            })?;
            cells.push(cell);
        }
        let cells = if forced.is_some() {
            cells
        } else {
            unify_column(&raw, cells)
        };
        columns.push(Column::new(name, cells));
    }

    Dataset::from_columns(columns).map_err(|source| LoadError::Shape {
        path: path.to_path_buf(),
        source,
    })
}

/// Repeated header names get a `.N` suffix so every column stays addressable.
fn dedupe_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut names = Vec::new();
    for header in headers {
        let count = seen.entry(header.to_string()).or_insert(0);
        if *count == 0 {
            names.push(header.to_string());
        } else {
            names.push(format!("{header}.{count}"));
        }
        *count += 1;
    }
    names
}

fn load_simm_json(path: &Path) -> Result<Dataset, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let Some(Value::Array(records)) = document.get(SIMM_REPORT_FIELD) else {
        return Err(LoadError::UnsupportedContent {
            path: path.to_path_buf(),
        });
    };

    let mut names: Vec<String> = Vec::new();
    for record in records {
        if let Value::Object(fields) = record {
            for key in fields.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let cells = records
                .iter()
                .map(|record| {
                    let cell = record.get(&name).map_or(Cell::Missing, json_cell);
                    // Blank netting set ids arrive as "" here but as empty
                    // fields in the csv sibling; align them on missing.
                    match cell {
                        Cell::Text(text) if name == PORTFOLIO_COLUMN && text.is_empty() => {
                            Cell::Missing
                        }
                        other => other,
                    }
                })
                .collect();
            Column::new(name, cells)
        })
        .collect();

    Dataset::from_columns(columns).map_err(|source| LoadError::Shape {
        path: path.to_path_buf(),
        source,
    })
}

fn json_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Missing,
        Value::Bool(flag) => Cell::Bool(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => Cell::Int(integer),
            None => number.as_f64().map_or(Cell::Missing, Cell::Float),
        },
        Value::String(text) => Cell::Text(text.clone()),
        nested => Cell::Text(nested.to_string()),
    }
}
