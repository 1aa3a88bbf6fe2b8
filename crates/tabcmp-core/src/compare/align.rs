//! Key-aligned row matching and per-cell tolerance checks.

use super::report::{ColumnMismatch, GroupReport, UnmatchedRows, ValueDelta};
use crate::dataset::{Cell, Dataset};
use crate::numerics::{Tolerance, compare_with_tolerance};
use std::collections::BTreeMap;

/// Row pairing between the two datasets, by key tuple.
///
/// The n-th occurrence of a key on one side pairs with the n-th occurrence
/// on the other; leftovers are one-sided rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Alignment {
    pub pairs: Vec<(usize, usize)>,
    pub expected_only: Vec<usize>,
    pub calculated_only: Vec<usize>,
}

pub(crate) fn row_key(dataset: &Dataset, keys: &[String], row: usize) -> Vec<String> {
    keys.iter()
        .map(|key| {
            dataset
                .column(key)
                .and_then(|column| column.cells.get(row))
                .map_or_else(|| Cell::Missing.to_string(), ToString::to_string)
        })
        .collect()
}

pub(crate) fn align_rows(expected: &Dataset, calculated: &Dataset, keys: &[String]) -> Alignment {
    let mut calculated_rows: BTreeMap<Vec<String>, Vec<usize>> = BTreeMap::new();
    for row in 0..calculated.row_count() {
        calculated_rows
            .entry(row_key(calculated, keys, row))
            .or_default()
            .push(row);
    }

    let mut consumed = vec![false; calculated.row_count()];
    let mut occurrences: BTreeMap<Vec<String>, usize> = BTreeMap::new();
    let mut alignment = Alignment::default();

    for row in 0..expected.row_count() {
        let key = row_key(expected, keys, row);
        let occurrence = occurrences.entry(key.clone()).or_insert(0);
        let partner = calculated_rows
            .get(&key)
            .and_then(|rows| rows.get(*occurrence))
            .copied();
        *occurrence += 1;

        match partner {
            Some(calculated_row) => {
                consumed[calculated_row] = true;
                alignment.pairs.push((row, calculated_row));
            }
            None => alignment.expected_only.push(row),
        }
    }

    alignment.calculated_only = consumed
        .iter()
        .enumerate()
        .filter(|(_, used)| !**used)
        .map(|(row, _)| row)
        .collect();
    alignment
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CellComparison {
    pub passes: bool,
    pub abs_diff: Option<f64>,
}

/// Numeric cells use the tolerance; everything else needs equal values.
pub(crate) fn compare_cells(expected: &Cell, calculated: &Cell, tolerance: Tolerance) -> CellComparison {
    match (expected, calculated) {
        (Cell::Missing, Cell::Missing) => CellComparison {
            passes: true,
            abs_diff: None,
        },
        (Cell::Missing, _) | (_, Cell::Missing) => CellComparison {
            passes: false,
            abs_diff: None,
        },
        _ => match (expected.as_f64(), calculated.as_f64()) {
            (Some(expected_value), Some(calculated_value)) => {
                let comparison =
                    compare_with_tolerance(expected_value, calculated_value, tolerance);
                CellComparison {
                    passes: comparison.passes,
                    abs_diff: Some(comparison.abs_diff),
                }
            }
            _ => CellComparison {
                passes: expected == calculated || expected.to_string() == calculated.to_string(),
                abs_diff: None,
            },
        },
    }
}

/// Compares `columns` on key-aligned rows.
///
/// Columns missing from either dataset are listed as one-sided columns in
/// the report instead of being compared.
pub(crate) fn compare_columns(
    label: impl Into<String>,
    expected: &Dataset,
    calculated: &Dataset,
    keys: &[String],
    columns: &[String],
    tolerance: Tolerance,
) -> GroupReport {
    let alignment = align_rows(expected, calculated, keys);

    let mut expected_only_rows = UnmatchedRows::default();
    for &row in &alignment.expected_only {
        expected_only_rows.push(row_key(expected, keys, row));
    }
    let mut calculated_only_rows = UnmatchedRows::default();
    for &row in &alignment.calculated_only {
        calculated_only_rows.push(row_key(calculated, keys, row));
    }

    let mut column_mismatches = Vec::new();
    let mut expected_only_columns = Vec::new();
    let mut calculated_only_columns = Vec::new();

    for name in columns {
        let (expected_column, calculated_column) =
            match (expected.column(name), calculated.column(name)) {
                (Some(left), Some(right)) => (left, right),
                (Some(_), None) => {
                    expected_only_columns.push(name.clone());
                    continue;
                }
                (None, Some(_)) => {
                    calculated_only_columns.push(name.clone());
                    continue;
                }
                (None, None) => continue,
            };

        let mut mismatch = ColumnMismatch::new(name.clone());
        for &(expected_row, calculated_row) in &alignment.pairs {
            let expected_cell = &expected_column.cells[expected_row];
            let calculated_cell = &calculated_column.cells[calculated_row];
            let comparison = compare_cells(expected_cell, calculated_cell, tolerance);
            if !comparison.passes {
                mismatch.record(ValueDelta {
                    key: row_key(expected, keys, expected_row),
                    expected: expected_cell.clone(),
                    calculated: calculated_cell.clone(),
                    abs_diff: comparison.abs_diff,
                });
            }
        }
        if mismatch.mismatched_rows > 0 {
            column_mismatches.push(mismatch);
        }
    }

    GroupReport {
        label: label.into(),
        columns: columns.to_vec(),
        tolerance,
        expected_rows: expected.row_count(),
        calculated_rows: calculated.row_count(),
        aligned_rows: alignment.pairs.len(),
        expected_only_rows,
        calculated_only_rows,
        expected_only_columns,
        calculated_only_columns,
        column_mismatches,
    }
}
