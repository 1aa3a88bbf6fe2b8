use crate::dataset::Cell;
use crate::domain::Side;
use crate::numerics::{Tolerance, format_numeric};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Rows and values listed per mismatch before the report truncates.
pub const MAX_REPORTED_SAMPLES: usize = 10;

/// Outcome of comparing one set of columns between the two datasets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub label: String,
    pub columns: Vec<String>,
    pub tolerance: Tolerance,
    pub expected_rows: usize,
    pub calculated_rows: usize,
    pub aligned_rows: usize,
    pub expected_only_rows: UnmatchedRows,
    pub calculated_only_rows: UnmatchedRows,
    pub expected_only_columns: Vec<String>,
    pub calculated_only_columns: Vec<String>,
    pub column_mismatches: Vec<ColumnMismatch>,
}

impl GroupReport {
    pub fn matched(&self) -> bool {
        self.expected_only_rows.count == 0
            && self.calculated_only_rows.count == 0
            && self.expected_only_columns.is_empty()
            && self.calculated_only_columns.is_empty()
            && self.column_mismatches.is_empty()
    }

    pub fn unmatched_rows(&self, side: Side) -> &UnmatchedRows {
        match side {
            Side::Expected => &self.expected_only_rows,
            Side::Calculated => &self.calculated_only_rows,
        }
    }
}

/// Rows whose key exists on one side only; `keys` holds the first few.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UnmatchedRows {
    pub count: usize,
    pub keys: Vec<Vec<String>>,
}

impl UnmatchedRows {
    pub(crate) fn push(&mut self, key: Vec<String>) {
        self.count += 1;
        if self.keys.len() < MAX_REPORTED_SAMPLES {
            self.keys.push(key);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMismatch {
    pub column: String,
    pub mismatched_rows: usize,
    pub max_abs_diff: Option<f64>,
    pub samples: Vec<ValueDelta>,
}

impl ColumnMismatch {
    pub(crate) fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            mismatched_rows: 0,
            max_abs_diff: None,
            samples: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, delta: ValueDelta) {
        self.mismatched_rows += 1;
        if let Some(diff) = delta.abs_diff {
            self.max_abs_diff = Some(self.max_abs_diff.map_or(diff, |max| max.max(diff)));
        }
        if self.samples.len() < MAX_REPORTED_SAMPLES {
            self.samples.push(delta);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueDelta {
    pub key: Vec<String>,
    pub expected: Cell,
    pub calculated: Cell,
    pub abs_diff: Option<f64>,
}

impl Display for GroupReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let status = if self.matched() { "MATCH" } else { "MISMATCH" };
        writeln!(f, "{}: {}", self.label, status)?;
        writeln!(f, "  columns: {}", self.columns.join(", "))?;
        writeln!(
            f,
            "  tolerance: abs_tol={} rel_tol={}",
            format_numeric(self.tolerance.abs_tol),
            format_numeric(self.tolerance.rel_tol)
        )?;
        writeln!(
            f,
            "  rows: expected={} calculated={} aligned={}",
            self.expected_rows, self.calculated_rows, self.aligned_rows
        )?;

        for (side, columns) in [
            (Side::Expected, &self.expected_only_columns),
            (Side::Calculated, &self.calculated_only_columns),
        ] {
            if !columns.is_empty() {
                writeln!(f, "  columns only in {}: {}", side, columns.join(", "))?;
            }
        }

        for side in Side::BOTH {
            let rows = self.unmatched_rows(side);
            if rows.count == 0 {
                continue;
            }
            writeln!(f, "  rows only in {}: {}", side, rows.count)?;
            for key in &rows.keys {
                writeln!(f, "    key=({})", key.join(", "))?;
            }
            if rows.count > rows.keys.len() {
                writeln!(f, "    ... {} more", rows.count - rows.keys.len())?;
            }
        }

        for mismatch in &self.column_mismatches {
            write!(
                f,
                "  column '{}': {} row(s) differ",
                mismatch.column, mismatch.mismatched_rows
            )?;
            match mismatch.max_abs_diff {
                Some(max) => writeln!(f, ", max_abs_diff={}", format_numeric(max))?,
                None => writeln!(f)?,
            }
            for sample in &mismatch.samples {
                write!(
                    f,
                    "    key=({}) expected={} calculated={}",
                    sample.key.join(", "),
                    sample.expected,
                    sample.calculated
                )?;
                match sample.abs_diff {
                    Some(diff) => writeln!(f, " abs_diff={}", format_numeric(diff))?,
                    None => writeln!(f)?,
                }
            }
            if mismatch.mismatched_rows > mismatch.samples.len() {
                writeln!(
                    f,
                    "    ... {} more",
                    mismatch.mismatched_rows - mismatch.samples.len()
                )?;
            }
        }

        Ok(())
    }
}
