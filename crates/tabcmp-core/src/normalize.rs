//! Rule-driven preparation of a dataset pair before comparison.

use crate::compare::{Issue, duplicated};
use crate::config::{DropRows, FileRule};
use crate::dataset::Dataset;
use crate::domain::Side;
use crate::sink::DiagnosticSink;

/// Both datasets after normalization, with the validated key list.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPair {
    pub expected: Dataset,
    pub calculated: Dataset,
    pub keys: Vec<String>,
}

/// Checks the rule's key list on its own, without looking at any data.
pub fn validate_key_list(rule: &FileRule) -> Result<Vec<String>, Issue> {
    let keys = rule.keys.as_ref().ok_or(Issue::MissingKeys)?;
    if keys.is_empty() || keys.iter().any(String::is_empty) {
        return Err(Issue::InvalidKeys { keys: keys.clone() });
    }
    let duplicates = duplicated(keys);
    if !duplicates.is_empty() {
        return Err(Issue::DuplicateKeys {
            keys: keys.clone(),
            duplicates,
        });
    }
    Ok(keys.clone())
}

/// Applies `rule` to both datasets: header strip, renames, row filtering,
/// key checks and column subsetting, in that order.
///
/// The first failing step ends normalization; its [`Issue`] is also sent to
/// `sink` as a warning.
pub fn normalize_pair(
    mut expected: Dataset,
    mut calculated: Dataset,
    rule: &FileRule,
    sink: &dyn DiagnosticSink,
) -> Result<NormalizedPair, Issue> {
    let result = normalize_in_place(&mut expected, &mut calculated, rule, sink);
    match result {
        Ok(keys) => Ok(NormalizedPair {
            expected,
            calculated,
            keys,
        }),
        Err(issue) => {
            sink.warning(&issue.sentence());
            Err(issue)
        }
    }
}

fn normalize_in_place(
    expected: &mut Dataset,
    calculated: &mut Dataset,
    rule: &FileRule,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<String>, Issue> {
    expected.strip_header_marker();
    calculated.strip_header_marker();

    if let Some(renames) = &rule.rename_cols {
        sink.debug(&format!(
            "Applying column renaming, {renames:?}, to both datasets."
        ));
        expected.rename_columns(renames);
        calculated.rename_columns(renames);
    }

    if let Some(drop_rows) = &rule.drop_rows {
        for (side, dataset) in [(Side::Expected, &*expected), (Side::Calculated, &*calculated)] {
            if !dataset.has_columns(&drop_rows.cols) {
                return Err(Issue::DropRowsColumnsMissing {
                    side,
                    columns: drop_rows.cols.clone(),
                });
            }
        }
        apply_drop_rows(expected, drop_rows);
        apply_drop_rows(calculated, drop_rows);
    }

    let keys = validate_key_list(rule)?;
    for (side, dataset) in [(Side::Expected, &*expected), (Side::Calculated, &*calculated)] {
        if !dataset.has_columns(&keys) {
            return Err(Issue::KeyColumnsMissing {
                side,
                keys: keys.clone(),
            });
        }
    }

    if let Some(use_cols) = &rule.use_cols {
        sink.debug(&format!(
            "Only the columns, {use_cols:?}, are used in the comparison."
        ));
        let mut selected = use_cols.clone();
        selected.extend(keys.iter().cloned());
        for (side, dataset) in [(Side::Expected, &*expected), (Side::Calculated, &*calculated)] {
            if !dataset.has_columns(&selected) {
                return Err(Issue::UseColsMissing {
                    side,
                    columns: selected,
                });
            }
        }
        *expected = expected.select(&selected);
        *calculated = calculated.select(&selected);
    }

    Ok(keys)
}

/// Keeps rows where some listed column's magnitude exceeds the threshold.
fn apply_drop_rows(dataset: &mut Dataset, drop_rows: &DropRows) {
    let keep: Vec<bool> = (0..dataset.row_count())
        .map(|row| {
            drop_rows.cols.iter().any(|name| {
                dataset
                    .column(name)
                    .and_then(|column| column.cells.get(row))
                    .and_then(|cell| cell.as_f64())
                    .is_some_and(|value| value.abs() > drop_rows.threshold)
            })
        })
        .collect();
    dataset.retain_rows(&keep);
}

#[cfg(test)]
mod tests {
    use super::{normalize_pair, validate_key_list};
    use crate::compare::Issue;
    use crate::config::{DropRows, FileRule};
    use crate::dataset::{Cell, Column, Dataset};
    use crate::domain::Side;
    use crate::sink::{RecordingSink, Severity};
    use std::collections::BTreeMap;

    fn text(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|value| Cell::Text(value.to_string())).collect()
    }

    fn floats(values: &[f64]) -> Vec<Cell> {
        values.iter().copied().map(Cell::Float).collect()
    }

    fn sensitivities() -> Dataset {
        Dataset::from_columns(vec![
            Column::new("#TradeId", text(&["T1", "T2", "T3", "T4"])),
            Column::new("Delta", floats(&[0.0, 5.0, -0.5, 0.2])),
            Column::new("Gamma", floats(&[0.1, 0.0, 0.0, -3.0])),
            Column::new("Currency", text(&["EUR", "USD", "GBP", "JPY"])),
        ])
        .expect("columns have equal length")
    }

    fn keyed_rule() -> FileRule {
        FileRule {
            keys: Some(vec!["TradeId".to_string()]),
            ..FileRule::default()
        }
    }

    #[test]
    fn strips_header_marker_once() {
        let mut dataset = sensitivities();
        assert!(dataset.strip_header_marker());
        assert!(!dataset.strip_header_marker());
        assert_eq!(dataset.column_names()[0], "TradeId");

        let pair = normalize_pair(dataset.clone(), dataset, &keyed_rule(), &RecordingSink::new())
            .expect("normalization should succeed");
        assert_eq!(pair.expected.column_names()[0], "TradeId");
    }

    #[test]
    fn renames_apply_before_key_checks() {
        let mut renames = BTreeMap::new();
        renames.insert("TradeId".to_string(), "Id".to_string());
        let rule = FileRule {
            rename_cols: Some(renames),
            keys: Some(vec!["Id".to_string()]),
            ..FileRule::default()
        };

        let pair = normalize_pair(sensitivities(), sensitivities(), &rule, &RecordingSink::new())
            .expect("renamed key should be found");
        assert_eq!(pair.keys, vec!["Id".to_string()]);
        assert!(pair.calculated.has_column("Id"));
    }

    #[test]
    fn drop_rows_removes_rows_within_threshold_on_every_column() {
        let rule = FileRule {
            drop_rows: Some(DropRows {
                cols: vec!["Delta".to_string(), "Gamma".to_string()],
                threshold: 0.2,
            }),
            ..keyed_rule()
        };

        let pair = normalize_pair(sensitivities(), sensitivities(), &rule, &RecordingSink::new())
            .expect("normalization should succeed");
        // only T1 has both columns inside [-0.2, 0.2]
        let ids = &pair.expected.column("TradeId").expect("key column").cells;
        assert_eq!(ids, &text(&["T2", "T3", "T4"]));
        assert_eq!(pair.expected.row_count(), 3);
        assert_eq!(pair.calculated.row_count(), 3);
    }

    #[test]
    fn drop_rows_threshold_is_exclusive_and_drops_missing_values() {
        let dataset = Dataset::from_columns(vec![
            Column::new("Id", text(&["a", "b", "c"])),
            Column::new("v", vec![Cell::Float(1.0), Cell::Missing, Cell::Float(1.5)]),
        ])
        .expect("columns have equal length");
        let rule = FileRule {
            keys: Some(vec!["Id".to_string()]),
            drop_rows: Some(DropRows {
                cols: vec!["v".to_string()],
                threshold: 1.0,
            }),
            ..FileRule::default()
        };

        let pair = normalize_pair(dataset.clone(), dataset, &rule, &RecordingSink::new())
            .expect("normalization should succeed");
        assert_eq!(pair.expected.column("Id").expect("key").cells, text(&["c"]));
    }

    #[test]
    fn drop_rows_columns_must_exist_in_both() {
        let rule = FileRule {
            drop_rows: Some(DropRows {
                cols: vec!["Vega".to_string()],
                threshold: 0.0,
            }),
            ..keyed_rule()
        };
        let sink = RecordingSink::new();

        let issue = normalize_pair(sensitivities(), sensitivities(), &rule, &sink)
            .expect_err("missing drop_rows column should fail");
        assert_eq!(
            issue,
            Issue::DropRowsColumnsMissing {
                side: Side::Expected,
                columns: vec!["Vega".to_string()],
            }
        );
        assert_eq!(sink.messages_at(Severity::Warning).len(), 1);
    }

    #[test]
    fn key_list_is_checked_before_data() {
        assert_eq!(validate_key_list(&FileRule::default()), Err(Issue::MissingKeys));

        let empty = FileRule {
            keys: Some(Vec::new()),
            ..FileRule::default()
        };
        assert!(matches!(validate_key_list(&empty), Err(Issue::InvalidKeys { .. })));

        let blank = FileRule {
            keys: Some(vec!["TradeId".to_string(), String::new()]),
            ..FileRule::default()
        };
        assert!(matches!(validate_key_list(&blank), Err(Issue::InvalidKeys { .. })));

        let duplicated = FileRule {
            keys: Some(vec!["TradeId".to_string(), "TradeId".to_string()]),
            ..FileRule::default()
        };
        assert_eq!(
            validate_key_list(&duplicated),
            Err(Issue::DuplicateKeys {
                keys: vec!["TradeId".to_string(), "TradeId".to_string()],
                duplicates: vec!["TradeId".to_string()],
            })
        );
    }

    #[test]
    fn keys_must_exist_in_both_datasets() {
        let calculated = Dataset::from_columns(vec![Column::new("Delta", floats(&[1.0]))])
            .expect("single column");
        let sink = RecordingSink::new();

        let issue = normalize_pair(sensitivities(), calculated, &keyed_rule(), &sink)
            .expect_err("missing key should fail");
        assert!(matches!(
            issue,
            Issue::KeyColumnsMissing { side: Side::Calculated, .. }
        ));
        assert!(sink.contains("Dataset 2 does not contain all the keys"));
    }

    #[test]
    fn use_cols_reduces_to_listed_columns_plus_keys() {
        let rule = FileRule {
            use_cols: Some(vec!["Gamma".to_string()]),
            ..keyed_rule()
        };

        let pair = normalize_pair(sensitivities(), sensitivities(), &rule, &RecordingSink::new())
            .expect("normalization should succeed");
        assert_eq!(pair.expected.column_names(), vec!["Gamma", "TradeId"]);
        assert_eq!(pair.calculated.column_count(), 2);

        let missing = FileRule {
            use_cols: Some(vec!["Theta".to_string()]),
            ..keyed_rule()
        };
        assert!(matches!(
            normalize_pair(sensitivities(), sensitivities(), &missing, &RecordingSink::new()),
            Err(Issue::UseColsMissing { side: Side::Expected, .. })
        ));
    }
}
