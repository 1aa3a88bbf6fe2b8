//! Tolerance-grouped comparison of two normalized datasets.

mod align;
pub mod report;
pub mod verdict;

pub use report::{ColumnMismatch, GroupReport, MAX_REPORTED_SAMPLES, UnmatchedRows, ValueDelta};
pub use verdict::{Issue, Verdict, VerdictSource};

use crate::config::ColumnGroupRule;
use crate::dataset::Dataset;
use crate::domain::Side;
use crate::numerics::Tolerance;
use crate::sink::DiagnosticSink;
use align::compare_columns;
use std::collections::{BTreeMap, BTreeSet};

/// Compares `expected` against `calculated`, group by group.
///
/// Each [`ColumnGroupRule`] is checked with its own tolerance; a failing
/// group marks the verdict as non-matching but never stops later groups.
/// Columns not claimed by any group are compared afterwards with zero
/// tolerance, and a column present on one side only fails that pass.
pub fn compare_datasets(
    expected: &Dataset,
    calculated: &Dataset,
    keys: &[String],
    groups: &[ColumnGroupRule],
    sink: &dyn DiagnosticSink,
) -> Verdict {
    let mut verdict = Verdict::new(VerdictSource::Tabular);
    let mut cols_compared: BTreeSet<String> = BTreeSet::new();

    for (index, group) in groups.iter().enumerate() {
        let number = index + 1;
        let names = match resolve_group_names(number, group, expected, calculated, keys) {
            Ok(names) => names,
            Err(issue) => {
                sink.warning(&issue.sentence());
                sink.info("Skipping comparison for this group of names and marking files as different.");
                verdict.fail(issue);
                continue;
            }
        };

        sink.info(&format!(
            "Performing comparison of files for column names: {names:?}."
        ));
        cols_compared.extend(names.iter().cloned());

        let report = compare_columns(
            format!("column group {number}"),
            expected,
            calculated,
            keys,
            &names,
            group.tolerance(),
        );
        if report.matched() {
            sink.debug(&format!("The columns, {names:?}, in the files match."));
        } else {
            sink.debug(&format!("The columns, {names:?}, in the files do not match."));
            sink.info(&report.to_string());
            verdict.fail(Issue::GroupMismatch { group: number });
        }
        verdict.reports.push(report);
    }

    let remaining_expected = remaining_columns(expected, &cols_compared);
    let remaining_calculated = remaining_columns(calculated, &cols_compared);
    sink.debug(&format!(
        "The remaining columns in the first file are: {remaining_expected:?}."
    ));
    sink.debug(&format!(
        "The remaining columns in the second file are: {remaining_calculated:?}."
    ));

    let remaining = union_preserving_order(&remaining_expected, &remaining_calculated)
        .into_iter()
        .filter(|name| !keys.contains(name))
        .collect::<Vec<_>>();
    let report = compare_columns(
        "remaining columns",
        expected,
        calculated,
        keys,
        &remaining,
        Tolerance::EXACT,
    );
    if report.matched() {
        sink.debug("The remaining columns in the files match.");
    } else {
        sink.info("The remaining columns in the files do not match:");
        sink.info(&report.to_string());
        verdict.fail(Issue::RemainderMismatch);
    }
    verdict.reports.push(report);

    verdict
}

/// Effective column list for one group, or the reason the group is skipped.
fn resolve_group_names(
    number: usize,
    group: &ColumnGroupRule,
    expected: &Dataset,
    calculated: &Dataset,
    keys: &[String],
) -> Result<Vec<String>, Issue> {
    let mut names = group.names.clone();

    for optional in &group.optional_names {
        match (expected.has_column(optional), calculated.has_column(optional)) {
            (true, true) => names.push(optional.clone()),
            (false, false) => {}
            (true, false) => {
                return Err(Issue::OptionalNameOneSided {
                    group: number,
                    name: optional.clone(),
                    present_in: Side::Expected,
                });
            }
            (false, true) => {
                return Err(Issue::OptionalNameOneSided {
                    group: number,
                    name: optional.clone(),
                    present_in: Side::Calculated,
                });
            }
        }
    }

    if names.is_empty() {
        let expected_names = owned_names(expected);
        let calculated_names = owned_names(calculated);
        names = union_preserving_order(&expected_names, &calculated_names)
            .into_iter()
            .filter(|name| !keys.contains(name))
            .collect();
    }

    let duplicates = duplicated(&names);
    if !duplicates.is_empty() {
        return Err(Issue::DuplicateGroupNames {
            group: number,
            duplicates,
        });
    }

    let overlap: Vec<String> = names
        .iter()
        .filter(|name| keys.contains(name))
        .cloned()
        .collect();
    if !overlap.is_empty() {
        return Err(Issue::GroupNamesOverlapKeys {
            group: number,
            overlap,
        });
    }

    for (side, dataset) in [(Side::Expected, expected), (Side::Calculated, calculated)] {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| !dataset.has_column(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(Issue::GroupColumnsMissing {
                group: number,
                side,
                columns: missing,
            });
        }
    }

    Ok(names)
}

fn owned_names(dataset: &Dataset) -> Vec<String> {
    dataset
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn remaining_columns(dataset: &Dataset, compared: &BTreeSet<String>) -> Vec<String> {
    owned_names(dataset)
        .into_iter()
        .filter(|name| !compared.contains(name))
        .collect()
}

fn union_preserving_order(first: &[String], second: &[String]) -> Vec<String> {
    let mut union = first.to_vec();
    for name in second {
        if !union.contains(name) {
            union.push(name.clone());
        }
    }
    union
}

/// Names appearing more than once, in order of first repetition.
pub(crate) fn duplicated(names: &[String]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut duplicates = Vec::new();
    for name in names {
        let count = counts.entry(name.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicates.push(name.clone());
        }
    }
    duplicates
}
