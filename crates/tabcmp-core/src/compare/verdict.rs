use super::report::GroupReport;
use crate::domain::Side;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    Tabular,
    Direct,
}

/// Overall result of one file-pair comparison.
///
/// `matched` is the verdict. `issues` names every cause that forced a
/// non-match and `reports` holds one entry per compared column group, the
/// remaining-columns pass included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub matched: bool,
    pub source: VerdictSource,
    pub issues: Vec<Issue>,
    pub reports: Vec<GroupReport>,
}

impl Verdict {
    pub fn new(source: VerdictSource) -> Self {
        Self {
            matched: true,
            source,
            issues: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub fn failed(source: VerdictSource, issue: Issue) -> Self {
        let mut verdict = Self::new(source);
        verdict.fail(issue);
        verdict
    }

    pub fn fail(&mut self, issue: Issue) {
        self.matched = false;
        self.issues.push(issue);
    }

    pub fn mismatching_reports(&self) -> impl Iterator<Item = &GroupReport> {
        self.reports.iter().filter(|report| !report.matched())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    #[error("the file path {path} does not exist")]
    MissingFile { path: String },
    #[error("a dataset could not be created from the file {path}: {reason}")]
    LoadFailure { path: String, reason: String },
    #[error("direct comparison failed: {reason}")]
    DirectReadFailure { reason: String },
    #[error("the comparison configuration must contain a keys field")]
    MissingKeys,
    #[error("the list of keys, {keys:?}, must be non-empty and each key must be a non-empty string")]
    InvalidKeys { keys: Vec<String> },
    #[error("the keys, {keys:?}, contain duplicates, {duplicates:?}")]
    DuplicateKeys {
        keys: Vec<String>,
        duplicates: Vec<String>,
    },
    #[error("dataset {} does not contain all the drop_rows columns, {columns:?}", side.ordinal())]
    DropRowsColumnsMissing { side: Side, columns: Vec<String> },
    #[error("dataset {} does not contain all the keys, {keys:?}", side.ordinal())]
    KeyColumnsMissing { side: Side, keys: Vec<String> },
    #[error("dataset {} does not contain all the named columns, {columns:?}", side.ordinal())]
    UseColsMissing { side: Side, columns: Vec<String> },
    #[error(
        "column group {group}: the optional name, {name}, is only in dataset {}",
        present_in.ordinal()
    )]
    OptionalNameOneSided {
        group: usize,
        name: String,
        present_in: Side,
    },
    #[error("column group {group}: the names contain duplicates, {duplicates:?}")]
    DuplicateGroupNames { group: usize, duplicates: Vec<String> },
    #[error("column group {group}: the names contain some of the keys, {overlap:?}")]
    GroupNamesOverlapKeys { group: usize, overlap: Vec<String> },
    #[error("column group {group}: dataset {} does not contain the names {columns:?}", side.ordinal())]
    GroupColumnsMissing {
        group: usize,
        side: Side,
        columns: Vec<String>,
    },
    #[error("column group {group}: values do not match")]
    GroupMismatch { group: usize },
    #[error("the remaining columns do not match")]
    RemainderMismatch,
    #[error("the files differ in {differing_lines} line(s)")]
    TextDiff { differing_lines: usize },
}

impl Issue {
    /// The message as a log sentence: capitalized, with a trailing period.
    pub fn sentence(&self) -> String {
        let message = self.to_string();
        let mut chars = message.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).chain(['.']).collect(),
            None => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Issue, Verdict, VerdictSource};
    use crate::domain::Side;

    #[test]
    fn failing_keeps_every_issue() {
        let mut verdict = Verdict::new(VerdictSource::Tabular);
        assert!(verdict.matched);

        verdict.fail(Issue::GroupMismatch { group: 1 });
        verdict.fail(Issue::RemainderMismatch);
        assert!(!verdict.matched);
        assert_eq!(verdict.issues.len(), 2);
    }

    #[test]
    fn issues_render_dataset_numbers() {
        let issue = Issue::KeyColumnsMissing {
            side: Side::Calculated,
            keys: vec!["TradeId".to_string()],
        };
        assert_eq!(
            issue.to_string(),
            "dataset 2 does not contain all the keys, [\"TradeId\"]"
        );

        let issue = Issue::OptionalNameOneSided {
            group: 2,
            name: "Currency".to_string(),
            present_in: Side::Expected,
        };
        assert_eq!(
            issue.to_string(),
            "column group 2: the optional name, Currency, is only in dataset 1"
        );
        assert_eq!(
            Issue::MissingKeys.to_string(),
            "the comparison configuration must contain a keys field"
        );
        assert_eq!(
            Issue::TextDiff { differing_lines: 4 }.to_string(),
            "the files differ in 4 line(s)"
        );
    }

    #[test]
    fn issue_is_a_std_error() {
        let issue: Box<dyn std::error::Error> = Box::new(Issue::GroupMismatch { group: 1 });
        assert_eq!(issue.to_string(), "column group 1: values do not match");
        assert!(issue.source().is_none());
    }

    #[test]
    fn sentence_capitalizes_and_terminates() {
        assert_eq!(
            Issue::RemainderMismatch.sentence(),
            "The remaining columns do not match."
        );
    }

    #[test]
    fn issues_serialize_with_kind_tag() {
        let value = serde_json::to_value(Issue::GroupMismatch { group: 3 })
            .expect("issue should serialize");
        assert_eq!(value["kind"], "group_mismatch");
        assert_eq!(value["group"], 3);
    }
}
