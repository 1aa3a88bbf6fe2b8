//! Entry points comparing one expected file against one calculated file.

use crate::compare::{Issue, Verdict, VerdictSource, compare_datasets};
use crate::config::{ComparisonConfig, FileRule};
use crate::dataset::{Dataset, load_dataset};
use crate::direct::diff_files;
use crate::domain::ToolError;
use crate::normalize::{normalize_pair, validate_key_list};
use crate::sink::DiagnosticSink;
use std::path::{Path, PathBuf};

/// Extensions that may only be compared through a tabular rule.
const TABULAR_EXTENSIONS: [&str; 2] = ["csv", "json"];

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error(
        "file '{}' requires a comparison configuration but none given",
        path.display()
    )]
    ConfigurationRequired { path: PathBuf },
}

impl From<CompareError> for ToolError {
    fn from(error: CompareError) -> Self {
        match &error {
            CompareError::ConfigurationRequired { .. } => {
                ToolError::input_validation("INPUT.CONFIG_REQUIRED", error.to_string())
            }
        }
    }
}

/// Compares `path_1` (expected) against `path_2` (calculated).
///
/// Returns `Ok(false)` for every data-level failure (missing file, unreadable
/// dataset, failed validation, value mismatch) after reporting the cause to
/// `sink`. The only hard error is a `.csv` or `.json` file with no matching
/// rule in `config`.
pub fn compare_files(
    path_1: &Path,
    path_2: &Path,
    label: &str,
    config: Option<&ComparisonConfig>,
    sink: &dyn DiagnosticSink,
) -> Result<bool, CompareError> {
    compare_files_with_verdict(path_1, path_2, label, config, sink).map(|verdict| verdict.matched)
}

/// Same as [`compare_files`], keeping the typed causes and group reports.
pub fn compare_files_with_verdict(
    path_1: &Path,
    path_2: &Path,
    label: &str,
    config: Option<&ComparisonConfig>,
    sink: &dyn DiagnosticSink,
) -> Result<Verdict, CompareError> {
    sink.info(&format!(
        "{label}: Start comparing file {} against {}",
        path_1.display(),
        path_2.display()
    ));

    let verdict = dispatch(path_1, path_2, label, config, sink)?;

    sink.info(&format!(
        "{label}: Finished comparing file {} against {}: {}.",
        path_1.display(),
        path_2.display(),
        verdict.matched
    ));
    Ok(verdict)
}

fn dispatch(
    path_1: &Path,
    path_2: &Path,
    label: &str,
    config: Option<&ComparisonConfig>,
    sink: &dyn DiagnosticSink,
) -> Result<Verdict, CompareError> {
    let rule = config.and_then(|config| config.resolve(&base_name(path_1), &base_name(path_2)));
    let source = match rule {
        Some(_) => VerdictSource::Tabular,
        None => VerdictSource::Direct,
    };

    for path in [path_1, path_2] {
        if !path.is_file() {
            let issue = Issue::MissingFile {
                path: path.display().to_string(),
            };
            sink.warning(&issue.sentence());
            return Ok(Verdict::failed(source, issue));
        }
    }

    match rule {
        Some(rule) => Ok(compare_tabular(path_1, path_2, label, rule, sink)),
        None => {
            for path in [path_1, path_2] {
                if requires_rule(path) {
                    return Err(CompareError::ConfigurationRequired {
                        path: path.to_path_buf(),
                    });
                }
            }
            Ok(compare_text(path_1, path_2, label, sink))
        }
    }
}

fn compare_tabular(
    path_1: &Path,
    path_2: &Path,
    label: &str,
    rule: &FileRule,
    sink: &dyn DiagnosticSink,
) -> Verdict {
    sink.debug(&format!(
        "{label}: Start comparing file {} against {} using configuration.",
        path_1.display(),
        path_2.display()
    ));

    if let Err(issue) = validate_key_list(rule) {
        sink.warning(&issue.sentence());
        return Verdict::failed(VerdictSource::Tabular, issue);
    }

    let expected = match load_side(path_1, rule, sink) {
        Ok(dataset) => dataset,
        Err(issue) => return Verdict::failed(VerdictSource::Tabular, issue),
    };
    let calculated = match load_side(path_2, rule, sink) {
        Ok(dataset) => dataset,
        Err(issue) => return Verdict::failed(VerdictSource::Tabular, issue),
    };

    let verdict = match normalize_pair(expected, calculated, rule, sink) {
        Ok(pair) => compare_datasets(
            &pair.expected,
            &pair.calculated,
            &pair.keys,
            &rule.column_settings,
            sink,
        ),
        Err(issue) => Verdict::failed(VerdictSource::Tabular, issue),
    };

    sink.debug(&format!(
        "{label}: Finished comparing file {} against {} using configuration: {}.",
        path_1.display(),
        path_2.display(),
        verdict.matched
    ));
    verdict
}

fn load_side(path: &Path, rule: &FileRule, sink: &dyn DiagnosticSink) -> Result<Dataset, Issue> {
    load_dataset(path, rule.col_types.as_ref(), sink).map_err(|error| {
        let issue = Issue::LoadFailure {
            path: path.display().to_string(),
            reason: error.to_string(),
        };
        sink.warning(&issue.sentence());
        issue
    })
}

fn compare_text(path_1: &Path, path_2: &Path, label: &str, sink: &dyn DiagnosticSink) -> Verdict {
    sink.debug(&format!(
        "{label}: Comparing file {} directly against {}",
        path_1.display(),
        path_2.display()
    ));

    match diff_files(path_1, path_2, sink) {
        Ok(0) => Verdict::new(VerdictSource::Direct),
        Ok(differing_lines) => {
            Verdict::failed(VerdictSource::Direct, Issue::TextDiff { differing_lines })
        }
        Err(error) => {
            let issue = Issue::DirectReadFailure {
                reason: error.to_string(),
            };
            sink.warning(&issue.sentence());
            Verdict::failed(VerdictSource::Direct, issue)
        }
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn requires_rule(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| TABULAR_EXTENSIONS.contains(&extension))
}
