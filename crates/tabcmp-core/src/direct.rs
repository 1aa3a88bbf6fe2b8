//! Line-based fallback comparison for files without a tabular rule.

use crate::domain::ToolError;
use crate::sink::DiagnosticSink;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DirectError {
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{}' is not valid utf-8 text: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl From<DirectError> for ToolError {
    fn from(error: DirectError) -> Self {
        match &error {
            DirectError::Read { .. } => ToolError::io_system("IO.DIRECT_READ", error.to_string()),
            DirectError::Decode { .. } => {
                ToolError::input_validation("INPUT.DIRECT_DECODE", error.to_string())
            }
        }
    }
}

/// Returns `true` when both files have identical text.
///
/// Byte-identical files always match. Otherwise both files must be utf-8,
/// and `\r\n` line endings are read as `\n` before the line diff. Every line
/// of the unified diff, headers included, goes to `sink` as a warning.
pub fn compare_direct(
    path_1: &Path,
    path_2: &Path,
    sink: &dyn DiagnosticSink,
) -> Result<bool, DirectError> {
    Ok(diff_files(path_1, path_2, sink)? == 0)
}

/// Number of inserted or deleted lines between the two files.
pub(crate) fn diff_files(
    path_1: &Path,
    path_2: &Path,
    sink: &dyn DiagnosticSink,
) -> Result<usize, DirectError> {
    let expected_bytes = read_bytes(path_1)?;
    let calculated_bytes = read_bytes(path_2)?;
    if expected_bytes == calculated_bytes {
        return Ok(0);
    }

    let expected = decode_text(path_1, expected_bytes)?;
    let calculated = decode_text(path_2, calculated_bytes)?;
    if expected == calculated {
        return Ok(0);
    }

    let diff = TextDiff::from_lines(expected.as_str(), calculated.as_str());
    let differing_lines = diff
        .iter_all_changes()
        .filter(|change| change.tag() != ChangeTag::Equal)
        .count();

    let header_1 = path_1.display().to_string();
    let header_2 = path_2.display().to_string();
    let rendered = diff
        .unified_diff()
        .header(&header_1, &header_2)
        .to_string();
    for line in rendered.lines() {
        sink.warning(line);
    }

    Ok(differing_lines)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, DirectError> {
    fs::read(path).map_err(|source| DirectError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn decode_text(path: &Path, bytes: Vec<u8>) -> Result<String, DirectError> {
    let text = String::from_utf8(bytes).map_err(|source| DirectError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text.replace("\r\n", "\n"))
}
