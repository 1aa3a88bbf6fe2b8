//! Comparison configuration document and file-rule resolution.
//!
//! The document shape is
//! `{ "csv_settings": { "files": { "<pattern>": FileRule, ... } } }`.
//! Patterns keep their declared order and are compiled once at load time, so
//! a malformed document fails before any file is compared.

use crate::domain::ToolError;
use crate::numerics::Tolerance;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "comparison_config.json";

#[derive(Debug, Clone)]
pub struct ComparisonConfig {
    rules: Vec<FileRuleEntry>,
}

#[derive(Debug, Clone)]
pub struct FileRuleEntry {
    pattern: Regex,
    rule: FileRule,
}

impl FileRuleEntry {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn rule(&self) -> &FileRule {
        &self.rule
    }

    /// Unanchored search: the pattern may match anywhere in the filename.
    pub fn matches(&self, filename: &str) -> bool {
        self.pattern.is_match(filename)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct FileRule {
    #[serde(default)]
    pub col_types: Option<BTreeMap<String, ColumnType>>,
    #[serde(default)]
    pub rename_cols: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub drop_rows: Option<DropRows>,
    #[serde(default)]
    pub keys: Option<Vec<String>>,
    #[serde(default)]
    pub use_cols: Option<Vec<String>>,
    #[serde(default)]
    pub column_settings: Vec<ColumnGroupRule>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DropRows {
    pub cols: Vec<String>,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ColumnGroupRule {
    pub names: Vec<String>,
    #[serde(default)]
    pub optional_names: Vec<String>,
    #[serde(default)]
    pub abs_tol: Option<f64>,
    #[serde(default)]
    pub rel_tol: Option<f64>,
}

impl ColumnGroupRule {
    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.abs_tol.unwrap_or(0.0), self.rel_tol.unwrap_or(0.0))
    }
}

/// Forced type for a column, overriding inference in the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[serde(alias = "str", alias = "object")]
    String,
    #[serde(alias = "int64", alias = "integer")]
    Int,
    #[serde(alias = "float64", alias = "double")]
    Float,
    #[serde(alias = "boolean")]
    Bool,
}

impl ComparisonConfig {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_raw(raw)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline-config>"),
            source,
        })?;
        Self::from_raw(raw)
    }

    pub fn entries(&self) -> &[FileRuleEntry] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First declared pattern matching either filename, checked pattern by pattern.
    pub fn resolve_entry(&self, name_1: &str, name_2: &str) -> Option<&FileRuleEntry> {
        self.rules
            .iter()
            .find(|entry| entry.matches(name_1) || entry.matches(name_2))
    }

    pub fn resolve(&self, name_1: &str, name_2: &str) -> Option<&FileRule> {
        self.resolve_entry(name_1, name_2).map(FileRuleEntry::rule)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let Some(csv_settings) = raw.csv_settings else {
            return Ok(Self::empty());
        };

        let mut rules = Vec::with_capacity(csv_settings.files.len());
        for (pattern, value) in csv_settings.files {
            let compiled = Regex::new(&pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            let rule: FileRule =
                serde_json::from_value(value).map_err(|source| ConfigError::InvalidRule {
                    pattern: pattern.clone(),
                    source,
                })?;
            rules.push(FileRuleEntry {
                pattern: compiled,
                rule,
            });
        }

        Ok(Self { rules })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read comparison config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse comparison config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("invalid file rule for pattern '{pattern}': {source}")]
    InvalidRule {
        pattern: String,
        source: serde_json::Error,
    },
}

impl From<ConfigError> for ToolError {
    fn from(error: ConfigError) -> Self {
        let message = error.to_string();
        match error {
            ConfigError::Read { .. } => ToolError::io_system("IO.CONFIG_ACCESS", message),
            ConfigError::Parse { .. }
            | ConfigError::InvalidPattern { .. }
            | ConfigError::InvalidRule { .. } => {
                ToolError::input_validation("INPUT.CONFIG_SCHEMA", message)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    csv_settings: Option<RawCsvSettings>,
}

#[derive(Debug, Deserialize)]
struct RawCsvSettings {
    #[serde(default)]
    files: serde_json::Map<String, serde_json::Value>,
}
