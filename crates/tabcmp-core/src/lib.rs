pub mod compare;
pub mod config;
pub mod dataset;
pub mod direct;
pub mod domain;
pub mod normalize;
pub mod numerics;
pub mod pipeline;
pub mod sink;

pub use compare::{
    ColumnMismatch, GroupReport, Issue, UnmatchedRows, ValueDelta, Verdict, VerdictSource,
    compare_datasets,
};
pub use config::{
    ColumnGroupRule, ColumnType, ComparisonConfig, ConfigError, DEFAULT_CONFIG_PATH, DropRows,
    FileRule, FileRuleEntry,
};
pub use dataset::{Cell, Column, Dataset, LoadError, load_dataset};
pub use direct::{DirectError, compare_direct};
pub use domain::{ErrorCategory, Side, ToolError};
pub use normalize::{NormalizedPair, normalize_pair, validate_key_list};
pub use numerics::{Tolerance, compare_with_tolerance, within_tolerance};
pub use pipeline::{CompareError, compare_files, compare_files_with_verdict};
pub use sink::{Diagnostic, DiagnosticSink, RecordingSink, Severity, Tee, TracingSink};
