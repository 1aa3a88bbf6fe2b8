pub mod errors;

pub use errors::{ErrorCategory, ToolError};

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Which side of a comparison a dataset or value came from.
///
/// The first file handed to a comparison is always treated as the expected
/// baseline; relative tolerances are measured against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Expected,
    Calculated,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Expected, Side::Calculated];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expected => "expected",
            Self::Calculated => "calculated",
        }
    }

    /// 1-based dataset number used in diagnostics.
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Expected => 1,
            Self::Calculated => 2,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}
