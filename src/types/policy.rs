use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use super::Table;
use crate::error::{Result, XlsplitError};

/// How rows are grouped into output files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SplitPolicy {
    /// Consecutive chunks of `rows_per_file` rows; the last holds the remainder.
    ByRowCount(NonZeroUsize),
    /// One chunk per distinct non-null value of the named column.
    ByColumnValue(String),
}

impl SplitPolicy {
    /// Row-count policy from a user-supplied number; `n <= 0` is rejected.
    pub fn by_row_count(rows_per_file: i64) -> Result<Self> {
        usize::try_from(rows_per_file)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self::ByRowCount)
            .ok_or_else(|| {
                XlsplitError::Configuration(format!(
                    "rows per file must be a positive integer, got {rows_per_file}"
                ))
            })
    }

    /// Column-value policy; the column is checked against the table later.
    pub fn by_column(column: impl Into<String>) -> Self {
        Self::ByColumnValue(column.into())
    }

    /// Check the policy's parameters against a loaded table.
    pub fn validate_for(&self, table: &Table) -> Result<()> {
        match self {
            Self::ByRowCount(_) => Ok(()),
            Self::ByColumnValue(column) => {
                if table.column_index(column).is_some() {
                    Ok(())
                } else {
                    Err(XlsplitError::Configuration(format!(
                        "column '{column}' not found; available columns: {}",
                        table.columns().join(", ")
                    )))
                }
            }
        }
    }
}
