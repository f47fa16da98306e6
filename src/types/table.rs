use serde::{Deserialize, Serialize};

use super::CellValue;
use crate::error::{Result, XlsplitError};

static EMPTY_CELL: CellValue = CellValue::Empty;

/// An in-memory sheet: named columns and aligned rows.
///
/// Stored row-major. Every row is exactly `columns.len()` cells wide, which
/// is the same as saying every column has the same length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

/// Column names and row count, for front ends that offer the column choice
/// before splitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub columns: Vec<String>,
    pub row_count: usize,
}

impl Table {
    /// Build a table, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(XlsplitError::Unexpected(format!(
                "row {} has {} cells but the table has {} columns",
                idx + 1,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first column with this exact name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &CellValue> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row.get(idx).unwrap_or(&EMPTY_CELL)))
    }

    /// A new table holding the rows in `start..end` (clamped to the table).
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.rows.len());
        let start = start.min(end);
        Self {
            columns: self.columns.clone(),
            rows: self.rows.get(start..end).map(<[_]>::to_vec).unwrap_or_default(),
        }
    }

    /// A new table holding the rows at `indices`, in the order given.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> TableSummary {
        TableSummary {
            columns: self.columns.clone(),
            row_count: self.rows.len(),
        }
    }
}
