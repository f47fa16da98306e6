use serde::{Deserialize, Serialize};
use std::fmt;

use crate::numfmt::{format_datetime, format_float};

/// A single cell value as read from a worksheet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "camelCase")]
pub enum CellValue {
    /// No value (blank cell, or a recognised null marker)
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    /// Excel 1900-system date serial
    DateTime(f64),
    /// Error literal such as `#DIV/0!`
    Error(String),
}

/// Hashable identity of a non-empty cell value.
///
/// Two cells belong to the same group exactly when their keys are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKey<'a> {
    Number(u64),
    Text(&'a str),
    Bool(bool),
    DateTime(u64),
    Error(&'a str),
}

/// Bit pattern with `-0.0` folded into `0.0` so both hash alike.
fn float_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0_f64.to_bits()
    } else {
        v.to_bits()
    }
}

impl CellValue {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Grouping key, or `None` for empty cells.
    #[must_use]
    pub fn key(&self) -> Option<ValueKey<'_>> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => Some(ValueKey::Number(float_bits(*n))),
            CellValue::Text(s) => Some(ValueKey::Text(s)),
            CellValue::Bool(b) => Some(ValueKey::Bool(*b)),
            CellValue::DateTime(n) => Some(ValueKey::DateTime(float_bits(*n))),
            CellValue::Error(s) => Some(ValueKey::Error(s)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) if *n == 0.0 => f.write_str("0"),
            CellValue::Number(n) if n.fract() == 0.0 => write!(f, "{n}"),
            CellValue::Number(n) => f.write_str(&format_float(*n)),
            CellValue::Text(s) | CellValue::Error(s) => f.write_str(s),
            CellValue::Bool(true) => f.write_str("True"),
            CellValue::Bool(false) => f.write_str("False"),
            CellValue::DateTime(n) => f.write_str(&format_datetime(*n)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Empty, Into::into)
    }
}
