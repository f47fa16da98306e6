//! Row partitioning.
//!
//! Turns one table into labelled chunks, one per output file.

use std::collections::HashMap;

use crate::error::{Result, XlsplitError};
use crate::numfmt::format_float;
use crate::types::{CellValue, SplitPolicy, Table, ValueKey};

/// One output file's worth of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// File name suffix: the 1-based chunk number, or the sanitized group value.
    pub label: String,
    pub table: Table,
}

/// Replace every space with an underscore. Nothing else is touched.
#[must_use]
pub fn sanitize_label(raw: &str) -> String {
    raw.replace(' ', "_")
}

/// Split `table` according to `policy`.
///
/// An empty table yields no chunks under either policy.
pub fn partition(table: &Table, policy: &SplitPolicy) -> Result<Vec<Chunk>> {
    policy.validate_for(table)?;
    match policy {
        SplitPolicy::ByRowCount(n) => Ok(by_row_count(table, n.get())),
        SplitPolicy::ByColumnValue(column) => by_column_value(table, column),
    }
}

fn by_row_count(table: &Table, rows_per_file: usize) -> Vec<Chunk> {
    (0..table.row_count())
        .step_by(rows_per_file)
        .enumerate()
        .map(|(i, start)| Chunk {
            label: (i + 1).to_string(),
            table: table.slice(start, start.saturating_add(rows_per_file)),
        })
        .collect()
}

/// How numbers in a split column are written into labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberStyle {
    /// `1`, `2.5`: whole numbers without a fraction.
    Integer,
    /// `1.0`, `2.5`: every number with a decimal point.
    Float,
}

/// A column of nothing but numbers reads as floats once it holds a blank or
/// a fractional value. Columns mixing in other types keep each number as is.
fn number_style<'a>(values: impl Iterator<Item = &'a CellValue>) -> NumberStyle {
    let mut float = false;
    for value in values {
        match value {
            CellValue::Empty => float = true,
            CellValue::Number(n) if n.fract() != 0.0 => float = true,
            CellValue::Number(_) => {}
            _ => return NumberStyle::Integer,
        }
    }
    if float {
        NumberStyle::Float
    } else {
        NumberStyle::Integer
    }
}

fn label_text(value: &CellValue, style: NumberStyle) -> String {
    match (value, style) {
        (CellValue::Number(n), NumberStyle::Float) => format_float(*n),
        _ => value.to_string(),
    }
}

fn by_column_value(table: &Table, column: &str) -> Result<Vec<Chunk>> {
    let missing = || XlsplitError::Configuration(format!("column '{column}' not found"));
    let style = number_style(table.column(column).ok_or_else(missing)?);
    let values = table.column(column).ok_or_else(missing)?;

    // Groups in order of first appearance; the map points into `groups`
    let mut slots: HashMap<ValueKey<'_>, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut dropped = 0usize;

    for (row_idx, value) in values.enumerate() {
        let Some(key) = value.key() else {
            dropped += 1;
            continue;
        };
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push((sanitize_label(&label_text(value, style)), Vec::new()));
            groups.len() - 1
        });
        if let Some((_, rows)) = groups.get_mut(slot) {
            rows.push(row_idx);
        }
    }

    if dropped > 0 {
        tracing::debug!(column, dropped, "rows with an empty split value left out");
    }

    Ok(groups
        .into_iter()
        .map(|(label, rows)| Chunk {
            label,
            table: table.select(&rows),
        })
        .collect())
}
