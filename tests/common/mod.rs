//! Common test utilities and assertion helpers.
//!
//! Readers for the archives and workbooks the splitter produces.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::io::{Cursor, Read};

use xlsplit::{CellValue, Table};

// Re-export fixtures for convenience
pub use super::fixtures::*;

/// Every member of a ZIP archive as `(name, bytes)`, in archive order.
#[must_use]
pub fn unzip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("Failed to open ZIP archive");
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}

/// Member names of a ZIP archive, in archive order.
#[must_use]
pub fn entry_names(bytes: &[u8]) -> Vec<String> {
    unzip(bytes).into_iter().map(|(name, _)| name).collect()
}

/// Parse every workbook inside an output archive.
#[must_use]
pub fn read_chunks(archive: &[u8]) -> Vec<(String, Table)> {
    unzip(archive)
        .into_iter()
        .map(|(name, bytes)| {
            let table = xlsplit::parse(&bytes)
                .unwrap_or_else(|e| panic!("{name} is not a readable workbook: {e}"));
            (name, table)
        })
        .collect()
}

/// The text of one worksheet part inside a workbook.
#[must_use]
pub fn sheet_xml(workbook: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(workbook)).unwrap();
    let mut file = archive.by_name("xl/worksheets/sheet1.xml").unwrap();
    let mut xml = String::new();
    file.read_to_string(&mut xml).unwrap();
    xml
}

/// Cells of one column, top to bottom.
#[must_use]
pub fn column_values(table: &Table, column: &str) -> Vec<CellValue> {
    table
        .column(column)
        .unwrap_or_else(|| panic!("no column {column:?} in {:?}", table.columns()))
        .cloned()
        .collect()
}

/// Text cells shorthand.
#[must_use]
pub fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

/// Number cells shorthand.
#[must_use]
pub fn num(n: f64) -> CellValue {
    CellValue::Number(n)
}
