//! XLSX and ZIP output.
//!
//! Each chunk becomes a minimal one-sheet workbook built from fixed package
//! parts plus a generated worksheet. The workbooks are then bundled into one
//! archive.

mod archive;
mod package;
pub(crate) mod sheet_writer;

pub use archive::{ArchiveBuilder, ArchiveEntry};

use crate::error::Result;
use crate::types::Table;

use archive::write_zip;
use package::SHEET_PATH;

/// Serialize a table to XLSX bytes.
///
/// The header row holds the column names; no index column is written.
/// The same table always produces the same bytes.
pub fn write_xlsx(table: &Table) -> Result<Vec<u8>> {
    let sheet = sheet_writer::write_sheet_xml(table);
    let workbook = package::workbook_xml();
    let styles = package::styles_xml();

    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", package::content_types_xml().as_bytes()),
        ("_rels/.rels", package::root_rels_xml().as_bytes()),
        ("xl/workbook.xml", workbook.as_bytes()),
        ("xl/_rels/workbook.xml.rels", package::workbook_rels_xml().as_bytes()),
        ("xl/styles.xml", styles.as_bytes()),
        (SHEET_PATH, sheet.as_bytes()),
    ];
    write_zip(parts.into_iter())
}
