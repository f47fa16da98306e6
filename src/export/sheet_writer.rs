//! Generates worksheet XML from a `Table`.
//!
//! Text is written as inline strings (`t="inlineStr"`), so the package needs
//! no shared string table.

use std::fmt::Write as _;

use crate::cell_ref::col_to_letter;
use crate::types::{CellValue, Table};
use crate::xml_helpers::escape_xstring;

/// `cellXfs` index of the header style in the generated styles part.
pub(crate) const HEADER_STYLE: u32 = 1;
/// `cellXfs` index of the date-time style.
pub(crate) const DATETIME_STYLE: u32 = 2;

/// Write a complete worksheet XML string: the header row, then every table
/// row in order.
pub(crate) fn write_sheet_xml(table: &Table) -> String {
    let mut out = String::with_capacity(256 + table.row_count() * table.column_count() * 24);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    );
    out.push_str(
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    out.push('\n');

    // <dimension>
    if table.column_count() > 0 {
        let last_col = u32::try_from(table.column_count() - 1).unwrap_or(u32::MAX);
        let _ = write!(
            out,
            "<dimension ref=\"A1:{}{}\"/>",
            col_to_letter(last_col),
            table.row_count() + 1
        );
        out.push('\n');
    }

    out.push_str("<sheetData>\n");
    if table.column_count() > 0 {
        let header: Vec<CellValue> = table.columns().iter().cloned().map(CellValue::Text).collect();
        write_row(&mut out, 1, header.iter(), Some(HEADER_STYLE));
        for (idx, row) in table.rows().iter().enumerate() {
            write_row(&mut out, idx + 2, row.iter(), None);
        }
    }
    out.push_str("</sheetData>\n");

    out.push_str("</worksheet>");
    out
}

/// Write one `<row>`; empty cells are left out, empty rows still get a tag.
fn write_row<'a>(
    out: &mut String,
    row: usize,
    cells: impl Iterator<Item = &'a CellValue>,
    style: Option<u32>,
) {
    let _ = write!(out, "<row r=\"{row}\">");
    for (col, value) in cells.enumerate() {
        let col = u32::try_from(col).unwrap_or(u32::MAX);
        write_cell(out, row, col, value, style);
    }
    out.push_str("</row>\n");
}

/// Write a single `<c>` element.
fn write_cell(out: &mut String, row: usize, col: u32, value: &CellValue, style: Option<u32>) {
    if value.is_empty() {
        return;
    }
    let style = style.or(matches!(value, CellValue::DateTime(_)).then_some(DATETIME_STYLE));

    let _ = write!(out, "<c r=\"{}{row}\"", col_to_letter(col));
    if let Some(s) = style {
        let _ = write!(out, " s=\"{s}\"");
    }

    match value {
        CellValue::Empty => {}
        CellValue::Text(s) => {
            out.push_str(" t=\"inlineStr\"><is>");
            if needs_space_preserve(s) {
                out.push_str("<t xml:space=\"preserve\">");
            } else {
                out.push_str("<t>");
            }
            out.push_str(&escape_xstring(s));
            out.push_str("</t></is>");
        }
        CellValue::Number(n) | CellValue::DateTime(n) if n.is_finite() => {
            let _ = write!(out, "><v>{n}</v>");
        }
        CellValue::Number(n) | CellValue::DateTime(n) => {
            // NaN and infinities have no SpreadsheetML number form
            let _ = write!(out, " t=\"inlineStr\"><is><t>{n}</t></is>");
        }
        CellValue::Bool(b) => {
            let _ = write!(out, " t=\"b\"><v>{}</v>", u8::from(*b));
        }
        CellValue::Error(e) => {
            let _ = write!(out, " t=\"e\"><v>{}</v>", escape_xstring(e));
        }
    }

    out.push_str("</c>");
}

fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace)
}
