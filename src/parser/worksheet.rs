//! Worksheet parsing - reads the cells of one sheet XML part.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::{col_to_letter, parse_cell_ref_bytes, MAX_COLS, MAX_ROWS};
use crate::error::{Result, XlsplitError};
use crate::numfmt::{parse_iso_datetime, DATE1904_OFFSET};
use crate::types::CellValue;
use crate::xml_helpers::unescape_xstring;

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Date,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        b"d" => CellTypeTag::Date,
        _ => CellTypeTag::Default,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    if seen {
        Some(num)
    } else {
        None
    }
}

/// One populated cell, 0-indexed.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct RawCell {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
}

/// Workbook-level lookups needed to turn raw `<c>` content into values.
pub(super) struct CellContext<'a> {
    pub shared_strings: &'a [String],
    pub date_styles: &'a [bool],
    pub date1904: bool,
}

/// Attributes and text collected for the `<c>` being read.
#[derive(Default)]
struct PendingCell {
    row: u32,
    col: u32,
    tag: Option<CellTypeTag>,
    style_idx: Option<u32>,
    value: Option<String>,
}

/// Read every cell of the worksheet at `path`.
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
    ctx: &CellContext<'_>,
) -> Result<Vec<RawCell>> {
    let file = archive
        .by_name(path)
        .map_err(|e| XlsplitError::Load(format!("{path}: {e}")))?;
    parse_sheet_xml(BufReader::new(file), ctx)
        .map_err(|e| XlsplitError::Load(format!("{path}: {e}")))
}

/// Read cells from worksheet XML. Errors carry a bare message; the caller
/// adds the part name.
pub(super) fn parse_sheet_xml<B: BufRead>(
    reader: B,
    ctx: &CellContext<'_>,
) -> std::result::Result<Vec<RawCell>, String> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut cells = Vec::new();
    let mut buf = Vec::new();

    let mut current_row: u32 = 0;
    let mut next_col: u32 = 0;
    let mut pending: Option<PendingCell> = None;
    // Inside <v>, or a <t> of an inline string that is not phonetic
    let mut capture_text = false;
    let mut in_phonetic = false;
    let mut in_sheet_data = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let is_start = matches!(event, Event::Start(_));
                match e.local_name().as_ref() {
                    b"sheetData" => in_sheet_data = is_start,
                    b"row" if in_sheet_data => {
                        let mut row_num = None;
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"r" {
                                row_num = parse_u32_bytes(&attr.value);
                            }
                        }
                        // Rows without r follow the previous one
                        current_row = row_num.map_or(current_row.saturating_add(1), |r| r.max(1));
                        next_col = 0;
                    }
                    b"c" if in_sheet_data => {
                        let mut cell = PendingCell {
                            row: current_row.saturating_sub(1),
                            col: next_col,
                            ..PendingCell::default()
                        };
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => {
                                    if let Some((c, r)) = parse_cell_ref_bytes(&attr.value) {
                                        cell.col = c;
                                        cell.row = r;
                                    }
                                }
                                b"t" => cell.tag = Some(parse_cell_type_tag(&attr.value)),
                                b"s" => cell.style_idx = parse_u32_bytes(&attr.value),
                                _ => {}
                            }
                        }
                        if cell.col >= MAX_COLS || cell.row >= MAX_ROWS {
                            return Err(format!(
                                "cell {}{} is outside the sheet (limit XFD{MAX_ROWS})",
                                col_to_letter(cell.col),
                                cell.row.saturating_add(1)
                            ));
                        }
                        next_col = cell.col.saturating_add(1);
                        if is_start {
                            pending = Some(cell);
                        } else {
                            // <c r="A1" s="3"/> is a styled blank
                            cells.push(finish_cell(cell, ctx)?);
                        }
                    }
                    b"v" if pending.is_some() && is_start => capture_text = true,
                    b"rPh" if is_start => in_phonetic = true,
                    b"t" if pending.is_some() && is_start && !in_phonetic => {
                        capture_text = true;
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref t)) if capture_text => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                if let Some(cell) = pending.as_mut() {
                    cell.value.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Ok(Event::CData(ref t)) if capture_text => {
                if let Some(cell) = pending.as_mut() {
                    let text = String::from_utf8_lossy(t);
                    cell.value.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"v" | b"t" => capture_text = false,
                b"rPh" => in_phonetic = false,
                b"c" => {
                    if let Some(cell) = pending.take() {
                        cells.push(finish_cell(cell, ctx)?);
                    }
                    capture_text = false;
                }
                b"sheetData" => in_sheet_data = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }

    Ok(cells)
}

/// Resolve a pending cell's raw text into a typed value.
fn finish_cell(cell: PendingCell, ctx: &CellContext<'_>) -> std::result::Result<RawCell, String> {
    let value = resolve_cell_value(
        cell.value.as_deref(),
        cell.tag.unwrap_or(CellTypeTag::Default),
        cell.style_idx,
        ctx,
    )?;
    Ok(RawCell {
        row: cell.row,
        col: cell.col,
        value,
    })
}

pub(super) fn resolve_cell_value(
    raw_value: Option<&str>,
    cell_type: CellTypeTag,
    style_idx: Option<u32>,
    ctx: &CellContext<'_>,
) -> std::result::Result<CellValue, String> {
    let Some(raw) = raw_value else {
        return Ok(CellValue::Empty);
    };

    let value = match cell_type {
        CellTypeTag::Shared => {
            let idx: usize = raw
                .trim()
                .parse()
                .map_err(|_| format!("invalid shared string index '{raw}'"))?;
            let s = ctx
                .shared_strings
                .get(idx)
                .ok_or_else(|| format!("shared string index {idx} out of range"))?;
            CellValue::Text(s.clone())
        }
        CellTypeTag::Inline | CellTypeTag::Str => CellValue::Text(unescape_xstring(raw)),
        CellTypeTag::Bool => match raw.trim() {
            "1" | "true" | "TRUE" => CellValue::Bool(true),
            "0" | "false" | "FALSE" => CellValue::Bool(false),
            _ => CellValue::Text(raw.to_string()),
        },
        CellTypeTag::Error => CellValue::Error(raw.to_string()),
        CellTypeTag::Date => match parse_iso_datetime(raw) {
            Some(serial) => CellValue::DateTime(serial),
            None => CellValue::Text(raw.to_string()),
        },
        CellTypeTag::Default => match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => {
                let is_date = style_idx
                    .and_then(|i| ctx.date_styles.get(i as usize))
                    .copied()
                    .unwrap_or(false);
                if is_date {
                    let serial = if ctx.date1904 { n + DATE1904_OFFSET } else { n };
                    CellValue::DateTime(serial)
                } else {
                    CellValue::Number(n)
                }
            }
            _ => CellValue::Text(raw.to_string()),
        },
    };
    Ok(value)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn ctx<'a>(sst: &'a [String], dates: &'a [bool]) -> CellContext<'a> {
        CellContext {
            shared_strings: sst,
            date_styles: dates,
            date1904: false,
        }
    }

    fn parse(xml: &str, sst: &[String], dates: &[bool]) -> Vec<RawCell> {
        parse_sheet_xml(xml.as_bytes(), &ctx(sst, dates)).unwrap()
    }

    #[test]
    fn test_cell_types() {
        let sst = vec!["Region".to_string(), "North".to_string()];
        let xml = r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="inlineStr"><is><t>Amount</t></is></c></row>
<row r="2"><c r="A2" t="s"><v>1</v></c><c r="B2"><v>12.5</v></c><c r="C2" t="b"><v>1</v></c><c r="D2" t="e"><v>#DIV/0!</v></c></row>
</sheetData></worksheet>"#;
        let cells = parse(xml, &sst, &[]);
        let values: Vec<_> = cells.iter().map(|c| (c.row, c.col, c.value.clone())).collect();
        assert_eq!(
            values,
            vec![
                (0, 0, CellValue::Text("Region".into())),
                (0, 1, CellValue::Text("Amount".into())),
                (1, 0, CellValue::Text("North".into())),
                (1, 1, CellValue::Number(12.5)),
                (1, 2, CellValue::Bool(true)),
                (1, 3, CellValue::Error("#DIV/0!".into())),
            ]
        );
    }

    #[test]
    fn test_formula_string_uses_cached_value() {
        let xml = r#"<worksheet><sheetData><row r="1">
<c r="A1" t="str"><f>CONCAT("a","b")</f><v>ab</v></c>
<c r="B1"><f>1+1</f><v>2</v></c>
</row></sheetData></worksheet>"#;
        let cells = parse(xml, &[], &[]);
        assert_eq!(cells[0].value, CellValue::Text("ab".into()));
        assert_eq!(cells[1].value, CellValue::Number(2.0));
    }

    #[test]
    fn test_rich_inline_string_concatenated() {
        let xml = r#"<worksheet><sheetData><row r="1">
<c r="A1" t="inlineStr"><is><r><t>South</t></r><r><rPr><b/></rPr><t xml:space="preserve"> East</t></r><rPh><t>x</t></rPh></is></c>
</row></sheetData></worksheet>"#;
        let cells = parse(xml, &[], &[]);
        assert_eq!(cells[0].value, CellValue::Text("South East".into()));
    }

    #[test]
    fn test_date_style_makes_datetime() {
        let xml = r#"<worksheet><sheetData><row r="1">
<c r="A1" s="1"><v>45292</v></c><c r="B1" s="0"><v>45292</v></c>
</row></sheetData></worksheet>"#;
        let cells = parse(xml, &[], &[false, true]);
        assert_eq!(cells[0].value, CellValue::DateTime(45_292.0));
        assert_eq!(cells[1].value, CellValue::Number(45_292.0));
    }

    #[test]
    fn test_date1904_is_normalised() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1" s="1"><v>43830</v></c></row></sheetData></worksheet>"#;
        let dates = [false, true];
        let ctx = CellContext {
            shared_strings: &[],
            date_styles: &dates,
            date1904: true,
        };
        let cells = parse_sheet_xml(xml.as_bytes(), &ctx).unwrap();
        assert_eq!(cells[0].value, CellValue::DateTime(45_292.0));
    }

    #[test]
    fn test_missing_references_follow_previous_cell() {
        let xml = r#"<worksheet><sheetData>
<row><c><v>1</v></c><c><v>2</v></c></row>
<row><c r="C2"><v>3</v></c><c><v>4</v></c></row>
</sheetData></worksheet>"#;
        let cells = parse(xml, &[], &[]);
        let positions: Vec<_> = cells.iter().map(|c| (c.row, c.col)).collect();
        assert_eq!(positions, vec![(0, 0), (0, 1), (1, 2), (1, 3)]);
    }

    #[test]
    fn test_styled_blank_is_empty() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1" s="2"/><c r="B1" t="s"></c></row></sheetData></worksheet>"#;
        let cells = parse(xml, &[], &[]);
        assert!(cells.iter().all(|c| c.value.is_empty()));
    }

    #[test]
    fn test_bad_shared_string_index_is_error() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>7</v></c></row></sheetData></worksheet>"#;
        let err = parse_sheet_xml(xml.as_bytes(), &ctx(&[], &[])).unwrap_err();
        assert!(err.contains("out of range"));
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1"><v>1</x></c></row>"#;
        assert!(parse_sheet_xml(xml.as_bytes(), &ctx(&[], &[])).is_err());
    }

    #[test_case(r#"<c r="ZZZZZZZZ2"><v>1</v></c>"# ; "huge column")]
    #[test_case(r#"<c r="XFE1"><v>1</v></c>"# ; "one past last column")]
    #[test_case(r#"<c r="A1048577"><v>1</v></c>"# ; "one past last row")]
    #[test_case(r#"<c r="A99999999999"><v>1</v></c>"# ; "saturated row")]
    fn test_reference_outside_sheet_is_error(cell: &str) {
        let xml = format!(r#"<worksheet><sheetData><row>{cell}</row></sheetData></worksheet>"#);
        let err = parse_sheet_xml(xml.as_bytes(), &ctx(&[], &[])).unwrap_err();
        assert!(err.contains("outside the sheet"), "{err}");
    }

    #[test]
    fn test_unreferenced_row_past_limit_is_error() {
        let xml = r#"<worksheet><sheetData><row r="1048577"><c><v>1</v></c></row></sheetData></worksheet>"#;
        assert!(parse_sheet_xml(xml.as_bytes(), &ctx(&[], &[])).is_err());
    }

    #[test]
    fn test_last_cell_of_sheet_is_accepted() {
        let xml = r#"<worksheet><sheetData><row r="1048576"><c r="XFD1048576"><v>1</v></c></row></sheetData></worksheet>"#;
        let cells = parse(xml, &[], &[]);
        assert_eq!((cells[0].row, cells[0].col), (MAX_ROWS - 1, MAX_COLS - 1));
    }

    #[test]
    fn test_escaped_text() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>R&amp;D_x000D_</t></is></c></row></sheetData></worksheet>"#;
        let cells = parse(xml, &[], &[]);
        assert_eq!(cells[0].value, CellValue::Text("R&D\r".into()));
    }
}
