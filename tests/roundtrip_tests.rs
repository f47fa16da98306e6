//! Writing a table and reading it back.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;
mod fixtures;

use common::*;
use test_case::test_case;
use xlsplit::{parse, write_xlsx, CellValue, Table};

fn roundtrip(table: &Table) -> Table {
    parse(&write_xlsx(table).unwrap()).unwrap()
}

#[test]
fn test_mixed_table_survives() {
    let table = Table::new(
        vec!["Name".into(), "Amount".into(), "Paid".into(), "Due".into(), "Check".into()],
        vec![
            vec![text("Ann"), num(12.5), CellValue::Bool(true), CellValue::DateTime(45_292.0), CellValue::Error("#DIV/0!".into())],
            vec![CellValue::Empty, CellValue::Empty, CellValue::Empty, CellValue::Empty, CellValue::Empty],
            vec![text("Bob"), num(-0.001), CellValue::Bool(false), CellValue::DateTime(45_292.75), CellValue::Empty],
        ],
    )
    .unwrap();
    assert_eq!(roundtrip(&table), table);
}

#[test_case("Tom & Jerry <3>" ; "markup characters")]
#[test_case("  padded  " ; "surrounding spaces")]
#[test_case("line one\nline two" ; "newline")]
#[test_case("carriage\r\nreturn" ; "crlf")]
#[test_case("bell\u{7}" ; "control character")]
#[test_case("_x0041_" ; "literal escape pattern")]
#[test_case("Zürich 東京 🚀" ; "non ascii")]
#[test_case("\"quoted\" 'single'" ; "quotes")]
fn test_text_survives(value: &str) {
    let table = Table::new(vec![value.into()], vec![vec![text(value)]]).unwrap();
    let back = roundtrip(&table);
    assert_eq!(back.columns(), [value]);
    assert_eq!(back.rows()[0][0], text(value));
}

#[test_case(0.1 + 0.2)]
#[test_case(1e-9)]
#[test_case(123_456_789_012.345)]
#[test_case(-42.0)]
#[test_case(f64::MAX)]
fn test_numbers_survive_exactly(value: f64) {
    let table = Table::new(vec!["n".into()], vec![vec![num(value)]]).unwrap();
    assert_eq!(roundtrip(&table).rows()[0][0], num(value));
}

#[test]
fn test_header_is_bold_and_dates_formatted() {
    let table = Table::new(
        vec!["When".into()],
        vec![vec![CellValue::DateTime(45_292.5)]],
    )
    .unwrap();
    let xml = sheet_xml(&write_xlsx(&table).unwrap());
    assert!(xml.contains(r#"<c r="A1" s="1" t="inlineStr">"#));
    assert!(xml.contains(r#"<c r="A2" s="2"><v>45292.5</v></c>"#));
}

#[test]
fn test_no_index_column() {
    let table = Table::new(vec!["Only".into()], vec![vec![num(1.0)], vec![num(2.0)]]).unwrap();
    let back = roundtrip(&table);
    assert_eq!(back.column_count(), 1);
    assert_eq!(column_values(&back, "Only"), vec![num(1.0), num(2.0)]);
}

#[test]
fn test_header_only_table() {
    let table = Table::new(vec!["A".into(), "B".into()], Vec::new()).unwrap();
    assert_eq!(roundtrip(&table), table);
}

#[test]
fn test_loaded_workbook_survives_split_write() {
    // Shared strings in, inline strings out
    let xlsx = table_xlsx(
        &["Region", "Sales"],
        vec![
            vec!["North".into(), 10.into()],
            vec!["South".into(), Value::Date(45_000.0)],
        ],
    );
    let table = parse(&xlsx).unwrap();
    assert_eq!(roundtrip(&table), table);
}
