//! Test fixtures for generating XLSX files in memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use fixtures::{SheetBuilder, Value, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("Data")
//!             .row(1, vec!["Region".into(), "Sales".into()])
//!             .row(2, vec!["North".into(), 10.0.into()]),
//!     )
//!     .build();
//!
//! let table = xlsplit::parse(&xlsx).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

/// `cellXfs` index of the built-in `yyyy-mm-dd` style in generated workbooks.
pub const DATE_STYLE: u32 = 1;
/// `cellXfs` index of a custom `dd/mm/yyyy hh:mm` style.
pub const CUSTOM_DATE_STYLE: u32 = 2;

/// Value of one fixture cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Shared string (`t="s"`).
    Shared(String),
    /// Inline string (`t="inlineStr"`).
    Inline(String),
    Number(f64),
    /// Number with the built-in date style.
    Date(f64),
    /// Number with an explicit `cellXfs` index.
    Styled(f64, u32),
    Boolean(bool),
    Error(String),
    /// Empty cell (`<c r=".."/>`).
    Empty,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Shared(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Empty, Into::into)
    }
}

/// A cell in the sheet.
#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: Value,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    /// Leave out `r` attributes on rows and cells.
    pub omit_refs: bool,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Add a cell with a value.
    #[must_use]
    pub fn cell<V: Into<Value>>(mut self, cell_ref: &str, value: V) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
        });
        self
    }

    /// Fill row `row` (1-based) from column A onwards.
    #[must_use]
    pub fn row(mut self, row: u32, values: Vec<Value>) -> Self {
        for (col, value) in values.into_iter().enumerate() {
            let cell_ref = format!("{}{row}", col_letter(col as u32));
            self.cells.push(CellEntry { cell_ref, value });
        }
        self
    }

    /// Write cells without `r` attributes, relying on document order.
    #[must_use]
    pub fn without_refs(mut self) -> Self {
        self.omit_refs = true;
        self
    }
}

/// Builder for a complete workbook.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    date1904: bool,
    skip_styles: bool,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Use the 1904 date system.
    #[must_use]
    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    /// Leave xl/styles.xml out of the package.
    #[must_use]
    pub fn without_styles(mut self) -> Self {
        self.skip_styles = true;
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut shared_strings: Vec<String> = Vec::new();
        for cell in self.sheets.iter().flat_map(|s| &s.cells) {
            if let Value::Shared(ref s) = cell.value {
                if !shared_strings.contains(s) {
                    shared_strings.push(s.clone());
                }
            }
        }

        let mut write = |name: &str, body: String| {
            zip.start_file(name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        };

        write("[Content_Types].xml", generate_content_types(self.sheets.len()));
        write("_rels/.rels", RELS_XML.to_string());
        write(
            "xl/_rels/workbook.xml.rels",
            generate_workbook_rels(self.sheets.len()),
        );
        write("xl/workbook.xml", generate_workbook(&self.sheets, self.date1904));
        if !self.skip_styles {
            write("xl/styles.xml", STYLES_XML.to_string());
        }
        if !shared_strings.is_empty() {
            write("xl/sharedStrings.xml", generate_shared_strings(&shared_strings));
        }
        for (i, sheet) in self.sheets.iter().enumerate() {
            write(
                &format!("xl/worksheets/sheet{}.xml", i + 1),
                generate_sheet_xml(sheet, &shared_strings),
            );
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}

/// Convenience: one sheet whose first row is `header` and whose following
/// rows are `rows`.
pub fn table_xlsx(header: &[&str], rows: Vec<Vec<Value>>) -> Vec<u8> {
    let mut sheet = SheetBuilder::new("Sheet1").row(1, header.iter().map(|&h| h.into()).collect());
    for (idx, row) in rows.into_iter().enumerate() {
        sheet = sheet.row(idx as u32 + 2, row);
    }
    XlsxBuilder::new().sheet(sheet).build()
}

/// Convert a 0-based column index to letters (0 -> A).
pub fn col_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col + 1;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="170" formatCode="dd/mm/yyyy\ hh:mm"/></numFmts>
  <fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
  <fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
  <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
    <xf numFmtId="170" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
  </cellXfs>
</styleSheet>"#;

fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            "  <Override PartName=\"/xl/worksheets/sheet{i}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\n"
        ));
    }
    xml.push_str("</Types>");
    xml
}

/// Relationship ids are listed in reverse so that resolving the first sheet
/// has to go through the ids rather than document order.
fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
    );
    for i in (1..=sheet_count).rev() {
        xml.push_str(&format!(
            "  <Relationship Id=\"rId{i}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{i}.xml\"/>\n"
        ));
    }
    let next = sheet_count + 1;
    xml.push_str(&format!(
        "  <Relationship Id=\"rId{next}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>\n"
    ));
    xml.push_str(&format!(
        "  <Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings\" Target=\"sharedStrings.xml\"/>\n",
        next + 1
    ));
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder], date1904: bool) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
"#,
    );
    if date1904 {
        xml.push_str("  <workbookPr date1904=\"1\"/>\n");
    }
    xml.push_str("  <sheets>\n");
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            "    <sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>\n",
            xml_escape(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("  </sheets>\n</workbook>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">
"#,
        strings.len()
    );
    for s in strings {
        xml.push_str(&format!(
            "  <si><t xml:space=\"preserve\">{}</t></si>\n",
            xml_escape(s)
        ));
    }
    xml.push_str("</sst>");
    xml
}

/// Split "B12" into its row number.
fn row_of(cell_ref: &str) -> u32 {
    cell_ref
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .unwrap()
}

fn generate_sheet_xml(sheet: &SheetBuilder, shared_strings: &[String]) -> String {
    let mut cells: Vec<&CellEntry> = sheet.cells.iter().collect();
    cells.sort_by_key(|c| row_of(&c.cell_ref));

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
"#,
    );

    let mut current_row: Option<u32> = None;
    for cell in cells {
        let row = row_of(&cell.cell_ref);
        if current_row != Some(row) {
            if current_row.is_some() {
                xml.push_str("</row>\n");
            }
            if sheet.omit_refs {
                xml.push_str("    <row>");
            } else {
                xml.push_str(&format!("    <row r=\"{row}\">"));
            }
            current_row = Some(row);
        }

        let r_attr = if sheet.omit_refs {
            String::new()
        } else {
            format!(" r=\"{}\"", cell.cell_ref)
        };
        let c = match &cell.value {
            Value::Shared(s) => {
                let idx = shared_strings.iter().position(|x| x == s).unwrap();
                format!("<c{r_attr} t=\"s\"><v>{idx}</v></c>")
            }
            Value::Inline(s) => {
                format!("<c{r_attr} t=\"inlineStr\"><is><t>{}</t></is></c>", xml_escape(s))
            }
            Value::Number(n) => format!("<c{r_attr}><v>{n}</v></c>"),
            Value::Date(n) => format!("<c{r_attr} s=\"{DATE_STYLE}\"><v>{n}</v></c>"),
            Value::Styled(n, style) => format!("<c{r_attr} s=\"{style}\"><v>{n}</v></c>"),
            Value::Boolean(b) => format!("<c{r_attr} t=\"b\"><v>{}</v></c>", u8::from(*b)),
            Value::Error(e) => format!("<c{r_attr} t=\"e\"><v>{}</v></c>", xml_escape(e)),
            Value::Empty => format!("<c{r_attr}/>"),
        };
        xml.push_str(&c);
    }
    if current_row.is_some() {
        xml.push_str("</row>\n");
    }

    xml.push_str("  </sheetData>\n</worksheet>");
    xml
}
