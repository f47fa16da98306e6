//! Package-level parsing: workbook relationships, sheet list, shared strings.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufReader, Read, Seek};
use zip::ZipArchive;

use crate::error::{Result, XlsplitError};
use crate::xml_helpers::{attr_bool, attr_string, attr_string_local, unescape_xstring};

/// Workbook relationships parsed from xl/_rels/workbook.xml.rels
///
/// Paths are resolved relative to the xl/ directory and stored as full paths.
#[derive(Default, Debug)]
pub(super) struct WorkbookRelationships {
    /// Map of rId -> full path for worksheet relationships
    /// e.g., "rId1" -> "xl/worksheets/sheet1.xml"
    pub worksheets: HashMap<String, String>,
    /// Path to shared strings file (e.g., "xl/sharedStrings.xml")
    pub shared_strings: Option<String>,
    /// Path to styles file (e.g., "xl/styles.xml")
    pub styles: Option<String>,
}

/// The worksheet the table is read from, plus workbook-wide flags.
#[derive(Debug)]
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
    pub date1904: bool,
}

/// Resolve a relationship target against the xl/ directory.
fn resolve_target(target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        stripped.to_string()
    } else if let Some(stripped) = target.strip_prefix("../") {
        stripped.to_string()
    } else {
        format!("xl/{target}")
    }
}

/// Parse workbook relationships from xl/_rels/workbook.xml.rels
pub(super) fn parse_workbook_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> WorkbookRelationships {
    let mut rels = WorkbookRelationships::default();

    let Ok(file) = archive.by_name("xl/_rels/workbook.xml.rels") else {
        return rels; // Relationships file is optional
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);

    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let id = attr_string(e, b"Id").unwrap_or_default();
                    let target = attr_string(e, b"Target").unwrap_or_default();
                    let rel_type = attr_string(e, b"Type").unwrap_or_default();

                    if !target.is_empty() {
                        let full_path = resolve_target(&target);

                        if rel_type.ends_with("/worksheet") && !id.is_empty() {
                            rels.worksheets.insert(id, full_path);
                        } else if rel_type.ends_with("/sharedStrings") {
                            rels.shared_strings = Some(full_path);
                        } else if rel_type.ends_with("/styles") {
                            rels.styles = Some(full_path);
                        }
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    rels
}

/// Find the first worksheet in workbook order and the date1904 flag.
pub(super) fn get_first_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    relationships: &HashMap<String, String>,
) -> Result<SheetInfo> {
    let file = archive
        .by_name("xl/workbook.xml")
        .map_err(|e| XlsplitError::Load(format!("xl/workbook.xml: {e}")))?;

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(true);

    let mut first: Option<(String, String)> = None;
    let mut date1904 = false;
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    date1904 = attr_bool(e, b"date1904").unwrap_or(false);
                }
                b"sheet" if first.is_none() => {
                    let name = attr_string(e, b"name").unwrap_or_default();
                    let r_id = attr_string_local(e, b"id").unwrap_or_default();
                    first = Some((name, r_id));
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsplitError::Load(format!("xl/workbook.xml: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    let (name, r_id) =
        first.ok_or_else(|| XlsplitError::Load("workbook has no worksheets".to_string()))?;

    // Fall back to the conventional path when the relationship is missing
    let path = relationships
        .get(&r_id)
        .cloned()
        .unwrap_or_else(|| "xl/worksheets/sheet1.xml".to_string());

    Ok(SheetInfo {
        name,
        path,
        date1904,
    })
}

/// Parse the shared string table.
///
/// Rich-text runs inside one `<si>` are concatenated; phonetic runs
/// (`<rPh>`) are skipped.
pub(super) fn parse_shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Result<Vec<String>> {
    let sst_path = path.unwrap_or("xl/sharedStrings.xml");
    let Ok(file) = archive.by_name(sst_path) else {
        return Ok(Vec::new()); // SharedStrings is optional
    };

    let mut xml = Reader::from_reader(BufReader::new(file));
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current_string = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current_string.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                // <si/> and <si><t/></si> are valid empty strings
                if e.local_name().as_ref() == b"si" {
                    strings.push(String::new());
                }
            }
            Ok(Event::Text(ref e)) if in_t => {
                let text = e
                    .unescape()
                    .map_err(|e| XlsplitError::Load(format!("{sst_path}: {e}")))?;
                current_string.push_str(&text);
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(unescape_xstring(&current_string));
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsplitError::Load(format!("{sst_path}: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}
