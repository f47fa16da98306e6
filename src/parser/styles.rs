//! Cell format lookup from xl/styles.xml.
//!
//! Only the number format of each cell format (`xf`) matters here: it decides
//! whether a numeric cell is a date.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

use crate::numfmt::is_date_format_id;
use crate::xml_helpers::{attr_string, attr_u32};

/// Parse styles.xml into one "is a date format" flag per `cellXfs` entry.
///
/// Styles are optional; a missing or unreadable part yields no flags, so every
/// number stays a number.
pub(super) fn parse_date_styles<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Vec<bool> {
    let styles_path = path.unwrap_or("xl/styles.xml");
    let Ok(file) = archive.by_name(styles_path) else {
        return Vec::new();
    };
    parse_date_flags(BufReader::new(file))
}

/// Date flags for each `cellXfs/xf`, in order.
pub(super) fn parse_date_flags<R: BufRead>(reader: R) -> Vec<bool> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut custom_formats: HashMap<u32, String> = HashMap::new();
    let mut xf_num_fmts: Vec<u32> = Vec::new();
    let mut buf = Vec::new();
    let mut in_num_fmts = false;
    let mut in_cell_xfs = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let is_start = matches!(event, Event::Start(_));
                match e.local_name().as_ref() {
                    b"numFmts" => in_num_fmts = is_start,
                    b"cellXfs" => in_cell_xfs = is_start,
                    b"numFmt" if in_num_fmts => {
                        if let (Some(id), Some(code)) =
                            (attr_u32(e, b"numFmtId"), attr_string(e, b"formatCode"))
                        {
                            custom_formats.insert(id, code);
                        }
                    }
                    b"xf" if in_cell_xfs => {
                        xf_num_fmts.push(attr_u32(e, b"numFmtId").unwrap_or(0));
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"numFmts" => in_num_fmts = false,
                b"cellXfs" => in_cell_xfs = false,
                _ => {}
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    xf_num_fmts
        .into_iter()
        .map(|id| is_date_format_id(id, custom_formats.get(&id).map(String::as_str)))
        .collect()
}
