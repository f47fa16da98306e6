//! XLSX reader
//!
//! Opens the ZIP package, finds the first worksheet and turns it into a
//! [`Table`]: the first populated row becomes the header, later rows the data.

mod relationships;
mod styles;
mod worksheet;

use std::collections::HashMap;
use std::io::Cursor;
use zip::ZipArchive;

use crate::error::{Result, XlsplitError};
use crate::types::{CellValue, Table, TableSummary};

use relationships::{get_first_sheet, parse_shared_strings, parse_workbook_relationships};
use styles::parse_date_styles;
use worksheet::{parse_sheet, CellContext, RawCell};

/// Strings read as missing values, the same set pandas treats as NA.
pub const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Largest header-plus-data grid a worksheet may lay out. Blank cells inside
/// the used range count.
pub const MAX_GRID_CELLS: usize = 1 << 25;

/// Reader options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Treat the strings in [`NA_MARKERS`] as empty cells.
    pub na_markers: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { na_markers: true }
    }
}

/// Parse XLSX bytes into a table with default options.
pub fn parse(data: &[u8]) -> Result<Table> {
    parse_with_options(data, ParseOptions::default())
}

/// Column names and row count without keeping the table around.
pub fn inspect(data: &[u8]) -> Result<TableSummary> {
    parse(data).map(|table| table.summary())
}

/// Parse XLSX bytes into a table.
pub fn parse_with_options(data: &[u8], options: ParseOptions) -> Result<Table> {
    let mut archive = ZipArchive::new(Cursor::new(data)).map_err(XlsplitError::load)?;

    let relationships = parse_workbook_relationships(&mut archive);
    let sheet = get_first_sheet(&mut archive, &relationships.worksheets)?;
    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref())?;
    let date_styles = parse_date_styles(&mut archive, relationships.styles.as_deref());

    let ctx = CellContext {
        shared_strings: &shared_strings,
        date_styles: &date_styles,
        date1904: sheet.date1904,
    };
    let cells = parse_sheet(&mut archive, &sheet.path, &ctx)?;
    let table = build_table(cells, options)?;

    tracing::debug!(
        sheet = %sheet.name,
        path = %sheet.path,
        columns = table.column_count(),
        rows = table.row_count(),
        "loaded worksheet"
    );
    Ok(table)
}

/// Lay raw cells out on a grid and split off the header row.
fn build_table(cells: Vec<RawCell>, options: ParseOptions) -> Result<Table> {
    let populated = || cells.iter().filter(|c| !c.value.is_empty());

    let Some(header_row) = populated().map(|c| c.row).min() else {
        return Table::new(Vec::new(), Vec::new());
    };
    let last_row = populated().map(|c| c.row).max().unwrap_or(header_row);
    let last_col = populated().map(|c| c.col).max().unwrap_or(0);

    let height = grid_extent(header_row, last_row)?;
    let width = grid_extent(0, last_col)?;
    match height.checked_mul(width) {
        Some(n) if n <= MAX_GRID_CELLS => {}
        _ => {
            return Err(XlsplitError::Load(format!(
                "worksheet spans {height} rows by {width} columns, more than {MAX_GRID_CELLS} cells"
            )))
        }
    }

    let mut grid = vec![vec![CellValue::Empty; width]; height];
    for cell in cells {
        if cell.row < header_row {
            continue;
        }
        let slot = usize::try_from(cell.row - header_row)
            .ok()
            .and_then(|r| grid.get_mut(r))
            .zip(usize::try_from(cell.col).ok())
            .and_then(|(row, col)| row.get_mut(col));
        if let Some(slot) = slot {
            *slot = cell.value;
        }
    }

    let mut rows = grid.into_iter();
    let header = rows.next().unwrap_or_default();
    let columns = column_names(&header);

    let rows = rows
        .map(|row| row.into_iter().map(|v| normalize_null(v, options)).collect())
        .collect();
    Table::new(columns, rows)
}

/// Number of grid slots from `first` to `last` inclusive.
fn grid_extent(first: u32, last: u32) -> Result<usize> {
    last.checked_sub(first)
        .and_then(|span| usize::try_from(span).ok())
        .and_then(|span| span.checked_add(1))
        .ok_or_else(|| XlsplitError::load(format!("bad cell range {first}..={last}")))
}

/// Header cell text, with blanks named by position and repeats suffixed.
fn column_names(header: &[CellValue]) -> Vec<String> {
    let raw = header.iter().enumerate().map(|(idx, cell)| {
        let name = cell.to_string();
        if name.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name
        }
    });

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(header.len());
    for name in raw {
        let mut candidate = name;
        let mut count = seen.get(&candidate).copied().unwrap_or(0);
        while count > 0 {
            seen.insert(candidate.clone(), count + 1);
            candidate = format!("{candidate}.{count}");
            count = seen.get(&candidate).copied().unwrap_or(0);
        }
        seen.insert(candidate.clone(), 1);
        names.push(candidate);
    }
    names
}

fn normalize_null(value: CellValue, options: ParseOptions) -> CellValue {
    match &value {
        CellValue::Text(s) if s.is_empty() => CellValue::Empty,
        CellValue::Text(s) | CellValue::Error(s)
            if options.na_markers && NA_MARKERS.contains(&s.as_str()) =>
        {
            CellValue::Empty
        }
        _ => value,
    }
}
