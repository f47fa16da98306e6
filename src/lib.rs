//! xlsplit - split an XLSX workbook into smaller workbooks
//!
//! Reads the first worksheet of an uploaded file, groups its rows either into
//! fixed-size chunks or by the distinct values of one column, writes each
//! group as its own XLSX file and bundles them into one ZIP archive.
//!
//! Runs natively (see the `xlsplit_cli` binary) and in the browser via
//! WebAssembly.
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { split_by_column, archive_file_name, archive_data_url } from 'xlsplit';
//! await init();
//! const zip = split_by_column(bytes, 'report', 'Region');
//! link.href = archive_data_url(zip);
//! link.download = archive_file_name('report');
//! ```

pub mod cell_ref;
pub mod error;
pub mod export;
pub mod numfmt;
pub mod parser;
pub mod pipeline;
pub mod split;
pub mod types;
pub mod xml_helpers;

use wasm_bindgen::prelude::*;

pub use error::{Result, XlsplitError};
pub use export::{write_xlsx, ArchiveBuilder, ArchiveEntry};
pub use parser::{inspect, parse, parse_with_options, ParseOptions};
pub use pipeline::{run, split_xlsx, PipelineState, SplitOutput, SplitRequest};
pub use split::{partition, sanitize_label, Chunk};
pub use types::*;

/// Split into files of `rows` rows each and return the ZIP bytes.
///
/// # Errors
/// Returns the run's error message if any stage fails.
#[wasm_bindgen]
pub fn split_by_rows(
    data: &[u8],
    base_name: &str,
    rows: i32,
) -> std::result::Result<Vec<u8>, JsValue> {
    let policy = SplitPolicy::by_row_count(i64::from(rows))?;
    Ok(split_xlsx(data, &policy, base_name)?.archive)
}

/// Split into one file per distinct value of `column` and return the ZIP bytes.
///
/// # Errors
/// Returns the run's error message if any stage fails.
#[wasm_bindgen]
pub fn split_by_column(
    data: &[u8],
    base_name: &str,
    column: &str,
) -> std::result::Result<Vec<u8>, JsValue> {
    let policy = SplitPolicy::by_column(column);
    Ok(split_xlsx(data, &policy, base_name)?.archive)
}

/// Column names and row count of the first worksheet, as JSON.
///
/// # Errors
/// Returns an error if the XLSX file is invalid or cannot be parsed.
#[wasm_bindgen]
pub fn inspect_xlsx(data: &[u8]) -> std::result::Result<String, JsValue> {
    let summary = parser::inspect(data)?;
    serde_json::to_string(&summary)
        .map_err(|e| JsValue::from_str(&format!("JSON serialization error: {e}")))
}

/// Suggested download name for the archive.
#[must_use]
#[wasm_bindgen]
pub fn archive_file_name(base_name: &str) -> String {
    pipeline::archive_file_name(base_name)
}

/// `data:` URL for the archive bytes, usable as a download link target.
#[must_use]
#[wasm_bindgen]
pub fn archive_data_url(archive: &[u8]) -> String {
    pipeline::archive_data_url(archive)
}

/// Route Rust panics to the browser console.
#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
