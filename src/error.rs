//! Structured error types for xlsplit.
//!
//! One variant per pipeline stage, so the caller can show a single message
//! that still says where the run stopped.

use std::fmt::Display;

/// All errors that can occur while splitting a workbook.
#[derive(Debug, thiserror::Error)]
pub enum XlsplitError {
    /// No file was uploaded, or the base name is blank.
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Invalid row count or unknown split column.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The uploaded bytes are not a readable XLSX workbook.
    #[error("Could not read spreadsheet: {0}")]
    Load(String),

    /// Writing a chunk or the archive failed.
    #[error("Could not write output: {0}")]
    Serialization(String),

    /// Catch-all for anything outside the stages above.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XlsplitError>;

impl XlsplitError {
    /// Wrap a library error raised while reading the upload.
    pub(crate) fn load(err: impl Display) -> Self {
        Self::Load(err.to_string())
    }

    /// Wrap a library error raised while writing a chunk or the archive.
    pub(crate) fn serialization(err: impl Display) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for XlsplitError {
    fn from(e: std::io::Error) -> Self {
        Self::Unexpected(e.to_string())
    }
}

impl From<String> for XlsplitError {
    fn from(s: String) -> Self {
        Self::Unexpected(s)
    }
}

impl From<&str> for XlsplitError {
    fn from(s: &str) -> Self {
        Self::Unexpected(s.to_string())
    }
}

impl From<XlsplitError> for wasm_bindgen::JsValue {
    fn from(e: XlsplitError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
