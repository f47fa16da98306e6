//! End-to-end run: load, partition, write, archive.
//!
//! Every run is independent. It either returns the finished archive or stops
//! at the first failure with one error and no partial output.

use std::fmt;

use base64::Engine;

use crate::error::{Result, XlsplitError};
use crate::export::{write_xlsx, ArchiveBuilder};
use crate::parser;
use crate::split::partition;
use crate::types::SplitPolicy;

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct SplitRequest<'a> {
    /// Uploaded workbook bytes; `None` when nothing was uploaded.
    pub data: Option<&'a [u8]>,
    /// Prefix for every output file name. Must not be blank.
    pub base_name: &'a str,
    pub policy: SplitPolicy,
}

/// A finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutput {
    /// ZIP bytes holding one workbook per chunk.
    pub archive: Vec<u8>,
    /// Suggested download name, `{base}_1.zip`.
    pub file_name: String,
    /// Archive member names in order.
    pub entries: Vec<String>,
}

impl SplitOutput {
    /// `data:` URL for handing the archive to a browser download link.
    #[must_use]
    pub fn data_url(&self) -> String {
        archive_data_url(&self.archive)
    }
}

/// Stages of a run, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Loaded,
    Partitioned,
    Written { done: usize, total: usize },
    Archived,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Loaded => f.write_str("loaded"),
            Self::Partitioned => f.write_str("partitioned"),
            Self::Written { done, total } => write!(f, "written {done}/{total}"),
            Self::Archived => f.write_str("archived"),
            Self::Done => f.write_str("done"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Suggested archive file name for a base name.
#[must_use]
pub fn archive_file_name(base_name: &str) -> String {
    format!("{base_name}_1.zip")
}

/// Encode archive bytes as a `data:application/zip;base64,` URL.
#[must_use]
pub fn archive_data_url(archive: &[u8]) -> String {
    format!(
        "data:application/zip;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(archive)
    )
}

fn entry_name(base_name: &str, label: &str) -> String {
    format!("{base_name}_{label}.xlsx")
}

/// Split workbook bytes with `policy` and bundle the results.
pub fn split_xlsx(data: &[u8], policy: &SplitPolicy, base_name: &str) -> Result<SplitOutput> {
    run(&SplitRequest {
        data: Some(data),
        base_name,
        policy: policy.clone(),
    })
}

/// Run the whole pipeline for one request.
pub fn run(request: &SplitRequest<'_>) -> Result<SplitOutput> {
    let result = run_stages(request);
    if let Err(err) = &result {
        tracing::debug!(state = %PipelineState::Failed, error = %err, "pipeline stopped");
    }
    result
}

fn run_stages(request: &SplitRequest<'_>) -> Result<SplitOutput> {
    transition(PipelineState::Idle);

    let data = request
        .data
        .ok_or_else(|| XlsplitError::MissingInput("no file was uploaded".to_string()))?;
    if request.base_name.trim().is_empty() {
        return Err(XlsplitError::MissingInput(
            "a base name for the output files is required".to_string(),
        ));
    }

    let table = parser::parse(data)?;
    transition(PipelineState::Loaded);

    request.policy.validate_for(&table)?;
    let chunks = partition(&table, &request.policy)?;
    transition(PipelineState::Partitioned);

    let total = chunks.len();
    let mut builder = ArchiveBuilder::new();
    for (idx, chunk) in chunks.iter().enumerate() {
        let bytes = write_xlsx(&chunk.table)?;
        builder.add(entry_name(request.base_name, &chunk.label), bytes);
        transition(PipelineState::Written {
            done: idx + 1,
            total,
        });
    }

    let entries: Vec<String> = builder.file_names().map(str::to_string).collect();
    let archive = builder.finish()?;
    transition(PipelineState::Archived);

    let output = SplitOutput {
        archive,
        file_name: archive_file_name(request.base_name),
        entries,
    };
    tracing::info!(
        file_name = %output.file_name,
        entries = output.entries.len(),
        bytes = output.archive.len(),
        "split complete"
    );
    transition(PipelineState::Done);
    Ok(output)
}

fn transition(state: PipelineState) {
    tracing::debug!(state = %state, "pipeline");
}
