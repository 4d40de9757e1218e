//! # mdr-flatten - Adverse Event Report Flattening
//!
//! Converts a directory of adverse-event JSON documents into a flat,
//! spreadsheet-ready table. Each report is denormalized into one row per
//! device entry followed by one row per narrative-text entry.
//!
//! ## Modules
//!
//! - **report**: typed, tolerant view over one report and its sub-records
//! - **extractor**: the record flattener
//! - **source**: input discovery and per-file loading
//! - **writer**: workbook, CSV and JSON Lines output
//!
//! ## Quick Start
//!
//! ```rust
//! use mdr_flatten::{Column, FlattenConfig, RecordFlattener, Report};
//! use serde_json::json;
//!
//! let report = Report::from_value(&json!({
//!     "report_number": "3005099803-2021-01234",
//!     "device": [
//!         {"brand_name": "FIRST", "openfda": {"device_class": "2"}},
//!         {"brand_name": "SECOND", "openfda": {"device_class": "3"}}
//!     ],
//!     "mdr_text": [{"mdr_text_key": "1", "text": "DEVICE ALARMED"}]
//! }));
//!
//! let flattener = RecordFlattener::new(FlattenConfig::default());
//! let rows: Vec<_> = flattener.flatten(&report).collect();
//!
//! // rows[0..2] = one per device, rows[2] = the narrative text
//! assert_eq!(rows.len(), 3);
//! assert_eq!(rows[2].get(Column::DeviceClass), "3");
//! ```

use anyhow::{Context, Result};
use std::path::Path;

pub mod error;
pub mod extractor;
pub mod report;
pub mod sanitize;
pub mod source;
pub mod types;
pub mod writer;

// Re-export commonly used types for convenience
pub use error::FlattenError;
pub use extractor::{FlatRows, RecordFlattener};
pub use report::{Device, MdrText, Patient, Report};
pub use sanitize::sanitize;
pub use source::{discover_inputs, load_reports, process_file};
pub use types::{Column, FlatRow, FlattenConfig};
pub use writer::{open_writer, TableWriter, WriteStats};

/// Outcome of a whole conversion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertSummary {
    pub files_processed: usize,
    pub files_failed: usize,
    pub rows_written: usize,
    pub sheets: usize,
}

/// Main entry point: flatten every `.json` document in `input_dir` into `output`
///
/// A file that cannot be read or parsed is logged and skipped. Failing to
/// list the input directory or to write the output aborts the run.
pub fn convert(input_dir: &Path, output: &Path, config: &FlattenConfig) -> Result<ConvertSummary> {
    let inputs = discover_inputs(input_dir)?;
    let flattener = RecordFlattener::new(config.clone());
    let mut writer = open_writer(output, config)?;
    let mut summary = ConvertSummary::default();

    tracing::info!("Found {} JSON files in {}", inputs.len(), input_dir.display());

    for path in &inputs {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        tracing::info!("Processing: {}...", name);

        match process_file(&flattener, path) {
            Ok(rows) => {
                for row in &rows {
                    writer
                        .write_row(row)
                        .with_context(|| format!("Failed to write rows from {}", name))?;
                }
                summary.files_processed += 1;
            }
            Err(e) => {
                tracing::error!("Error processing {}: {}", name, e);
                summary.files_failed += 1;
            }
        }
    }

    let stats = writer.finish()?;
    summary.rows_written = stats.rows;
    summary.sheets = stats.sheets;

    tracing::info!(
        "Output file created: {} ({} rows, {} sheets, {} files skipped)",
        output.display(),
        summary.rows_written,
        summary.sheets,
        summary.files_failed
    );

    Ok(summary)
}
