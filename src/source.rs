//! Input discovery and loading
//!
//! Each `.json` document in the input directory is expected to hold an
//! object with a `results` array of reports.

use crate::error::{FlattenError, Result};
use crate::extractor::RecordFlattener;
use crate::report::Report;
use crate::types::FlatRow;
use anyhow::{bail, Context};
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// List the `.json` files directly inside `dir`, sorted by file name
pub fn discover_inputs(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(dir)
        .with_context(|| format!("Failed to read input directory: {}", dir.display()))?;
    if !metadata.is_dir() {
        bail!("Input path is not a directory: {}", dir.display());
    }

    let mut inputs = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry
            .with_context(|| format!("Failed to list input directory: {}", dir.display()))?;
        if !entry.file_name().to_string_lossy().ends_with(".json") {
            continue;
        }
        // resolves symlinks; dangling links and directories are skipped
        if !entry.path().is_file() {
            tracing::warn!("Skipping {}: not a regular file", entry.path().display());
            continue;
        }
        inputs.push(entry.into_path());
    }

    Ok(inputs)
}

/// Parse one document and return its reports
pub fn load_reports(path: &Path) -> Result<Vec<Report>> {
    let mut bytes = std::fs::read(path).map_err(|source| FlattenError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let document: Value = simd_json::serde::from_slice(&mut bytes).map_err(|source| {
        FlattenError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;

    reports_from_document(path, &document)
}

fn reports_from_document(path: &Path, document: &Value) -> Result<Vec<Report>> {
    let Value::Object(obj) = document else {
        return Err(FlattenError::UnexpectedShape {
            path: path.to_path_buf(),
            detail: format!("top level is {}, expected an object", kind(document)),
        });
    };

    match obj.get("results") {
        None => Ok(Vec::new()),
        Some(Value::Array(results)) => Ok(results.iter().map(Report::from_value).collect()),
        Some(other) => Err(FlattenError::UnexpectedShape {
            path: path.to_path_buf(),
            detail: format!("`results` is {}, expected an array", kind(other)),
        }),
    }
}

/// Flatten every report of one file
///
/// Rows are collected so a failing file contributes nothing.
pub fn process_file(flattener: &RecordFlattener, path: &Path) -> Result<Vec<FlatRow>> {
    let reports = load_reports(path)?;
    let mut rows = Vec::new();

    for report in &reports {
        rows.extend(flattener.flatten(report));
    }

    tracing::debug!(
        "{}: {} reports flattened into {} rows",
        path.display(),
        reports.len(),
        rows.len()
    );

    Ok(rows)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
