//! Dataset loader and writer for CSV and Parquet files

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

/// Literal string exported by the record store for missing cells
pub const NA_STRING: &str = "na";

/// Lower-cased extension of a path, or an empty string
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Build a lazy scan over a dataset file (CSV or Parquet based on extension)
///
/// `infer_schema_length` of 0 means a full table scan for CSV type inference.
pub fn scan_dataset(path: &Path, infer_schema_length: usize) -> Result<LazyFrame> {
    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let lf = match extension_of(path).as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(schema_length)
            .with_null_values(Some(NullValues::AllColumnsSingle(NA_STRING.into())))
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        other => anyhow::bail!(
            "Unsupported file format: '{}'. Supported formats: csv, parquet",
            other
        ),
    };

    Ok(lf)
}

/// Load a dataset fully into memory
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    if !path.exists() {
        anyhow::bail!("Dataset file not found: {}", path.display());
    }

    scan_dataset(path, infer_schema_length)?
        .collect()
        .with_context(|| format!("Failed to read dataset: {}", path.display()))
}

/// Column names of a dataset without materialising its rows
pub fn get_column_names(path: &Path) -> Result<Vec<String>> {
    let schema = scan_dataset(path, 100)?
        .collect_schema()
        .with_context(|| format!("Failed to read schema of {}", path.display()))?;
    Ok(schema.iter_names().map(|name| name.to_string()).collect())
}

/// Create the parent directory of `path` if it does not exist yet
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Save a dataset to file (CSV or Parquet based on extension), creating parent directories
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;

    match extension_of(path).as_str() {
        "csv" => {
            let mut file = fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        "parquet" => {
            let file = fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        other => anyhow::bail!(
            "Unsupported output format: '{}'. Supported formats: csv, parquet",
            other
        ),
    }

    Ok(())
}
