//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use prepline::pipeline::{DataIngestionArtifact, SchemaDescriptor};

pub const FEATURES: [&str; 5] = [
    "having_IP_Address",
    "URL_Length",
    "SSLfinal_State",
    "age_of_domain",
    "web_traffic",
];

/// Tabular fixture shaped like the phishing dataset
///
/// - five numeric features drawn uniformly from [0, 10)
/// - roughly `missing_rate` of feature cells left null
/// - `Result`: ±1 label, never missing
pub fn create_feature_dataframe(rows: usize, missing_rate: f64, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut columns: Vec<Column> = Vec::with_capacity(FEATURES.len() + 1);

    for name in FEATURES {
        let values: Vec<Option<f64>> = (0..rows)
            .map(|_| {
                let v = rng.gen_range(0.0..10.0);
                if rng.gen::<f64>() < missing_rate {
                    None
                } else {
                    Some(v)
                }
            })
            .collect();
        columns.push(Column::new(name.into(), values));
    }

    let target: Vec<i64> = (0..rows)
        .map(|_| if rng.gen_bool(0.5) { 1 } else { -1 })
        .collect();
    columns.push(Column::new("Result".into(), target));

    DataFrame::new(columns).unwrap()
}

/// Schema listing every column of [`create_feature_dataframe`]
pub fn feature_schema() -> SchemaDescriptor {
    SchemaDescriptor::from_names(FEATURES.iter().copied().chain(["Result"]))
}

/// Write a schema YAML with the given column names
pub fn write_schema(dir: &Path, names: &[&str]) -> PathBuf {
    let path = dir.join("schema.yaml");
    let mut yaml = String::from("columns:\n");
    for name in names {
        yaml.push_str(&format!("  - {}: float64\n", name));
    }
    std::fs::write(&path, yaml).unwrap();
    path
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");
    write_csv(df, &csv_path);
    (temp_dir, csv_path)
}

pub fn write_csv(df: &mut DataFrame, path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut file = std::fs::File::create(path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
}

/// Write train/test frames as an ingestion artifact under `dir`
pub fn ingestion_artifact(
    dir: &Path,
    train: &mut DataFrame,
    test: &mut DataFrame,
) -> DataIngestionArtifact {
    let train_file_path = dir.join("ingested").join("train.csv");
    let test_file_path = dir.join("ingested").join("test.csv");
    write_csv(train, &train_file_path);
    write_csv(test, &test_file_path);
    DataIngestionArtifact {
        train_file_path,
        test_file_path,
        train_rows: train.height(),
        test_rows: test.height(),
    }
}

/// Add `offset` to every value of a numeric column
pub fn shift_column(df: &DataFrame, name: &str, offset: f64) -> DataFrame {
    let shifted: Vec<Option<f64>> = df
        .column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.map(|x| x + offset))
        .collect();
    let mut out = df.clone();
    out.with_column(Column::new(name.into(), shifted)).unwrap();
    out
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}
