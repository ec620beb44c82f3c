//! Integration tests for the data ingestion stage

use anyhow::Result;
use polars::prelude::*;
use prepline::config::{DataIngestionConfig, TrainingPipelineConfig};
use prepline::error::Stage;
use prepline::pipeline::{load_dataset, DataIngestion, DataSource, FileSource};
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

/// Record store stand-in that serves a fixed frame
struct InMemorySource(DataFrame);

impl DataSource for InMemorySource {
    fn fetch(&self) -> Result<DataFrame> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

fn ingestion_config(dir: &TempDir, seed: u64) -> DataIngestionConfig {
    let pipeline = TrainingPipelineConfig::with_artifact_dir(dir.path().join("run"));
    let mut config = DataIngestionConfig::new(&pipeline);
    config.seed = Some(seed);
    config
}

#[test]
fn test_ingestion_writes_feature_store_and_splits() {
    let temp_dir = TempDir::new().unwrap();
    let config = ingestion_config(&temp_dir, 42);

    let df = create_feature_dataframe(100, 0.1, 7);
    let ingestion = DataIngestion::new(config.clone(), InMemorySource(df));
    let artifact = ingestion.initiate_data_ingestion().unwrap();

    assert!(config.feature_store_file_path.exists(), "Feature store file should exist");
    assert_eq!(artifact.train_file_path, config.training_file_path);
    assert_eq!(artifact.test_file_path, config.testing_file_path);
    assert_eq!(artifact.test_rows, 20, "ceil(100 * 0.2) rows go to test");
    assert_eq!(artifact.train_rows, 80);

    let train = load_dataset(&artifact.train_file_path, 0).unwrap();
    let test = load_dataset(&artifact.test_file_path, 0).unwrap();
    assert_shape(&train, 80, 6);
    assert_shape(&test, 20, 6);

    let store = load_dataset(&config.feature_store_file_path, 0).unwrap();
    assert_shape(&store, 100, 6);
}

#[test]
fn test_store_id_column_is_dropped() {
    let temp_dir = TempDir::new().unwrap();
    let config = ingestion_config(&temp_dir, 1);

    let mut df = create_feature_dataframe(30, 0.0, 2);
    let ids: Vec<String> = (0..30).map(|i| format!("oid{:04}", i)).collect();
    df.with_column(Column::new("_id".into(), ids)).unwrap();

    let ingestion = DataIngestion::new(config, InMemorySource(df));
    let exported = ingestion.export_collection_as_dataframe().unwrap();

    assert_missing_columns(&exported, &["_id"]);
    assert_has_columns(&exported, &["Result"]);
    assert_eq!(exported.width(), 6);
}

#[test]
fn test_file_source_reads_na_markers() {
    let temp_dir = TempDir::new().unwrap();
    let raw = temp_dir.path().join("raw.csv");
    std::fs::write(&raw, "_id,a,Result\nx1,1.0,1\nx2,na,-1\nx3,2.5,1\nx4,na,-1\nx5,4.0,1\n").unwrap();

    let config = ingestion_config(&temp_dir, 3);
    let ingestion = DataIngestion::new(config, FileSource::new(&raw));
    let df = ingestion.export_collection_as_dataframe().unwrap();

    assert_shape(&df, 5, 2);
    assert_eq!(df.column("a").unwrap().null_count(), 2);
}

#[test]
fn test_same_seed_gives_same_split() {
    let df = create_feature_dataframe(60, 0.1, 11);

    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    let a = DataIngestion::new(ingestion_config(&dir_a, 99), InMemorySource(df.clone()))
        .initiate_data_ingestion()
        .unwrap();
    let b = DataIngestion::new(ingestion_config(&dir_b, 99), InMemorySource(df))
        .initiate_data_ingestion()
        .unwrap();

    let train_a = load_dataset(&a.train_file_path, 0).unwrap();
    let train_b = load_dataset(&b.train_file_path, 0).unwrap();
    assert!(train_a.equals_missing(&train_b), "Seeded splits should match");
}

#[test]
fn test_single_row_cannot_be_split() {
    let temp_dir = TempDir::new().unwrap();
    let config = ingestion_config(&temp_dir, 5);

    let df = create_feature_dataframe(1, 0.0, 5);
    let err = DataIngestion::new(config, InMemorySource(df))
        .initiate_data_ingestion()
        .unwrap_err();

    assert_eq!(err.stage, Stage::Ingestion);
}

#[test]
fn test_unreadable_source_fails_in_ingestion_stage() {
    let temp_dir = TempDir::new().unwrap();
    let config = ingestion_config(&temp_dir, 5);

    let source = FileSource::new(temp_dir.path().join("missing.csv"));
    let err = DataIngestion::new(config, source)
        .initiate_data_ingestion()
        .unwrap_err();

    assert_eq!(err.stage, Stage::Ingestion);
    assert!(err.to_string().contains("data ingestion"), "Unexpected error: {}", err);
}
