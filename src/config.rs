//! Pipeline configuration: directory layout, file names and stage settings.
//!
//! Every path a stage reads or writes is derived from a single
//! [`TrainingPipelineConfig`], so one run's artifacts always live under one
//! directory.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::pipeline::ImputerParams;

/// Default name of the column the model will predict
pub const TARGET_COLUMN: &str = "Result";

pub const PIPELINE_NAME: &str = "prepline";
pub const ARTIFACT_DIR: &str = "artifacts";
pub const LOG_DIR: &str = "logs";
pub const SCHEMA_FILE_PATH: &str = "data_schema/schema.yaml";

/// Timestamp layout used for artifact and log directories
pub const TIMESTAMP_FORMAT: &str = "%m_%d_%Y_%H_%M_%S";

pub const FILE_NAME: &str = "raw.csv";
pub const TRAIN_FILE_NAME: &str = "train.csv";
pub const TEST_FILE_NAME: &str = "test.csv";

pub const DATA_INGESTION_DIR_NAME: &str = "data_ingestion";
pub const DATA_INGESTION_FEATURE_STORE_DIR: &str = "feature_store";
pub const DATA_INGESTION_INGESTED_DIR: &str = "ingested";
pub const DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO: f64 = 0.2;

pub const DATA_VALIDATION_DIR_NAME: &str = "data_validation";
pub const DATA_VALIDATION_VALID_DIR: &str = "validated";
pub const DATA_VALIDATION_INVALID_DIR: &str = "invalid";
pub const DATA_VALIDATION_DRIFT_REPORT_DIR: &str = "drift_report";
pub const DATA_VALIDATION_DRIFT_REPORT_FILE_NAME: &str = "report.yaml";
pub const DATA_VALIDATION_DRIFT_THRESHOLD: f64 = 0.05;

pub const DATA_TRANSFORMATION_DIR_NAME: &str = "data_transformation";
pub const DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR: &str = "transformed";
pub const DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR: &str = "transformed_object";
pub const TRANSFORMED_TRAIN_FILE_NAME: &str = "train.parquet";
pub const TRANSFORMED_TEST_FILE_NAME: &str = "test.parquet";
pub const PREPROCESSING_OBJECT_FILE_NAME: &str = "preprocessor.json";

/// Current local time formatted with [`TIMESTAMP_FORMAT`]
pub fn current_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Root of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingPipelineConfig {
    pub pipeline_name: String,
    pub artifact_dir: PathBuf,
    pub timestamp: String,
}

impl TrainingPipelineConfig {
    /// Timestamped artifact directory under `./artifacts`
    pub fn new() -> Self {
        let timestamp = current_timestamp();
        Self {
            pipeline_name: PIPELINE_NAME.to_string(),
            artifact_dir: Path::new(ARTIFACT_DIR).join(&timestamp),
            timestamp,
        }
    }

    /// Use an explicit artifact directory instead of the timestamped default
    pub fn with_artifact_dir(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipeline_name: PIPELINE_NAME.to_string(),
            artifact_dir: artifact_dir.into(),
            timestamp: current_timestamp(),
        }
    }
}

impl Default for TrainingPipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataIngestionConfig {
    pub data_ingestion_dir: PathBuf,
    pub feature_store_file_path: PathBuf,
    pub training_file_path: PathBuf,
    pub testing_file_path: PathBuf,
    /// Fraction of rows assigned to the test split
    pub train_test_split_ratio: f64,
    /// Shuffle seed; `None` draws from the thread RNG
    pub seed: Option<u64>,
    /// Rows used for CSV schema inference (0 = full scan)
    pub infer_schema_length: usize,
}

impl DataIngestionConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let data_ingestion_dir = pipeline.artifact_dir.join(DATA_INGESTION_DIR_NAME);
        let ingested_dir = data_ingestion_dir.join(DATA_INGESTION_INGESTED_DIR);
        Self {
            feature_store_file_path: data_ingestion_dir
                .join(DATA_INGESTION_FEATURE_STORE_DIR)
                .join(FILE_NAME),
            training_file_path: ingested_dir.join(TRAIN_FILE_NAME),
            testing_file_path: ingested_dir.join(TEST_FILE_NAME),
            data_ingestion_dir,
            train_test_split_ratio: DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO,
            seed: None,
            infer_schema_length: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataValidationConfig {
    pub data_validation_dir: PathBuf,
    pub valid_train_file_path: PathBuf,
    pub valid_test_file_path: PathBuf,
    pub invalid_train_file_path: PathBuf,
    pub invalid_test_file_path: PathBuf,
    pub drift_report_file_path: PathBuf,
    /// p-values strictly below this flag a column as drifted
    pub drift_threshold: f64,
}

impl DataValidationConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let data_validation_dir = pipeline.artifact_dir.join(DATA_VALIDATION_DIR_NAME);
        let valid_dir = data_validation_dir.join(DATA_VALIDATION_VALID_DIR);
        let invalid_dir = data_validation_dir.join(DATA_VALIDATION_INVALID_DIR);
        Self {
            valid_train_file_path: valid_dir.join(TRAIN_FILE_NAME),
            valid_test_file_path: valid_dir.join(TEST_FILE_NAME),
            invalid_train_file_path: invalid_dir.join(TRAIN_FILE_NAME),
            invalid_test_file_path: invalid_dir.join(TEST_FILE_NAME),
            drift_report_file_path: data_validation_dir
                .join(DATA_VALIDATION_DRIFT_REPORT_DIR)
                .join(DATA_VALIDATION_DRIFT_REPORT_FILE_NAME),
            data_validation_dir,
            drift_threshold: DATA_VALIDATION_DRIFT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTransformationConfig {
    pub data_transformation_dir: PathBuf,
    pub transformed_train_file_path: PathBuf,
    pub transformed_test_file_path: PathBuf,
    pub transformed_object_file_path: PathBuf,
    pub target_column: String,
    pub imputer: ImputerParams,
}

impl DataTransformationConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let data_transformation_dir = pipeline.artifact_dir.join(DATA_TRANSFORMATION_DIR_NAME);
        let transformed_dir = data_transformation_dir.join(DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR);
        Self {
            transformed_train_file_path: transformed_dir.join(TRANSFORMED_TRAIN_FILE_NAME),
            transformed_test_file_path: transformed_dir.join(TRANSFORMED_TEST_FILE_NAME),
            transformed_object_file_path: data_transformation_dir
                .join(DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR)
                .join(PREPROCESSING_OBJECT_FILE_NAME),
            data_transformation_dir,
            target_column: TARGET_COLUMN.to_string(),
            imputer: ImputerParams::default(),
        }
    }
}
