//! Command-line argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{
    ARTIFACT_DIR, DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO, DATA_VALIDATION_DRIFT_THRESHOLD, LOG_DIR,
    SCHEMA_FILE_PATH, TARGET_COLUMN,
};
use crate::pipeline::{DistanceMetric, Weights, DEFAULT_N_NEIGHBORS};

/// Prepline - ingest, validate and impute a dataset into training arrays
#[derive(Parser, Debug)]
#[command(name = "prepline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Raw dataset to ingest (CSV or Parquet)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Schema YAML listing the expected columns
    #[arg(short, long, default_value = SCHEMA_FILE_PATH)]
    pub schema: PathBuf,

    /// Target column, kept out of imputation and appended as the last array column
    #[arg(short, long, default_value = TARGET_COLUMN)]
    pub target: String,

    /// Artifact directory for this run.
    /// Defaults to artifacts/<timestamp>.
    #[arg(short, long)]
    pub artifact_dir: Option<PathBuf>,

    /// Fraction of rows assigned to the test split (0 < ratio < 1)
    #[arg(long, default_value_t = DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO, value_parser = validate_test_ratio)]
    pub test_ratio: f64,

    /// Seed for the train/test shuffle; omit for a random split
    #[arg(long)]
    pub seed: Option<u64>,

    /// Columns whose KS p-value falls below this are flagged as drifted
    #[arg(long, default_value_t = DATA_VALIDATION_DRIFT_THRESHOLD, value_parser = validate_threshold)]
    pub drift_threshold: f64,

    /// Number of neighbours used by the KNN imputer
    #[arg(long, default_value_t = DEFAULT_N_NEIGHBORS, value_parser = validate_n_neighbors)]
    pub n_neighbors: usize,

    /// Neighbour weighting: "uniform" or "distance"
    #[arg(long, default_value = "uniform")]
    pub weights: Weights,

    /// Distance metric: "nan_euclidean" or "nan_manhattan"
    #[arg(long, default_value = "nan_euclidean")]
    pub metric: DistanceMetric,

    /// Directory for per-run log files
    #[arg(long, default_value = LOG_DIR)]
    pub log_dir: PathBuf,

    /// Increase stderr log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare two datasets column by column with the two-sample KS test
    Drift {
        /// Reference dataset (CSV or Parquet)
        base: PathBuf,

        /// Dataset checked against the reference
        current: PathBuf,

        /// Columns whose p-value falls below this are flagged as drifted
        #[arg(long, default_value_t = DATA_VALIDATION_DRIFT_THRESHOLD, value_parser = validate_threshold)]
        threshold: f64,

        /// Write the report as YAML to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Exit with a non-zero status when any column drifts
        #[arg(long, default_value = "false")]
        fail_on_drift: bool,

        /// Number of rows to use for schema inference (CSV only)
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,
    },
}

impl Cli {
    pub fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }
}

fn parse_f64(s: &str) -> Result<f64, String> {
    s.parse()
        .map_err(|_| format!("'{}' is not a valid number", s))
}

/// Validator for test_ratio: strictly inside (0, 1)
fn validate_test_ratio(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "test_ratio must be strictly between 0.0 and 1.0, got {}",
            value
        ))
    }
}

/// Validator for drift thresholds: within [0, 1]
fn validate_threshold(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "threshold must be between 0.0 and 1.0, got {}",
            value
        ))
    }
}

fn validate_n_neighbors(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid count", s))?;
    if value == 0 {
        Err("n_neighbors must be at least 1".to_string())
    } else {
        Ok(value)
    }
}
