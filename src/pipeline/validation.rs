//! Data validation stage: schema conformance and train/test drift
//!
//! Train and test splits are checked against the reference schema (column
//! count only) and against each other (per-column KS test). The datasets are
//! then written to either the valid or the invalid location, never both.

use std::path::{Path, PathBuf};

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::drift::{detect_dataset_drift, DriftReport};
use super::ingestion::DataIngestionArtifact;
use super::loader::{load_dataset, save_dataset};
use super::schema::SchemaDescriptor;
use crate::config::DataValidationConfig;
use crate::error::{self, Stage, StageContext};

/// Where validation routed the datasets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ValidationOutcome {
    Valid {
        train_file_path: PathBuf,
        test_file_path: PathBuf,
    },
    Invalid {
        train_file_path: PathBuf,
        test_file_path: PathBuf,
    },
}

/// Individual check results that make up the validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationChecks {
    pub train_columns_ok: bool,
    pub test_columns_ok: bool,
    pub no_drift: bool,
}

impl ValidationChecks {
    pub fn status(&self) -> bool {
        self.train_columns_ok && self.test_columns_ok && self.no_drift
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataValidationArtifact {
    pub outcome: ValidationOutcome,
    pub checks: ValidationChecks,
    pub drift_report_file_path: PathBuf,
}

impl DataValidationArtifact {
    pub fn validation_status(&self) -> bool {
        matches!(self.outcome, ValidationOutcome::Valid { .. })
    }

    /// Valid train/test paths, if validation passed
    pub fn valid_paths(&self) -> Option<(&Path, &Path)> {
        match &self.outcome {
            ValidationOutcome::Valid {
                train_file_path,
                test_file_path,
            } => Some((train_file_path.as_path(), test_file_path.as_path())),
            ValidationOutcome::Invalid { .. } => None,
        }
    }

    /// Invalid train/test paths, if validation failed
    pub fn invalid_paths(&self) -> Option<(&Path, &Path)> {
        match &self.outcome {
            ValidationOutcome::Invalid {
                train_file_path,
                test_file_path,
            } => Some((train_file_path.as_path(), test_file_path.as_path())),
            ValidationOutcome::Valid { .. } => None,
        }
    }
}

/// True iff the frame has exactly as many columns as the schema declares.
/// Names and dtypes are not compared.
pub fn validate_number_of_columns(df: &DataFrame, schema: &SchemaDescriptor) -> bool {
    let required = schema.column_count();
    info!("Required number of columns: {}", required);
    info!("Data frame has columns: {}", df.width());
    df.width() == required
}

pub struct DataValidation {
    ingestion_artifact: DataIngestionArtifact,
    config: DataValidationConfig,
    schema: SchemaDescriptor,
}

impl DataValidation {
    pub fn new(
        ingestion_artifact: DataIngestionArtifact,
        config: DataValidationConfig,
        schema: SchemaDescriptor,
    ) -> Self {
        Self {
            ingestion_artifact,
            config,
            schema,
        }
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn validate_number_of_columns(&self, df: &DataFrame) -> bool {
        validate_number_of_columns(df, &self.schema)
    }

    /// Run the drift test and always persist the report
    pub fn detect_dataset_drift(
        &self,
        base_df: &DataFrame,
        current_df: &DataFrame,
    ) -> Result<(bool, DriftReport)> {
        let (no_drift, report) =
            detect_dataset_drift(base_df, current_df, self.config.drift_threshold)?;
        report.write_yaml(&self.config.drift_report_file_path)?;
        Ok((no_drift, report))
    }

    pub fn initiate_data_validation(&self) -> error::Result<DataValidationArtifact> {
        info!("Entered initiate_data_validation");
        self.run().stage(Stage::Validation)
    }

    fn run(&self) -> Result<DataValidationArtifact> {
        let train_path = &self.ingestion_artifact.train_file_path;
        let test_path = &self.ingestion_artifact.test_file_path;

        let mut train_df = load_dataset(train_path, 0)?;
        let mut test_df = load_dataset(test_path, 0)?;

        let train_columns_ok = self.validate_number_of_columns(&train_df);
        if !train_columns_ok {
            warn!("Train dataset does not match the schema column count");
        }

        let test_columns_ok = self.validate_number_of_columns(&test_df);
        if !test_columns_ok {
            warn!("Test dataset does not match the schema column count");
        }

        let (no_drift, report) = self.detect_dataset_drift(&train_df, &test_df)?;
        if !no_drift {
            warn!(
                columns = ?report.drifted_columns(),
                "Dataset drift detected between train and test datasets"
            );
        }

        let checks = ValidationChecks {
            train_columns_ok,
            test_columns_ok,
            no_drift,
        };

        let outcome = if checks.status() {
            let train_out = self.config.valid_train_file_path.clone();
            let test_out = self.config.valid_test_file_path.clone();
            save_dataset(&mut train_df, &train_out)?;
            save_dataset(&mut test_df, &test_out)?;
            ValidationOutcome::Valid {
                train_file_path: train_out,
                test_file_path: test_out,
            }
        } else {
            let train_out = self.config.invalid_train_file_path.clone();
            let test_out = self.config.invalid_test_file_path.clone();
            save_dataset(&mut train_df, &train_out)?;
            save_dataset(&mut test_df, &test_out)?;
            ValidationOutcome::Invalid {
                train_file_path: train_out,
                test_file_path: test_out,
            }
        };

        info!(status = checks.status(), "Data validation completed");

        Ok(DataValidationArtifact {
            outcome,
            checks,
            drift_report_file_path: self.config.drift_report_file_path.clone(),
        })
    }
}
