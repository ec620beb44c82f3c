//! Data ingestion stage: pull raw records, split into train/test, persist

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use super::loader::{load_dataset, save_dataset};
use crate::config::DataIngestionConfig;
use crate::error::{self, Stage, StageContext};

/// Bookkeeping column added by the record store, never a feature
pub const STORE_ID_COLUMN: &str = "_id";

/// A store the raw dataset can be pulled from
pub trait DataSource {
    /// Fetch every record as a DataFrame
    fn fetch(&self) -> Result<DataFrame>;

    /// Human-readable location, used in logs and error messages
    fn describe(&self) -> String;
}

/// Raw records exported to a CSV or Parquet file
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    infer_schema_length: usize,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            infer_schema_length: 10_000,
        }
    }

    pub fn with_infer_schema_length(mut self, infer_schema_length: usize) -> Self {
        self.infer_schema_length = infer_schema_length;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for FileSource {
    fn fetch(&self) -> Result<DataFrame> {
        load_dataset(&self.path, self.infer_schema_length)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataIngestionArtifact {
    pub train_file_path: PathBuf,
    pub test_file_path: PathBuf,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Randomly partition rows into `(train, test)`.
///
/// The test split receives `ceil(rows * test_ratio)` rows. A fixed `seed`
/// makes the partition reproducible.
pub fn train_test_split(
    df: &DataFrame,
    test_ratio: f64,
    seed: Option<u64>,
) -> Result<(DataFrame, DataFrame)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        anyhow::bail!("Test ratio must be between 0 and 1 (exclusive), got {}", test_ratio);
    }

    let n_rows = df.height();
    let n_test = (n_rows as f64 * test_ratio).ceil() as usize;
    let n_train = n_rows.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        anyhow::bail!(
            "Cannot split {} row(s) with test ratio {}: one partition would be empty",
            n_rows,
            test_ratio
        );
    }

    let mut indices: Vec<IdxSize> = (0..n_rows as IdxSize).collect();
    match seed {
        Some(seed) => indices.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => indices.shuffle(&mut rand::thread_rng()),
    }

    let (test_idx, train_idx) = indices.split_at(n_test);
    let train = df.take(&IdxCa::from_vec("idx".into(), train_idx.to_vec()))?;
    let test = df.take(&IdxCa::from_vec("idx".into(), test_idx.to_vec()))?;

    Ok((train, test))
}

pub struct DataIngestion<S: DataSource> {
    config: DataIngestionConfig,
    source: S,
}

impl<S: DataSource> DataIngestion<S> {
    pub fn new(config: DataIngestionConfig, source: S) -> Self {
        Self { config, source }
    }

    /// Pull all records and drop the store's id column
    pub fn export_collection_as_dataframe(&self) -> Result<DataFrame> {
        let df = self
            .source
            .fetch()
            .with_context(|| format!("Failed to fetch records from {}", self.source.describe()))?;

        let df = if df.get_column_names().iter().any(|c| c.as_str() == STORE_ID_COLUMN) {
            df.drop(STORE_ID_COLUMN)?
        } else {
            df
        };

        info!(
            rows = df.height(),
            columns = df.width(),
            source = %self.source.describe(),
            "Exported records from store"
        );
        Ok(df)
    }

    pub fn export_data_into_feature_store(&self, df: &mut DataFrame) -> Result<()> {
        save_dataset(df, &self.config.feature_store_file_path)
    }

    /// Split, persist both partitions and return their row counts
    pub fn split_data_as_train_test(&self, df: &DataFrame) -> Result<(usize, usize)> {
        let (mut train, mut test) = train_test_split(
            df,
            self.config.train_test_split_ratio,
            self.config.seed,
        )?;
        info!(
            train_rows = train.height(),
            test_rows = test.height(),
            "Performed train test split"
        );

        save_dataset(&mut train, &self.config.training_file_path)?;
        save_dataset(&mut test, &self.config.testing_file_path)?;
        Ok((train.height(), test.height()))
    }

    pub fn initiate_data_ingestion(&self) -> error::Result<DataIngestionArtifact> {
        info!("Entered initiate_data_ingestion");
        self.run().stage(Stage::Ingestion)
    }

    fn run(&self) -> Result<DataIngestionArtifact> {
        let mut df = self.export_collection_as_dataframe()?;
        self.export_data_into_feature_store(&mut df)?;
        let (train_rows, test_rows) = self.split_data_as_train_test(&df)?;

        Ok(DataIngestionArtifact {
            train_file_path: self.config.training_file_path.clone(),
            test_file_path: self.config.testing_file_path.clone(),
            train_rows,
            test_rows,
        })
    }
}
