//! Pipeline module - ingestion, validation and transformation stages
//!
//! [`TrainingPipeline`] runs the stages strictly in order. Transformation only
//! runs when validation routes the data to the valid location.

pub mod drift;
pub mod imputer;
pub mod ingestion;
pub mod loader;
pub mod schema;
pub mod transformation;
pub mod transformer;
pub mod validation;

pub use drift::*;
pub use imputer::*;
pub use ingestion::*;
pub use loader::*;
pub use schema::*;
pub use transformation::*;
pub use transformer::*;
pub use validation::*;

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use crate::config::{
    DataIngestionConfig, DataTransformationConfig, DataValidationConfig, TrainingPipelineConfig,
};
use crate::error::{self, Stage, StageContext};

/// Name of the marker file held while a run owns an artifact directory
pub const LOCK_FILE_NAME: &str = ".prepline.lock";

/// Exclusive claim on an artifact directory; released on drop
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(artifact_dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(artifact_dir).with_context(|| {
            format!("Failed to create artifact directory: {}", artifact_dir.display())
        })?;

        let path = artifact_dir.join(LOCK_FILE_NAME);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => anyhow::bail!(
                "Another pipeline run is using {} (remove {} if it is stale)",
                artifact_dir.display(),
                path.display()
            ),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to create lock file: {}", path.display())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Artifacts produced by one run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub ingestion: DataIngestionArtifact,
    pub validation: DataValidationArtifact,
    /// `None` when validation routed the data to the invalid location
    pub transformation: Option<DataTransformationArtifact>,
}

pub struct TrainingPipeline<S: DataSource> {
    pub pipeline_config: TrainingPipelineConfig,
    pub ingestion_config: DataIngestionConfig,
    pub validation_config: DataValidationConfig,
    pub transformation_config: DataTransformationConfig,
    schema: SchemaDescriptor,
    source: S,
}

impl<S: DataSource + Clone> TrainingPipeline<S> {
    /// Pipeline with every stage config derived from `pipeline_config`
    pub fn new(pipeline_config: TrainingPipelineConfig, schema: SchemaDescriptor, source: S) -> Self {
        Self {
            ingestion_config: DataIngestionConfig::new(&pipeline_config),
            validation_config: DataValidationConfig::new(&pipeline_config),
            transformation_config: DataTransformationConfig::new(&pipeline_config),
            pipeline_config,
            schema,
            source,
        }
    }

    pub fn lock(&self) -> error::Result<RunLock> {
        RunLock::acquire(&self.pipeline_config.artifact_dir).stage(Stage::Config)
    }

    pub fn start_data_ingestion(&self) -> error::Result<DataIngestionArtifact> {
        info!("Start data ingestion");
        let ingestion = DataIngestion::new(self.ingestion_config.clone(), self.source.clone());
        let artifact = ingestion.initiate_data_ingestion()?;
        info!(?artifact, "Data ingestion completed");
        Ok(artifact)
    }

    pub fn start_data_validation(
        &self,
        ingestion_artifact: DataIngestionArtifact,
    ) -> error::Result<DataValidationArtifact> {
        info!("Start data validation");
        let validation = DataValidation::new(
            ingestion_artifact,
            self.validation_config.clone(),
            self.schema.clone(),
        );
        let artifact = validation.initiate_data_validation()?;
        if !artifact.validation_status() {
            warn!(checks = ?artifact.checks, "Validation failed, data routed to invalid location");
        }
        Ok(artifact)
    }

    pub fn start_data_transformation(
        &self,
        validation_artifact: DataValidationArtifact,
    ) -> error::Result<DataTransformationArtifact> {
        info!("Start data transformation");
        let transformation =
            DataTransformation::new(validation_artifact, self.transformation_config.clone());
        let artifact = transformation.initiate_data_transformation()?;
        info!(?artifact, "Data transformation completed");
        Ok(artifact)
    }

    /// Run every stage in order under the artifact-directory lock
    pub fn run_pipeline(&self) -> error::Result<PipelineRun> {
        let _lock = self.lock()?;

        let ingestion = self.start_data_ingestion()?;
        let validation = self.start_data_validation(ingestion.clone())?;
        let transformation = if validation.validation_status() {
            Some(self.start_data_transformation(validation.clone())?)
        } else {
            None
        };

        Ok(PipelineRun {
            ingestion,
            validation,
            transformation,
        })
    }
}
