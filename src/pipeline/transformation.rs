//! Data transformation stage: impute features and build training arrays
//!
//! The imputer is fit on the training features only and then applied to both
//! splits. Each output array holds the transformed features in their original
//! order followed by the untouched target as the last column.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use faer::Mat;
use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use super::imputer::ImputerParams;
use super::loader::{load_dataset, save_dataset};
use super::transformer::DataTransformer;
use super::validation::DataValidationArtifact;
use crate::config::DataTransformationConfig;
use crate::error::{self, Stage, StageContext};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataTransformationArtifact {
    pub transformed_object_file_path: PathBuf,
    pub transformed_train_file_path: PathBuf,
    pub transformed_test_file_path: PathBuf,
    /// (rows, features + 1)
    pub train_shape: (usize, usize),
    pub test_shape: (usize, usize),
}

/// Features ready for the imputer, with their column names
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub values: Mat<f64>,
}

fn is_numeric_like(column: &Column) -> bool {
    let dtype = column.dtype();
    dtype.is_primitive_numeric()
        || matches!(dtype, DataType::Boolean | DataType::Null)
        || column.null_count() == column.len()
}

/// Convert every column of `df` into a dense matrix, nulls becoming NaN
pub fn frame_to_matrix(df: &DataFrame) -> Result<FeatureMatrix> {
    let (n_rows, n_cols) = df.shape();
    let mut values = Mat::<f64>::zeros(n_rows, n_cols);
    let mut names = Vec::with_capacity(n_cols);

    for (j, column) in df.get_columns().iter().enumerate() {
        if !is_numeric_like(column) {
            anyhow::bail!(
                "Feature column '{}' is not numeric (dtype {})",
                column.name(),
                column.dtype()
            );
        }

        let cast = if column.null_count() == column.len() {
            Column::full_null(column.name().clone(), n_rows, &DataType::Float64)
        } else {
            column.cast(&DataType::Float64)?
        };

        for (i, value) in cast.f64()?.into_iter().enumerate() {
            values[(i, j)] = value.unwrap_or(f64::NAN);
        }
        names.push(column.name().to_string());
    }

    Ok(FeatureMatrix { names, values })
}

/// Split a frame into its feature columns and the target vector
pub fn split_features_target(df: &DataFrame, target: &str) -> Result<(DataFrame, Vec<f64>)> {
    let target_col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;

    if !(target_col.dtype().is_primitive_numeric() || matches!(target_col.dtype(), DataType::Boolean)) {
        anyhow::bail!(
            "Target column '{}' must be numeric, found {}",
            target,
            target_col.dtype()
        );
    }
    if target_col.null_count() > 0 {
        anyhow::bail!(
            "Target column '{}' contains {} missing value(s)",
            target,
            target_col.null_count()
        );
    }

    let target_values: Vec<f64> = target_col
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .flatten()
        .collect();

    let features = df.drop(target)?;
    Ok((features, target_values))
}

/// Assemble `[features..., target]` as a Float64 frame
pub fn assemble_array(
    features: &Mat<f64>,
    feature_names: &[String],
    target: &[f64],
    target_name: &str,
) -> Result<DataFrame> {
    if features.nrows() != target.len() {
        anyhow::bail!(
            "Feature rows ({}) and target length ({}) differ",
            features.nrows(),
            target.len()
        );
    }

    let mut columns: Vec<Column> = feature_names
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let values: Vec<f64> = (0..features.nrows()).map(|i| features[(i, j)]).collect();
            Column::new(name.as_str().into(), values)
        })
        .collect();
    columns.push(Column::new(target_name.into(), target.to_vec()));

    Ok(DataFrame::new(columns)?)
}

/// Read a persisted transformed array back into a matrix
pub fn load_numeric_array(path: &Path) -> Result<Mat<f64>> {
    let df = load_dataset(path, 0)?;
    Ok(frame_to_matrix(&df)?.values)
}

pub struct DataTransformation {
    validation_artifact: DataValidationArtifact,
    config: DataTransformationConfig,
}

impl DataTransformation {
    pub fn new(validation_artifact: DataValidationArtifact, config: DataTransformationConfig) -> Self {
        Self {
            validation_artifact,
            config,
        }
    }

    /// Unfitted single-step KNN imputation pipeline
    pub fn get_data_transformer_object(params: ImputerParams) -> Result<DataTransformer> {
        info!("Initialise KNN imputer with {}", params);
        DataTransformer::knn_imputer(params)
    }

    pub fn initiate_data_transformation(&self) -> error::Result<DataTransformationArtifact> {
        info!("Entered initiate_data_transformation");
        self.run().stage(Stage::Transformation)
    }

    fn run(&self) -> Result<DataTransformationArtifact> {
        let (train_path, test_path) = self.validation_artifact.valid_paths().ok_or_else(|| {
            anyhow::anyhow!("Validation did not pass; there is no valid dataset to transform")
        })?;

        let train_df = load_dataset(train_path, 0)?;
        let test_df = load_dataset(test_path, 0)?;

        let target = self.config.target_column.as_str();
        let (train_features, train_target) = split_features_target(&train_df, target)
            .with_context(|| format!("Invalid training dataset: {}", train_path.display()))?;
        let (test_features, test_target) = split_features_target(&test_df, target)
            .with_context(|| format!("Invalid test dataset: {}", test_path.display()))?;

        let train_matrix = frame_to_matrix(&train_features)?;
        let test_matrix = frame_to_matrix(&test_features)?;
        if train_matrix.names != test_matrix.names {
            anyhow::bail!(
                "Train and test feature columns differ: {:?} vs {:?}",
                train_matrix.names,
                test_matrix.names
            );
        }

        let mut transformer = Self::get_data_transformer_object(self.config.imputer)?;
        transformer.fit(&train_matrix.values)?;

        let train_transformed = transformer.transform(&train_matrix.values)?;
        let test_transformed = transformer.transform(&test_matrix.values)?;

        let mut train_arr =
            assemble_array(&train_transformed, &train_matrix.names, &train_target, target)?;
        let mut test_arr =
            assemble_array(&test_transformed, &test_matrix.names, &test_target, target)?;

        save_dataset(&mut train_arr, &self.config.transformed_train_file_path)?;
        save_dataset(&mut test_arr, &self.config.transformed_test_file_path)?;
        transformer.save(&self.config.transformed_object_file_path)?;

        info!(
            train_shape = ?train_arr.shape(),
            test_shape = ?test_arr.shape(),
            "Data transformation completed"
        );

        Ok(DataTransformationArtifact {
            transformed_object_file_path: self.config.transformed_object_file_path.clone(),
            transformed_train_file_path: self.config.transformed_train_file_path.clone(),
            transformed_test_file_path: self.config.transformed_test_file_path.clone(),
            train_shape: train_arr.shape(),
            test_shape: test_arr.shape(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_features_target_keeps_order() {
        let df = df! {
            "a" => [1.0f64, 2.0],
            "Result" => [1i32, -1],
            "b" => [Some(3.0f64), None],
        }
        .unwrap();

        let (features, target) = split_features_target(&df, "Result").unwrap();
        let names: Vec<String> = features.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(target, vec![1.0, -1.0]);
    }

    #[test]
    fn test_missing_or_null_target_is_rejected() {
        let df = df! { "a" => [1.0f64], "y" => [None::<f64>] }.unwrap();
        assert!(split_features_target(&df, "Result").is_err());
        assert!(split_features_target(&df, "y").is_err());
    }

    #[test]
    fn test_frame_to_matrix_maps_nulls_to_nan() {
        let df = df! {
            "a" => [Some(1i64), None],
            "flag" => [true, false],
        }
        .unwrap();
        let m = frame_to_matrix(&df).unwrap();
        assert_eq!(m.names, vec!["a", "flag"]);
        assert_eq!(m.values[(0, 0)], 1.0);
        assert!(m.values[(1, 0)].is_nan());
        assert_eq!(m.values[(0, 1)], 1.0);
    }

    #[test]
    fn test_text_feature_is_rejected() {
        let df = df! { "url" => ["a.com", "b.org"] }.unwrap();
        assert!(frame_to_matrix(&df).is_err());
    }

    #[test]
    fn test_assemble_array_appends_target_last() {
        let features = Mat::from_fn(2, 2, |i, j| (i * 2 + j) as f64);
        let names = vec!["x".to_string(), "y".to_string()];
        let df = assemble_array(&features, &names, &[7.0, 8.0], "Result").unwrap();

        let cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(cols, vec!["x", "y", "Result"]);
        assert_eq!(df.column("Result").unwrap().f64().unwrap().get(1), Some(8.0));
    }
}
