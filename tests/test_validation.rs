//! Integration tests for schema and drift validation

use polars::prelude::*;
use prepline::config::{DataValidationConfig, TrainingPipelineConfig};
use prepline::pipeline::{
    detect_dataset_drift, validate_number_of_columns, DataValidation, DriftReport,
    SchemaDescriptor,
};
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn validation_config(dir: &TempDir, threshold: f64) -> DataValidationConfig {
    let pipeline = TrainingPipelineConfig::with_artifact_dir(dir.path().join("run"));
    let mut config = DataValidationConfig::new(&pipeline);
    config.drift_threshold = threshold;
    config
}

#[test]
fn test_column_count_matches_schema() {
    let df = create_feature_dataframe(10, 0.0, 1);
    assert!(validate_number_of_columns(&df, &feature_schema()));

    let narrow = df.drop("web_traffic").unwrap();
    assert!(
        !validate_number_of_columns(&narrow, &feature_schema()),
        "5 columns against a 6-column schema should fail"
    );
}

#[test]
fn test_column_names_are_not_compared() {
    let df = df! { "x" => [1.0f64], "y" => [2.0f64] }.unwrap();
    let schema = SchemaDescriptor::from_names(["a", "b"]);
    assert!(validate_number_of_columns(&df, &schema));
}

#[test]
fn test_identical_frames_show_no_drift() {
    let df = create_feature_dataframe(200, 0.1, 4);
    let (no_drift, report) = detect_dataset_drift(&df, &df, 0.05).unwrap();

    assert!(no_drift);
    assert_eq!(report.len(), 6);
    for (name, entry) in report.iter() {
        assert!(
            (entry.p_value - 1.0).abs() < 1e-9,
            "Column '{}' should have p = 1 against itself, got {}",
            name,
            entry.p_value
        );
        assert!(!entry.drift_status);
    }
}

#[test]
fn test_shifted_column_is_the_only_drift() {
    let base = create_feature_dataframe(100, 0.0, 8);
    let current = shift_column(&create_feature_dataframe(100, 0.0, 9), "URL_Length", 20.0);

    let (no_drift, report) = detect_dataset_drift(&base, &current, 1e-6).unwrap();

    assert!(!no_drift);
    assert_eq!(report.drifted_columns(), vec!["URL_Length".to_string()]);
    assert!(report.get("URL_Length").unwrap().p_value < 1e-10);
}

#[test]
fn test_drift_p_values_are_symmetric() {
    let a = create_feature_dataframe(80, 0.1, 21);
    let b = shift_column(&create_feature_dataframe(50, 0.1, 22), "age_of_domain", 1.5);

    let (_, ab) = detect_dataset_drift(&a, &b, 0.05).unwrap();
    let (_, ba) = detect_dataset_drift(&b, &a, 0.05).unwrap();

    for (name, entry) in ab.iter() {
        let other = ba.get(name).unwrap();
        assert!(
            (entry.p_value - other.p_value).abs() < 1e-9,
            "p-value for '{}' differs: {} vs {}",
            name,
            entry.p_value,
            other.p_value
        );
        assert_eq!(entry.drift_status, other.drift_status);
    }
}

#[test]
fn test_column_missing_from_current_is_drift() {
    let base = create_feature_dataframe(20, 0.0, 1);
    let current = base.drop("SSLfinal_State").unwrap();

    let (no_drift, report) = detect_dataset_drift(&base, &current, 0.05).unwrap();
    assert!(!no_drift);
    let entry = report.get("SSLfinal_State").unwrap();
    assert_eq!(entry.p_value, 0.0);
    assert!(entry.drift_status);
}

#[test]
fn test_valid_data_is_routed_to_valid_location() {
    let temp_dir = TempDir::new().unwrap();
    let config = validation_config(&temp_dir, 1e-6);

    let mut train = create_feature_dataframe(80, 0.1, 30);
    let mut test = create_feature_dataframe(20, 0.1, 31);
    let ingestion = ingestion_artifact(temp_dir.path(), &mut train, &mut test);

    let artifact = DataValidation::new(ingestion, config.clone(), feature_schema())
        .initiate_data_validation()
        .unwrap();

    assert!(artifact.validation_status());
    assert!(config.valid_train_file_path.exists());
    assert!(config.valid_test_file_path.exists());
    assert!(!config.invalid_train_file_path.exists(), "Only one location may be written");
    assert!(!config.invalid_test_file_path.exists(), "Only one location may be written");

    let report = DriftReport::from_yaml_file(&artifact.drift_report_file_path).unwrap();
    assert_eq!(report.len(), 6, "Report should have one entry per train column");
}

#[test]
fn test_wrong_column_count_is_routed_to_invalid_location() {
    let temp_dir = TempDir::new().unwrap();
    let config = validation_config(&temp_dir, 1e-6);

    let mut train = create_feature_dataframe(80, 0.0, 40).drop("web_traffic").unwrap();
    let mut test = create_feature_dataframe(20, 0.0, 41).drop("web_traffic").unwrap();
    let ingestion = ingestion_artifact(temp_dir.path(), &mut train, &mut test);

    let artifact = DataValidation::new(ingestion, config.clone(), feature_schema())
        .initiate_data_validation()
        .unwrap();

    assert!(!artifact.validation_status());
    assert!(!artifact.checks.train_columns_ok);
    assert!(!artifact.checks.test_columns_ok);
    assert!(artifact.valid_paths().is_none());

    let (train_out, test_out) = artifact.invalid_paths().unwrap();
    assert!(train_out.exists() && test_out.exists());
    assert!(!config.valid_train_file_path.exists(), "Only one location may be written");

    let saved = prepline::pipeline::load_dataset(train_out, 0).unwrap();
    assert_shape(&saved, 80, 5);
}

#[test]
fn test_drifted_test_split_is_routed_to_invalid_location() {
    let temp_dir = TempDir::new().unwrap();
    let config = validation_config(&temp_dir, 0.05);

    let mut train = create_feature_dataframe(80, 0.0, 50);
    let mut test = shift_column(&create_feature_dataframe(40, 0.0, 51), "having_IP_Address", 50.0);
    let ingestion = ingestion_artifact(temp_dir.path(), &mut train, &mut test);

    let artifact = DataValidation::new(ingestion, config, feature_schema())
        .initiate_data_validation()
        .unwrap();

    assert!(!artifact.validation_status());
    assert!(artifact.checks.train_columns_ok && artifact.checks.test_columns_ok);
    assert!(!artifact.checks.no_drift);

    let report = DriftReport::from_yaml_file(&artifact.drift_report_file_path).unwrap();
    assert!(report.get("having_IP_Address").unwrap().drift_status);
}
