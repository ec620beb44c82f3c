//! Prepline CLI
//!
//! Runs ingestion, validation and transformation over a raw dataset and
//! leaves every intermediate file under one artifact directory.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use prepline::cli::{self, Cli, Commands};
use prepline::config::TrainingPipelineConfig;
use prepline::error::{Stage, StageContext};
use prepline::pipeline::{
    DriftReport, FileSource, ImputerParams, PipelineRun, SchemaDescriptor, TrainingPipeline,
};
use prepline::report::PipelineSummary;
use prepline::utils::{
    create_spinner, finish_with_error, finish_with_success, finish_with_warning, init_logging,
    print_banner, print_completion, print_config, print_count, print_info, print_step_header,
    print_step_time, print_success, print_warning, ConfigCard,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (_guard, log_path) = init_logging(&cli.log_dir, cli.verbose)?;
    info!(log_file = %log_path.display(), "Logging initialised");

    if let Some(command) = &cli.command {
        return match command {
            Commands::Drift {
                base,
                current,
                threshold,
                report,
                fail_on_drift,
                infer_schema_length,
            } => {
                let report = cli::drift::run_drift(
                    base,
                    current,
                    *threshold,
                    report.as_deref(),
                    *infer_schema_length,
                )?;
                if *fail_on_drift && !report.no_drift() {
                    anyhow::bail!(
                        "Drift detected in {} column(s)",
                        report.drifted_columns().len()
                    );
                }
                Ok(())
            }
        };
    }

    let input = cli.input().ok_or_else(|| {
        anyhow::anyhow!("Input file is required. Use -i/--input to specify a file.")
    })?;

    let pipeline_config = match &cli.artifact_dir {
        Some(dir) => TrainingPipelineConfig::with_artifact_dir(dir),
        None => TrainingPipelineConfig::new(),
    };
    let schema = SchemaDescriptor::from_yaml_file(&cli.schema).stage(Stage::Config)?;
    let imputer = ImputerParams {
        n_neighbors: cli.n_neighbors,
        weights: cli.weights,
        metric: cli.metric,
    };

    let source = FileSource::new(input).with_infer_schema_length(cli.infer_schema_length);
    let mut pipeline = TrainingPipeline::new(pipeline_config, schema, source);
    pipeline.ingestion_config.train_test_split_ratio = cli.test_ratio;
    pipeline.ingestion_config.seed = cli.seed;
    pipeline.ingestion_config.infer_schema_length = cli.infer_schema_length;
    pipeline.validation_config.drift_threshold = cli.drift_threshold;
    pipeline.transformation_config.target_column = cli.target.clone();
    pipeline.transformation_config.imputer = imputer;

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&ConfigCard {
        input,
        schema: &cli.schema,
        target: &cli.target,
        artifact_dir: &pipeline.pipeline_config.artifact_dir,
        test_ratio: cli.test_ratio,
        drift_threshold: cli.drift_threshold,
        imputer: imputer.to_string(),
    });

    let _lock = pipeline.lock()?;
    let mut summary = PipelineSummary::new(&pipeline.pipeline_config.artifact_dir);

    // Step 1: Ingestion
    print_step_header(1, "Data Ingestion");
    let step_start = Instant::now();
    let spinner = create_spinner("Exporting records and splitting...");
    let ingestion = match pipeline.start_data_ingestion() {
        Ok(artifact) => artifact,
        Err(e) => {
            finish_with_error(&spinner, "Data ingestion failed");
            error!(error = %e, "Pipeline aborted");
            return Err(e.into());
        }
    };
    finish_with_success(&spinner, "Data ingestion complete");
    print_info(&format!(
        "Train rows: {}, test rows: {}",
        ingestion.train_rows, ingestion.test_rows
    ));
    summary.set_split(ingestion.train_rows, ingestion.test_rows);
    summary.ingestion_time = step_start.elapsed();
    print_step_time(summary.ingestion_time);

    // Step 2: Validation
    print_step_header(2, "Data Validation");
    let step_start = Instant::now();
    let spinner = create_spinner("Checking schema and drift...");
    let validation = match pipeline.start_data_validation(ingestion.clone()) {
        Ok(artifact) => artifact,
        Err(e) => {
            finish_with_error(&spinner, "Data validation failed");
            error!(error = %e, "Pipeline aborted");
            return Err(e.into());
        }
    };
    let drift_report =
        DriftReport::from_yaml_file(&validation.drift_report_file_path).stage(Stage::Validation)?;

    if validation.validation_status() {
        finish_with_success(&spinner, "Validation passed");
    } else {
        finish_with_warning(&spinner, "Validation failed");
        if !validation.checks.train_columns_ok || !validation.checks.test_columns_ok {
            print_warning("Column count does not match the schema");
        }
        let drifted = drift_report.drifted_columns();
        if !drifted.is_empty() {
            print_count(
                "drifted column(s)",
                drifted.len(),
                Some(&format!("(p < {})", cli.drift_threshold)),
            );
        }
    }
    summary.validation_time = step_start.elapsed();
    print_step_time(summary.validation_time);

    // Step 3: Transformation, only on validated data
    let transformation = if validation.validation_status() {
        print_step_header(3, "Data Transformation");
        let step_start = Instant::now();
        let spinner = create_spinner("Fitting KNN imputer...");
        let artifact = match pipeline.start_data_transformation(validation.clone()) {
            Ok(artifact) => artifact,
            Err(e) => {
                finish_with_error(&spinner, "Data transformation failed");
                error!(error = %e, "Pipeline aborted");
                return Err(e.into());
            }
        };
        finish_with_success(&spinner, "Data transformation complete");
        print_success(&format!(
            "Saved arrays to {}",
            artifact
                .transformed_train_file_path
                .parent()
                .unwrap_or(&artifact.transformed_train_file_path)
                .display()
        ));
        summary.transformation_time = step_start.elapsed();
        print_step_time(summary.transformation_time);
        Some(artifact)
    } else {
        print_info("Skipping transformation: data was routed to the invalid location");
        None
    };

    let run = PipelineRun {
        ingestion,
        validation,
        transformation,
    };
    summary.record_run(&run, &drift_report);
    summary.display();
    print_completion(run.transformation.is_some());

    info!(validation_status = run.validation.validation_status(), "Pipeline finished");
    Ok(())
}
