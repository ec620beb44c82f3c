//! Standalone drift check between two datasets

use std::path::Path;

use anyhow::Result;
use console::style;
use tracing::info;

use crate::pipeline::{detect_dataset_drift, load_dataset, DriftReport};
use crate::report::display_drift_report;
use crate::utils::{create_spinner, finish_with_success, finish_with_warning};

/// Compare `current` against `base` column by column.
///
/// Prints the per-column table and optionally writes the YAML report.
/// Returns the report so callers can decide on an exit status.
pub fn run_drift(
    base: &Path,
    current: &Path,
    threshold: f64,
    report_path: Option<&Path>,
    infer_schema_length: usize,
) -> Result<DriftReport> {
    println!(
        "\n {} Checking dataset drift",
        style("◆").cyan().bold()
    );
    println!("   Base:    {}", style(base.display()).dim());
    println!("   Current: {}", style(current.display()).dim());
    println!();

    let spinner = create_spinner("Loading datasets...");
    let base_df = load_dataset(base, infer_schema_length)?;
    let current_df = load_dataset(current, infer_schema_length)?;
    spinner.set_message("Running two-sample KS tests...");

    let (no_drift, report) = detect_dataset_drift(&base_df, &current_df, threshold)?;
    info!(
        base = %base.display(),
        current = %current.display(),
        drifted = report.drifted_columns().len(),
        "Drift check finished"
    );

    if no_drift {
        finish_with_success(&spinner, "No drift detected");
    } else {
        finish_with_warning(
            &spinner,
            &format!("{} column(s) drifted", report.drifted_columns().len()),
        );
    }

    display_drift_report(&report, threshold);

    if let Some(path) = report_path {
        report.write_yaml(path)?;
        println!();
        println!("   Report written to {}", style(path.display()).cyan());
    }
    println!();

    Ok(report)
}
