//! Console summaries for a pipeline run and for drift reports

use std::path::PathBuf;
use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::{DriftReport, PipelineRun};

/// Per-run summary printed once all stages have finished
#[derive(Debug, Default)]
pub struct PipelineSummary {
    pub rows_ingested: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub validation_status: bool,
    pub drifted_columns: Vec<String>,
    pub train_shape: Option<(usize, usize)>,
    pub test_shape: Option<(usize, usize)>,
    pub artifact_dir: PathBuf,
    pub ingestion_time: Duration,
    pub validation_time: Duration,
    pub transformation_time: Duration,
}

impl PipelineSummary {
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
            ..Default::default()
        }
    }

    pub fn set_split(&mut self, train_rows: usize, test_rows: usize) {
        self.train_rows = train_rows;
        self.test_rows = test_rows;
        self.rows_ingested = train_rows + test_rows;
    }

    pub fn record_validation(&mut self, status: bool, report: &DriftReport) {
        self.validation_status = status;
        self.drifted_columns = report.drifted_columns();
    }

    /// Fill the outcome fields from a completed [`PipelineRun`]
    pub fn record_run(&mut self, run: &PipelineRun, report: &DriftReport) {
        self.record_validation(run.validation.validation_status(), report);
        if let Some(t) = &run.transformation {
            self.train_shape = Some(t.train_shape);
            self.test_shape = Some(t.test_shape);
        }
    }

    pub fn total_time(&self) -> Duration {
        self.ingestion_time + self.validation_time + self.transformation_time
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("📥 Rows ingested"), Cell::new(self.rows_ingested)]);
        table.add_row(vec![
            Cell::new("✂️  Train / test"),
            Cell::new(format!("{} / {}", self.train_rows, self.test_rows)),
        ]);

        let (status, color) = if self.validation_status {
            ("passed", Color::Green)
        } else {
            ("failed", Color::Red)
        };
        table.add_row(vec![
            Cell::new("🔍 Validation"),
            Cell::new(status).fg(color).add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("🌊 Drifted columns"),
            Cell::new(self.drifted_columns.len()).fg(if self.drifted_columns.is_empty() {
                Color::White
            } else {
                Color::Red
            }),
        ]);

        let shape = |s: Option<(usize, usize)>| match s {
            Some((r, c)) => format!("{} × {}", r, c),
            None => "skipped".to_string(),
        };
        table.add_row(vec![
            Cell::new("🧮 Train array"),
            Cell::new(shape(self.train_shape)),
        ]);
        table.add_row(vec![
            Cell::new("🧮 Test array"),
            Cell::new(shape(self.test_shape)),
        ]);
        table.add_row(vec![
            Cell::new("⏱️  Total time"),
            Cell::new(format!("{:.2?}", self.total_time())),
        ]);

        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("PIPELINE SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        for line in self.to_table().to_string().lines() {
            println!("    {}", line);
        }

        if !self.drifted_columns.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Drifted columns").yellow(),
                style(format!("({})", self.drifted_columns.len())).dim()
            );
            for column in &self.drifted_columns {
                println!("        {} {}", style("•").dim(), column);
            }
        }

        println!();
        println!(
            "      Artifacts: {}",
            style(self.artifact_dir.display()).cyan()
        );
    }
}

/// Per-column p-values and drift flags
pub fn drift_table(report: &DriftReport, threshold: f64) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("p-value").add_attribute(Attribute::Bold),
        Cell::new("Drift").add_attribute(Attribute::Bold),
    ]);

    for (name, entry) in report.iter() {
        let p_color = if entry.p_value < threshold {
            Color::Red
        } else {
            Color::Green
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{:.6}", entry.p_value)).fg(p_color),
            Cell::new(if entry.drift_status { "yes" } else { "no" }).fg(p_color),
        ]);
    }

    table
}

pub fn display_drift_report(report: &DriftReport, threshold: f64) {
    println!();
    println!(
        "    {} {}",
        style("🌊").cyan(),
        style("DRIFT REPORT").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    for line in drift_table(report, threshold).to_string().lines() {
        println!("    {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::DriftEntry;

    #[test]
    fn test_drift_table_lists_every_column() {
        let mut report = DriftReport::new();
        report.insert("a", DriftEntry { p_value: 0.9, drift_status: false });
        report.insert("b", DriftEntry { p_value: 0.001, drift_status: true });

        let rendered = drift_table(&report, 0.05).to_string();
        assert!(rendered.contains("a"));
        assert!(rendered.contains("0.001000"));
        assert!(rendered.contains("yes"));
    }

    #[test]
    fn test_summary_marks_skipped_transformation() {
        let mut summary = PipelineSummary::new("artifacts/run");
        summary.set_split(80, 20);
        let rendered = summary.to_table().to_string();
        assert!(rendered.contains("80 / 20"));
        assert!(rendered.contains("skipped"));
        assert!(rendered.contains("failed"));
    }
}
