//! Terminal styling for the pipeline's console output

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static SCROLL: Emoji<'_, '_> = Emoji("📜 ", "");

const CARD_WIDTH: usize = 60;

/// Values shown in the configuration card
#[derive(Debug, Clone)]
pub struct ConfigCard<'a> {
    pub input: &'a Path,
    pub schema: &'a Path,
    pub target: &'a str,
    pub artifact_dir: &'a Path,
    pub test_ratio: f64,
    pub drift_threshold: f64,
    pub imputer: String,
}

pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("prepline").cyan().bold(),
        style(format!("v{}", version)).dim()
    );
    println!(
        "    {}",
        style("ingest · validate · impute").dim()
    );
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

pub fn print_config(card: &ConfigCard<'_>) {
    let line = "─".repeat(CARD_WIDTH - 2);
    let inner = CARD_WIDTH - 22;

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(CARD_WIDTH - 20)
    );
    println!("    ├{}┤", line);
    println!("    │  {}Input:     {:<w$}│", FOLDER, truncate_path(card.input, inner), w = inner);
    println!("    │  {}Schema:    {:<w$}│", SCROLL, truncate_path(card.schema, inner), w = inner);
    println!("    │  {}Target:    {:<w$}│", TARGET, truncate_string(card.target, inner), w = inner);
    println!(
        "    │  {}Artifacts: {:<w$}│",
        SAVE,
        truncate_path(card.artifact_dir, inner),
        w = inner
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {}Test ratio:      {:<w$}│",
        CHART,
        style(format!("{:.2}", card.test_ratio)).yellow(),
        w = inner - 6
    );
    println!(
        "    │  {}Drift threshold: {:<w$}│",
        CHART,
        style(format!("{}", card.drift_threshold)).yellow(),
        w = inner - 6
    );
    println!(
        "    │  {}Imputer:         {:<w$}│",
        CHART,
        style(truncate_string(&card.imputer, inner - 6)).yellow(),
        w = inner - 6
    );
    println!("    └{}┘", line);
    println!();
}

pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

pub fn print_info(message: &str) {
    println!("    {}{}", INFO, message);
}

pub fn print_warning(message: &str) {
    println!("    {}{}", WARN, style(message).yellow());
}

pub fn print_step_time(elapsed: Duration) {
    println!("      {}", style(format!("took {:.2?}", elapsed)).dim());
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    match detail {
        Some(detail) => println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(detail).dim()
        ),
        None => println!("      Found {} {}", style(count).yellow().bold(), description),
    }
}

pub fn print_completion(transformed: bool) {
    println!();
    if transformed {
        println!(
            "    {}{}",
            ROCKET,
            style("Training arrays ready!").green().bold()
        );
    } else {
        println!(
            "    {}{}",
            WARN,
            style("Validation failed; transformation skipped").yellow().bold()
        );
    }
    println!();
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

/// Keep the tail of `s` so file names stay visible
fn truncate_string(s: &str, max_len: usize) -> String {
    let n = s.chars().count();
    if n <= max_len {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(n - max_len + 3).collect();
        format!("...{}", tail)
    }
}
