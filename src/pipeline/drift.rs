//! Dataset drift detection with the two-sample Kolmogorov-Smirnov test
//!
//! Every column of the base frame is compared against the same column of the
//! current frame. A column is flagged as drifted when the KS p-value is
//! strictly below the threshold.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use super::loader::ensure_parent_dir;

/// Largest `n_base * n_current` for which the exact p-value is computed.
/// Bigger samples use the asymptotic Kolmogorov distribution.
pub const EXACT_MAX_CELLS: usize = 1_000_000;

/// Outcome of a two-sample KS test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    /// Maximum distance between the two empirical CDFs
    pub statistic: f64,
    /// Two-sided p-value
    pub p_value: f64,
}

/// Two-sample Kolmogorov-Smirnov test (two-sided).
///
/// Samples may be unsorted and may contain ties. An empty sample on either
/// side yields `statistic = 0, p_value = 1`.
pub fn ks_2samp(base: &[f64], current: &[f64]) -> KsResult {
    let n1 = base.len();
    let n2 = current.len();
    if n1 == 0 || n2 == 0 {
        return KsResult {
            statistic: 0.0,
            p_value: 1.0,
        };
    }

    let mut a = base.to_vec();
    let mut b = current.to_vec();
    a.sort_by(|x, y| x.total_cmp(y));
    b.sort_by(|x, y| x.total_cmp(y));

    // Track the ECDF gap as the integer |i*n2 - j*n1| to keep the exact path exact
    let (mut i, mut j) = (0usize, 0usize);
    let mut d_max: u64 = 0;
    while i < n1 && j < n2 {
        let x = if a[i] <= b[j] { a[i] } else { b[j] };
        while i < n1 && a[i] <= x {
            i += 1;
        }
        while j < n2 && b[j] <= x {
            j += 1;
        }
        let gap = (i as i64 * n2 as i64 - j as i64 * n1 as i64).unsigned_abs();
        d_max = d_max.max(gap);
    }

    let statistic = d_max as f64 / (n1 as f64 * n2 as f64);
    let p_value = if n1.saturating_mul(n2) <= EXACT_MAX_CELLS {
        exact_two_sided_p(n1, n2, d_max)
    } else {
        asymptotic_two_sided_p(n1, n2, statistic)
    };

    KsResult {
        statistic,
        p_value: p_value.clamp(0.0, 1.0),
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// P(D >= d) by counting monotone lattice paths from (0,0) to (n1,n2) that
/// stay strictly inside the band |i/n1 - j/n2| < d.
///
/// `u[j]` holds the fraction of all paths to (i, j) that stayed inside, which
/// avoids the binomial overflow of counting paths directly.
fn exact_two_sided_p(n1: usize, n2: usize, d_max: u64) -> f64 {
    let g = gcd(n1 as u64, n2 as u64);
    let h = (d_max / g) as i64;
    let step_i = (n2 as u64 / g) as i64;
    let step_j = (n1 as u64 / g) as i64;

    let mut u = vec![0.0f64; n2 + 1];
    for i in 0..=n1 {
        for j in 0..=n2 {
            let offset = (i as i64 * step_i - j as i64 * step_j).abs();
            if offset >= h {
                u[j] = 0.0;
                continue;
            }
            if i == 0 && j == 0 {
                u[j] = 1.0;
                continue;
            }
            let total = (i + j) as f64;
            let from_prev_row = if i > 0 { u[j] * i as f64 / total } else { 0.0 };
            let from_prev_col = if j > 0 { u[j - 1] * j as f64 / total } else { 0.0 };
            u[j] = from_prev_row + from_prev_col;
        }
    }

    1.0 - u[n2]
}

/// Asymptotic p-value with Stephens' small-sample correction
fn asymptotic_two_sided_p(n1: usize, n2: usize, statistic: f64) -> f64 {
    let en = ((n1 as f64 * n2 as f64) / (n1 + n2) as f64).sqrt();
    kolmogorov_survival((en + 0.12 + 0.11 / en) * statistic)
}

/// Survival function of the Kolmogorov distribution, Q(λ)
fn kolmogorov_survival(lambda: f64) -> f64 {
    const EPS_TERM: f64 = 0.001;
    const EPS_SUM: f64 = 1.0e-8;

    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut previous_term = 0.0f64;

    for k in 1..=100 {
        let k = k as f64;
        let term = fac * (a2 * k * k).exp();
        sum += term;
        if term.abs() <= EPS_TERM * previous_term || term.abs() <= EPS_SUM * sum {
            return sum;
        }
        fac = -fac;
        previous_term = term.abs();
    }

    // Series failed to converge: λ is tiny and the distributions are indistinguishable
    1.0
}

/// Drift verdict for a single column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftEntry {
    pub p_value: f64,
    pub drift_status: bool,
}

/// Per-column drift results in base-frame column order.
///
/// Serializes as a mapping `column -> {p_value, drift_status}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriftReport {
    entries: Vec<(String, DriftEntry)>,
}

impl DriftReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, entry: DriftEntry) {
        self.entries.push((column.into(), entry));
    }

    pub fn get(&self, column: &str) -> Option<&DriftEntry> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, entry)| entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DriftEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Columns whose drift status is set
    pub fn drifted_columns(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.drift_status)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// True when no column drifted
    pub fn no_drift(&self) -> bool {
        self.entries.iter().all(|(_, entry)| !entry.drift_status)
    }

    /// Write the report as YAML, creating the parent directory
    pub fn write_yaml(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        let yaml = serde_yaml::to_string(self).context("Failed to serialize drift report")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write drift report: {}", path.display()))?;
        Ok(())
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read drift report: {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse drift report: {}", path.display()))
    }
}

impl Serialize for DriftReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entry) in &self.entries {
            map.serialize_entry(name, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DriftReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ReportVisitor;

        impl<'de> Visitor<'de> for ReportVisitor {
            type Value = DriftReport;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a mapping of column name to drift entry")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<DriftReport, A::Error> {
                let mut report = DriftReport::new();
                while let Some((name, entry)) = access.next_entry::<String, DriftEntry>()? {
                    report.insert(name, entry);
                }
                Ok(report)
            }
        }

        deserializer.deserialize_map(ReportVisitor)
    }
}

fn is_orderable_numeric(dtype: &DataType) -> bool {
    dtype.is_primitive_numeric() || matches!(dtype, DataType::Boolean)
}

/// Non-null, non-NaN values of a column as `f64`
fn numeric_values(column: &Column) -> Result<Vec<f64>> {
    let cast = column
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' cannot be read as numeric", column.name()))?;
    Ok(cast
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect())
}

fn string_values(column: &Column) -> Result<Vec<String>> {
    let cast = column
        .cast(&DataType::String)
        .with_context(|| format!("Column '{}' cannot be read as text", column.name()))?;
    Ok(cast
        .str()?
        .into_iter()
        .flatten()
        .map(|s| s.to_string())
        .collect())
}

/// Map both text samples onto their rank in the pooled, sorted set of distinct values
fn rank_encode(base: Vec<String>, current: Vec<String>) -> (Vec<f64>, Vec<f64>) {
    let mut pooled: Vec<&str> = base
        .iter()
        .chain(current.iter())
        .map(|s| s.as_str())
        .collect();
    pooled.sort_unstable();
    pooled.dedup();

    let rank = |s: &String| pooled.binary_search(&s.as_str()).unwrap_or(0) as f64;
    let base_ranks = base.iter().map(rank).collect();
    let current_ranks = current.iter().map(rank).collect();
    (base_ranks, current_ranks)
}

/// Extract comparable samples for one column pair, dropping missing values
fn comparable_samples(base: &Column, current: &Column) -> Result<(Vec<f64>, Vec<f64>)> {
    let (bt, ct) = (base.dtype(), current.dtype());

    // Entirely null columns carry no distribution to compare
    let base_empty = matches!(bt, DataType::Null) || base.null_count() == base.len();
    let current_empty = matches!(ct, DataType::Null) || current.null_count() == current.len();
    if base_empty || current_empty {
        return Ok((Vec::new(), Vec::new()));
    }

    if is_orderable_numeric(bt) && is_orderable_numeric(ct) {
        return Ok((numeric_values(base)?, numeric_values(current)?));
    }

    let textual = |dt: &DataType| matches!(dt, DataType::String) || is_orderable_numeric(dt);
    if textual(bt) && textual(ct) {
        let (b, c) = rank_encode(string_values(base)?, string_values(current)?);
        return Ok((b, c));
    }

    anyhow::bail!(
        "Column '{}' has a dtype that cannot be ordered for a KS test ({} vs {})",
        base.name(),
        bt,
        ct
    )
}

/// Run the KS test on every column of `base_df` against `current_df`.
///
/// Returns `(no_drift, report)` where `no_drift` is true only if no column was
/// flagged. A base column absent from `current_df` is reported as drifted with
/// `p_value = 0`. Columns left empty after dropping nulls are never flagged.
pub fn detect_dataset_drift(
    base_df: &DataFrame,
    current_df: &DataFrame,
    threshold: f64,
) -> Result<(bool, DriftReport)> {
    let entries: Vec<(String, DriftEntry)> = base_df
        .get_columns()
        .iter()
        .map(|base_col| {
            let name = base_col.name().to_string();

            let entry = match current_df.column(&name) {
                Ok(current_col) => {
                    let (base_values, current_values) = comparable_samples(base_col, current_col)
                        .with_context(|| format!("Drift test failed for column '{}'", name))?;
                    let ks = ks_2samp(&base_values, &current_values);
                    debug!(
                        column = %name,
                        statistic = ks.statistic,
                        p_value = ks.p_value,
                        "KS test"
                    );
                    DriftEntry {
                        p_value: ks.p_value,
                        drift_status: ks.p_value < threshold,
                    }
                }
                Err(_) => {
                    debug!(column = %name, "column absent from current dataset");
                    DriftEntry {
                        p_value: 0.0,
                        drift_status: true,
                    }
                }
            };

            Ok((name, entry))
        })
        .collect::<Result<_>>()?;

    let mut report = DriftReport::new();
    for (name, entry) in entries {
        report.insert(name, entry);
    }

    Ok((report.no_drift(), report))
}
