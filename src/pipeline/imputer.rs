//! K-nearest-neighbours imputation of missing feature values
//!
//! Missing cells (NaN) are filled with the average of the same feature in the
//! `n_neighbors` closest fitted rows that have it. Distances skip coordinates
//! missing in either row and are rescaled by the share of coordinates used.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use faer::Mat;
use serde::{Deserialize, Serialize};

/// Default number of neighbours averaged per missing cell
pub const DEFAULT_N_NEIGHBORS: usize = 3;

/// How neighbour values are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weights {
    /// Plain mean of the neighbours
    #[default]
    Uniform,
    /// Inverse-distance weighted mean
    Distance,
}

impl fmt::Display for Weights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weights::Uniform => write!(f, "uniform"),
            Weights::Distance => write!(f, "distance"),
        }
    }
}

impl FromStr for Weights {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uniform" => Ok(Weights::Uniform),
            "distance" => Ok(Weights::Distance),
            _ => Err(format!(
                "Unknown weighting: '{}'. Use 'uniform' or 'distance'.",
                s
            )),
        }
    }
}

/// Distance between rows that may contain missing values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// sqrt(p / present * sum of squared differences)
    #[default]
    NanEuclidean,
    /// p / present * sum of absolute differences
    NanManhattan,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::NanEuclidean => write!(f, "nan_euclidean"),
            DistanceMetric::NanManhattan => write!(f, "nan_manhattan"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nan_euclidean" | "euclidean" => Ok(DistanceMetric::NanEuclidean),
            "nan_manhattan" | "manhattan" => Ok(DistanceMetric::NanManhattan),
            _ => Err(format!(
                "Unknown metric: '{}'. Use 'nan_euclidean' or 'nan_manhattan'.",
                s
            )),
        }
    }
}

/// Imputer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImputerParams {
    pub n_neighbors: usize,
    pub weights: Weights,
    pub metric: DistanceMetric,
}

impl Default for ImputerParams {
    fn default() -> Self {
        Self {
            n_neighbors: DEFAULT_N_NEIGHBORS,
            weights: Weights::Uniform,
            metric: DistanceMetric::NanEuclidean,
        }
    }
}

impl fmt::Display for ImputerParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n_neighbors={}, weights={}, metric={}",
            self.n_neighbors, self.weights, self.metric
        )
    }
}

/// State learned from the training features.
///
/// Missing cells are stored as `None` so the state survives a JSON round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FittedState {
    n_features: usize,
    rows: Vec<Vec<Option<f64>>>,
    /// Mean of the observed values per column, `None` if the column had none
    column_means: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnImputer {
    params: ImputerParams,
    fitted: Option<FittedState>,
}

fn observed(v: f64) -> Option<f64> {
    if v.is_nan() {
        None
    } else {
        Some(v)
    }
}

impl KnnImputer {
    pub fn new(params: ImputerParams) -> Result<Self> {
        if params.n_neighbors == 0 {
            anyhow::bail!("n_neighbors must be at least 1");
        }
        Ok(Self {
            params,
            fitted: None,
        })
    }

    pub fn params(&self) -> &ImputerParams {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Number of features seen during fit
    pub fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_features)
    }

    /// Learn the donor rows and column means. NaN marks a missing cell.
    pub fn fit(&mut self, x: &Mat<f64>) -> Result<()> {
        let (n_rows, n_features) = (x.nrows(), x.ncols());
        if n_rows == 0 {
            anyhow::bail!("Cannot fit KNN imputer on a matrix with no rows");
        }

        let rows: Vec<Vec<Option<f64>>> = (0..n_rows)
            .map(|i| (0..n_features).map(|j| observed(x[(i, j)])).collect())
            .collect();

        let column_means = (0..n_features)
            .map(|j| {
                let (sum, count) = rows
                    .iter()
                    .filter_map(|row| row[j])
                    .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
                if count > 0 {
                    Some(sum / count as f64)
                } else {
                    None
                }
            })
            .collect();

        self.fitted = Some(FittedState {
            n_features,
            rows,
            column_means,
        });
        Ok(())
    }

    /// Fill every missing cell of `x` from the fitted donor rows
    pub fn transform(&self, x: &Mat<f64>) -> Result<Mat<f64>> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("KNN imputer is not fitted"))?;

        if x.ncols() != fitted.n_features {
            anyhow::bail!(
                "KNN imputer was fitted on {} feature(s) but received {}",
                fitted.n_features,
                x.ncols()
            );
        }

        let filled: Vec<Vec<(usize, f64)>> = (0..x.nrows())
            .map(|i| {
                let row: Vec<Option<f64>> = (0..x.ncols()).map(|j| observed(x[(i, j)])).collect();
                if row.iter().all(Option::is_some) {
                    return Vec::new();
                }

                let distances: Vec<Option<f64>> = fitted
                    .rows
                    .iter()
                    .map(|donor| self.distance(&row, donor))
                    .collect();

                row.iter()
                    .enumerate()
                    .filter(|(_, cell)| cell.is_none())
                    .map(|(j, _)| (j, self.impute_cell(fitted, &distances, j)))
                    .collect()
            })
            .collect();

        let mut out = x.clone();
        for (i, cells) in filled.into_iter().enumerate() {
            for (j, value) in cells {
                out[(i, j)] = value;
            }
        }

        Ok(out)
    }

    pub fn fit_transform(&mut self, x: &Mat<f64>) -> Result<Mat<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Distance over coordinates present in both rows; `None` if there are none
    fn distance(&self, a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
        let mut present = 0usize;
        let mut accum = 0.0;

        for (x, y) in a.iter().zip(b.iter()) {
            if let (Some(x), Some(y)) = (x, y) {
                present += 1;
                let d = x - y;
                accum += match self.params.metric {
                    DistanceMetric::NanEuclidean => d * d,
                    DistanceMetric::NanManhattan => d.abs(),
                };
            }
        }

        if present == 0 {
            return None;
        }

        let scaled = accum * a.len() as f64 / present as f64;
        Some(match self.params.metric {
            DistanceMetric::NanEuclidean => scaled.sqrt(),
            DistanceMetric::NanManhattan => scaled,
        })
    }

    fn impute_cell(&self, fitted: &FittedState, distances: &[Option<f64>], j: usize) -> f64 {
        // Column with no observed value at fit time
        let Some(column_mean) = fitted.column_means[j] else {
            return 0.0;
        };

        let mut donors: Vec<(f64, f64)> = fitted
            .rows
            .iter()
            .zip(distances.iter())
            .filter_map(|(row, dist)| match (row[j], dist) {
                (Some(value), Some(d)) => Some((*d, value)),
                _ => None,
            })
            .collect();

        if donors.is_empty() {
            return column_mean;
        }

        // Stable sort keeps fitted-row order among equal distances
        donors.sort_by(|a, b| a.0.total_cmp(&b.0));
        donors.truncate(self.params.n_neighbors);

        match self.params.weights {
            Weights::Uniform => {
                donors.iter().map(|(_, v)| v).sum::<f64>() / donors.len() as f64
            }
            Weights::Distance => {
                // Exact matches take all of the weight
                let exact: Vec<f64> = donors
                    .iter()
                    .filter(|(d, _)| *d == 0.0)
                    .map(|(_, v)| *v)
                    .collect();
                if !exact.is_empty() {
                    return exact.iter().sum::<f64>() / exact.len() as f64;
                }

                let (weighted_sum, weight_sum) = donors
                    .iter()
                    .fold((0.0, 0.0), |(ws, w), (d, v)| (ws + v / d, w + 1.0 / d));
                weighted_sum / weight_sum
            }
        }
    }
}
