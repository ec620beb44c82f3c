//! Fitted preprocessing pipeline persisted alongside the transformed arrays

use std::path::Path;

use anyhow::{Context, Result};
use faer::Mat;
use serde::{Deserialize, Serialize};

use super::imputer::{ImputerParams, KnnImputer};
use super::loader::ensure_parent_dir;

/// One stage of a [`DataTransformer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformStep {
    KnnImputer(KnnImputer),
}

impl TransformStep {
    fn fit(&mut self, x: &Mat<f64>) -> Result<()> {
        match self {
            TransformStep::KnnImputer(imputer) => imputer.fit(x),
        }
    }

    fn transform(&self, x: &Mat<f64>) -> Result<Mat<f64>> {
        match self {
            TransformStep::KnnImputer(imputer) => imputer.transform(x),
        }
    }

    fn is_fitted(&self) -> bool {
        match self {
            TransformStep::KnnImputer(imputer) => imputer.is_fitted(),
        }
    }
}

/// Ordered list of named steps applied to the feature matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTransformer {
    steps: Vec<(String, TransformStep)>,
}

impl DataTransformer {
    pub fn new(steps: Vec<(String, TransformStep)>) -> Self {
        Self { steps }
    }

    /// Single-step pipeline: `[("imputer", KnnImputer)]`
    pub fn knn_imputer(params: ImputerParams) -> Result<Self> {
        Ok(Self::new(vec![(
            "imputer".to_string(),
            TransformStep::KnnImputer(KnnImputer::new(params)?),
        )]))
    }

    pub fn steps(&self) -> &[(String, TransformStep)] {
        &self.steps
    }

    pub fn is_fitted(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|(_, step)| step.is_fitted())
    }

    /// Fit each step on the output of the previous one
    pub fn fit(&mut self, x: &Mat<f64>) -> Result<()> {
        let mut current = x.clone();
        let last = self.steps.len().saturating_sub(1);
        for (i, (name, step)) in self.steps.iter_mut().enumerate() {
            step.fit(&current)
                .with_context(|| format!("Failed to fit step '{}'", name))?;
            if i < last {
                current = step.transform(&current)?;
            }
        }
        Ok(())
    }

    pub fn transform(&self, x: &Mat<f64>) -> Result<Mat<f64>> {
        let mut current = x.clone();
        for (name, step) in &self.steps {
            current = step
                .transform(&current)
                .with_context(|| format!("Failed to apply step '{}'", name))?;
        }
        Ok(current)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize transformer")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write transformer: {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read transformer: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse transformer: {}", path.display()))
    }
}
