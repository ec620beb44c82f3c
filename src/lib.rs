//! Prepline: tabular data preparation for model training
//!
//! Ingests a raw dataset, validates it against a schema and the Kolmogorov-Smirnov
//! drift test, then imputes missing features with a KNN imputer and writes
//! training-ready numeric arrays.

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod utils;
