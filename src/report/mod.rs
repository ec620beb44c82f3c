//! Report module - console summaries of pipeline runs and drift checks

pub mod summary;

pub use summary::*;
