use std::path::PathBuf;

use thiserror::Error;

use crate::data::fields::{Dimension, NumericField};

/// Errors that make a dataset unusable for the session.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("required column '{0}' is missing")]
    MissingColumn(&'static str),

    #[error("row {row}, column '{column}': {reason}")]
    Malformed {
        row: usize,
        column: &'static str,
        reason: String,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("no usable rows after dropping nulls in required columns ({dropped} dropped)")]
    Empty { dropped: usize },
}

/// Reasons an aggregation produced no result for the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("no data for current selection")]
    NoData,

    #[error("column '{}' is not present in the dataset", .0.as_str())]
    NumericUnavailable(NumericField),

    #[error("column '{}' is not present in the dataset", .0.as_str())]
    DimensionUnavailable(Dimension),

    #[error("correlation needs at least two usable fields, found {0}")]
    InsufficientFields(usize),
}

pub type LoadResult<T> = Result<T, LoadError>;
pub type AnalysisResult<T> = Result<T, AnalysisError>;
