//! Error types for the traffic_forecast crate

use thiserror::Error;

/// Custom error types for the traffic_forecast crate
#[derive(Debug, Error)]
pub enum TrafficError {
    /// Interval slot label does not match the expected prefix+index format
    #[error("Malformed interval label: {0}")]
    MalformedIntervalLabel(String),

    /// The requested site identifier has no records in the reshaped series
    #[error("No data for site: {0}")]
    NoDataForSite(String),

    /// The selected series has a single repeated value, so min-max scaling is undefined
    #[error("Degenerate series: {0}")]
    DegenerateSeries(String),

    /// The series is too short to produce even one window
    #[error("Insufficient series length: {0}")]
    InsufficientSeriesLength(String),

    /// The forecasting model failed while fitting
    #[error("Model fit failure: {0}")]
    ModelFitFailure(String),

    /// The forecasting model failed while predicting
    #[error("Model predict failure: {0}")]
    ModelPredictFailure(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, TrafficError>;

impl From<polars::prelude::PolarsError> for TrafficError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        TrafficError::PolarsError(err.to_string())
    }
}
