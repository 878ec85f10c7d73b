//! # Traffic Forecast
//!
//! A Rust library for short-interval traffic volume forecasting from
//! SCATS-style periodic count tables.
//!
//! ## Features
//!
//! - Wide-to-long reshaping of periodic count tables with coded interval
//!   slot columns (`V00`..`V95` for 15-minute granularity)
//! - Per-site chronological series extraction with day-first date handling
//! - Reversible min-max scaling and fixed-length supervised window
//!   construction
//! - Time-respecting train/test splitting (no shuffling)
//! - Pluggable sequence models behind a fit/predict contract, with a
//!   two-layer LSTM default and a persistence baseline
//! - Prediction alignment back onto real timestamps, accuracy metrics and
//!   CSV/JSON export of the prediction table
//!
//! ## Quick Start
//!
//! ```no_run
//! use traffic_forecast::config::PipelineConfig;
//! use traffic_forecast::data::RawTable;
//! use traffic_forecast::models::LstmModel;
//! use traffic_forecast::pipeline::run_forecast;
//!
//! # fn main() -> traffic_forecast::error::Result<()> {
//! // Load the raw count table (first header line is skipped automatically)
//! let table = RawTable::from_csv("scats_oct2006.csv")?;
//!
//! // Configure the run for one site
//! let config = PipelineConfig::for_site("970");
//!
//! // Train and evaluate the default LSTM
//! let model = LstmModel::with_defaults()?;
//! let run = run_forecast(&table, &config, &model)?;
//!
//! println!("{}", run.accuracy);
//! run.write_predictions_csv("predictions.csv")?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod scaling;
pub mod windowing;

// Re-export commonly used types
pub use crate::config::PipelineConfig;
pub use crate::data::{LongRecord, RawTable, SiteSeries};
pub use crate::error::TrafficError;
pub use crate::metrics::ForecastAccuracy;
pub use crate::models::{SequenceModel, TrainedSequenceModel};
pub use crate::pipeline::{run_forecast, ForecastRun, Prediction};
pub use crate::scaling::MinMaxScaler;
pub use crate::windowing::WindowSet;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
