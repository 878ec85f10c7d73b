//! Sequence-to-one forecasting models
//!
//! The pipeline treats the model as an opaque trainable regressor: anything
//! that can fit on (history, target) pairs and produce one scaled value per
//! test window is substitutable. The default is the two-layer LSTM in
//! [`lstm`]; [`persistence`] provides a trivial baseline.

use crate::error::Result;
use std::fmt::Debug;

/// Forecasting model that can be fitted on windowed training pairs
pub trait SequenceModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedSequenceModel;

    /// Fit the model on training histories and their next-step targets.
    ///
    /// Histories and targets are scaled values; `targets[i]` is the value
    /// immediately following `histories[i]`.
    fn fit(&self, histories: &[Vec<f64>], targets: &[f64]) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Trained sequence model producing one prediction per input window
pub trait TrainedSequenceModel: Debug {
    /// Predict the next scaled value for each history, preserving input order
    fn predict(&self, histories: &[Vec<f64>]) -> Result<Vec<f64>>;

    /// Name of the model
    fn name(&self) -> &str;
}

pub mod lstm;
pub mod persistence;

pub use lstm::{LstmConfig, LstmModel, TrainedLstm};
pub use persistence::{PersistenceModel, TrainedPersistence};
