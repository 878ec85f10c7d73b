//! Naive persistence baseline

use crate::error::{Result, TrafficError};
use crate::models::{SequenceModel, TrainedSequenceModel};

/// Baseline model predicting that the next value equals the last observed
/// value of the window.
///
/// Useful as a sanity floor for the LSTM and as a fast stand-in in tests.
#[derive(Debug, Clone)]
pub struct PersistenceModel {
    name: String,
}

/// Trained persistence model
#[derive(Debug, Clone)]
pub struct TrainedPersistence {
    name: String,
}

impl PersistenceModel {
    /// Create a new persistence baseline
    pub fn new() -> Self {
        Self {
            name: "Persistence".to_string(),
        }
    }
}

impl Default for PersistenceModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceModel for PersistenceModel {
    type Trained = TrainedPersistence;

    fn fit(&self, histories: &[Vec<f64>], targets: &[f64]) -> Result<Self::Trained> {
        if histories.is_empty() {
            return Err(TrafficError::ModelFitFailure(
                "No training windows supplied".to_string(),
            ));
        }
        if histories.len() != targets.len() {
            return Err(TrafficError::ModelFitFailure(format!(
                "History count ({}) does not match target count ({})",
                histories.len(),
                targets.len()
            )));
        }

        Ok(TrainedPersistence {
            name: self.name.clone(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedSequenceModel for TrainedPersistence {
    fn predict(&self, histories: &[Vec<f64>]) -> Result<Vec<f64>> {
        histories
            .iter()
            .map(|history| {
                history.last().copied().ok_or_else(|| {
                    TrafficError::ModelPredictFailure(
                        "Cannot predict from an empty history".to_string(),
                    )
                })
            })
            .collect()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
