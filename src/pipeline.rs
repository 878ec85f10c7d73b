//! End-to-end forecasting pipeline
//!
//! Runs reshape -> site selection -> scaling -> windowing -> split -> model
//! fit -> model predict -> alignment, synchronously and without retries. Any
//! stage failure aborts the run; no partial results are returned.

use crate::config::PipelineConfig;
use crate::data::{reshape, RawTable, SiteSeries};
use crate::error::{Result, TrafficError};
use crate::metrics::{forecast_accuracy, ForecastAccuracy};
use crate::models::{SequenceModel, TrainedSequenceModel};
use crate::scaling::MinMaxScaler;
use crate::windowing::WindowSet;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::Path;

/// One evaluated test point: the observation timestamp with the actual and
/// predicted volumes in original units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Timestamp of the predicted observation
    pub timestamp: NaiveDateTime,
    /// Observed traffic volume
    pub actual: f64,
    /// Model output, de-normalized
    pub predicted: f64,
}

/// Outcome of a completed run: the aligned prediction table, the trained
/// model handle for further inference, and an accuracy summary
#[derive(Debug)]
pub struct ForecastRun<T: TrainedSequenceModel> {
    /// Ordered (timestamp, actual, predicted) triples over the test suffix
    pub predictions: Vec<Prediction>,
    /// The trained model, usable for further inference
    pub model: T,
    /// Accuracy of the predictions against the held-out actuals
    pub accuracy: ForecastAccuracy,
}

impl<T: TrainedSequenceModel> ForecastRun<T> {
    /// Serialize the prediction table to JSON
    pub fn predictions_to_json(&self) -> Result<String> {
        serde_json::to_string(&self.predictions)
            .map_err(|e| TrafficError::DataError(format!("JSON export failed: {}", e)))
    }

    /// Write the prediction table to a CSV file
    pub fn write_predictions_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .map_err(|e| TrafficError::DataError(format!("CSV export failed: {}", e)))?;

        writer
            .write_record(["timestamp", "actual", "predicted"])
            .map_err(|e| TrafficError::DataError(format!("CSV export failed: {}", e)))?;

        for prediction in &self.predictions {
            writer
                .write_record([
                    prediction.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    prediction.actual.to_string(),
                    prediction.predicted.to_string(),
                ])
                .map_err(|e| TrafficError::DataError(format!("CSV export failed: {}", e)))?;
        }

        writer
            .flush()
            .map_err(|e| TrafficError::DataError(format!("CSV export failed: {}", e)))?;
        Ok(())
    }
}

/// Run the full forecasting pipeline over a raw count table.
///
/// The model is an opaque collaborator: anything implementing
/// [`SequenceModel`] can be plugged in without touching the pipeline.
pub fn run_forecast<M: SequenceModel>(
    table: &RawTable,
    config: &PipelineConfig,
    model: &M,
) -> Result<ForecastRun<M::Trained>> {
    config.validate()?;

    let records = reshape(table, config.slots_per_day)?;
    let series = SiteSeries::select(&records, &config.site_id)?;

    // The scaler is fitted exactly once; the same instance inverts the
    // model's outputs later in the run
    let scaler = MinMaxScaler::fit(series.values(), config.feature_range)?;
    let scaled = scaler.transform(series.values());

    let windows = WindowSet::build(&scaled, config.window_len)?;
    let (train, test, boundary) = windows.split(config.split_fraction)?;

    if train.is_empty() {
        return Err(TrafficError::InsufficientSeriesLength(format!(
            "Split fraction {} leaves no training windows out of {}",
            config.split_fraction,
            windows.len()
        )));
    }
    if test.is_empty() {
        return Err(TrafficError::InsufficientSeriesLength(format!(
            "Split fraction {} leaves no test windows out of {}",
            config.split_fraction,
            windows.len()
        )));
    }

    let trained = model.fit(train.histories(), train.targets())?;
    let predicted_scaled = trained.predict(test.histories())?;

    if predicted_scaled.len() != test.len() {
        return Err(TrafficError::ModelPredictFailure(format!(
            "Model returned {} predictions for {} test windows",
            predicted_scaled.len(),
            test.len()
        )));
    }

    let predictions = align_predictions(
        &scaler,
        &series,
        boundary,
        config.window_len,
        &predicted_scaled,
        test.targets(),
    )?;

    let actual: Vec<f64> = predictions.iter().map(|p| p.actual).collect();
    let predicted: Vec<f64> = predictions.iter().map(|p| p.predicted).collect();
    let accuracy = forecast_accuracy(&predicted, &actual)?;

    Ok(ForecastRun {
        predictions,
        model: trained,
        accuracy,
    })
}

/// Invert the scaling transform on model outputs and realign each prediction
/// to its originating timestamp.
///
/// Test window `i` targets the series observation at index
/// `boundary + i + window_len`, so that timestamp carries prediction `i`.
/// Input order is preserved; reordering here would break the positional
/// correspondence.
pub fn align_predictions(
    scaler: &MinMaxScaler,
    series: &SiteSeries,
    boundary: usize,
    window_len: usize,
    predicted_scaled: &[f64],
    actual_scaled: &[f64],
) -> Result<Vec<Prediction>> {
    if predicted_scaled.len() != actual_scaled.len() {
        return Err(TrafficError::ModelPredictFailure(format!(
            "Predicted ({}) and actual ({}) counts differ",
            predicted_scaled.len(),
            actual_scaled.len()
        )));
    }

    let timestamps = series.timestamps();
    let last_index = boundary + predicted_scaled.len() + window_len;
    if last_index > timestamps.len() {
        return Err(TrafficError::DataError(format!(
            "Alignment overruns the series: need index {} of {}",
            last_index - 1,
            timestamps.len()
        )));
    }

    let predicted = scaler.inverse_transform(predicted_scaled);
    let actual = scaler.inverse_transform(actual_scaled);

    Ok(predicted
        .into_iter()
        .zip(actual)
        .enumerate()
        .map(|(i, (predicted, actual))| Prediction {
            timestamp: timestamps[boundary + i + window_len],
            actual,
            predicted,
        })
        .collect())
}
