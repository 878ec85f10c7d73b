//! Reversible min-max scaling for model input

use crate::error::{Result, TrafficError};

/// Min-max linear transform fitted once over a series.
///
/// The observed minimum maps exactly to the low end of the feature range and
/// the maximum to the high end. Parameters are fixed at fit time; the same
/// instance must be used to invert every value the model produces.
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    data_min: f64,
    data_max: f64,
    range_min: f64,
    range_max: f64,
}

impl MinMaxScaler {
    /// Fit the transform over the series values.
    ///
    /// Fails with `DegenerateSeries` when all values are equal, since the
    /// transform would divide by a zero range.
    pub fn fit(values: &[f64], feature_range: (f64, f64)) -> Result<Self> {
        if values.is_empty() {
            return Err(TrafficError::DataError(
                "Cannot fit scaler on an empty series".to_string(),
            ));
        }

        let (range_min, range_max) = feature_range;
        if range_min >= range_max {
            return Err(TrafficError::InvalidParameter(format!(
                "Feature range ({}, {}) must be increasing",
                range_min, range_max
            )));
        }

        if values.iter().any(|v| !v.is_finite()) {
            return Err(TrafficError::DataError(
                "Series contains non-finite values".to_string(),
            ));
        }

        let data_min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let data_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if data_max == data_min {
            return Err(TrafficError::DegenerateSeries(format!(
                "All {} values equal {}; min-max scaling is undefined",
                values.len(),
                data_min
            )));
        }

        Ok(Self {
            data_min,
            data_max,
            range_min,
            range_max,
        })
    }

    /// Map one value into the feature range
    pub fn transform_value(&self, value: f64) -> f64 {
        let unit = (value - self.data_min) / (self.data_max - self.data_min);
        self.range_min + unit * (self.range_max - self.range_min)
    }

    /// Map a slice of values into the feature range
    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform_value(v)).collect()
    }

    /// Exact algebraic inverse of `transform_value`
    pub fn inverse_value(&self, scaled: f64) -> f64 {
        let unit = (scaled - self.range_min) / (self.range_max - self.range_min);
        self.data_min + unit * (self.data_max - self.data_min)
    }

    /// Map scaled values back into original units
    pub fn inverse_transform(&self, scaled: &[f64]) -> Vec<f64> {
        scaled.iter().map(|&v| self.inverse_value(v)).collect()
    }

    /// Observed series minimum
    pub fn data_min(&self) -> f64 {
        self.data_min
    }

    /// Observed series maximum
    pub fn data_max(&self) -> f64 {
        self.data_max
    }
}
