//! Pipeline configuration

use crate::error::{Result, TrafficError};
use serde::{Deserialize, Serialize};

/// Minutes in a day, used to derive the slot granularity.
pub const MINUTES_PER_DAY: usize = 1440;

/// Configuration for a single forecasting run.
///
/// Defaults match the SCATS October 2006 export: 96 fifteen-minute slots per
/// day, a 60-step history window and an 80/20 chronological split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Target site identifier, compared as text against the site column
    pub site_id: String,
    /// History window length L
    pub window_len: usize,
    /// Fraction of windows assigned to the training prefix
    pub split_fraction: f64,
    /// Output range of the min-max scaler
    pub feature_range: (f64, f64),
    /// Number of periodic slots covering one day
    pub slots_per_day: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            site_id: "970".to_string(),
            window_len: 60,
            split_fraction: 0.8,
            feature_range: (0.0, 1.0),
            slots_per_day: 96,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration for the given site with default parameters
    pub fn for_site(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            ..Self::default()
        }
    }

    /// Validate the configuration, failing eagerly before any data work
    pub fn validate(&self) -> Result<()> {
        if self.site_id.is_empty() {
            return Err(TrafficError::InvalidParameter(
                "Site identifier must not be empty".to_string(),
            ));
        }

        if self.window_len == 0 {
            return Err(TrafficError::InvalidParameter(
                "Window length must be at least 1".to_string(),
            ));
        }

        if self.split_fraction <= 0.0 || self.split_fraction >= 1.0 {
            return Err(TrafficError::InvalidParameter(format!(
                "Split fraction must be between 0 and 1, got {}",
                self.split_fraction
            )));
        }

        if self.feature_range.0 >= self.feature_range.1 {
            return Err(TrafficError::InvalidParameter(format!(
                "Feature range ({}, {}) must be increasing",
                self.feature_range.0, self.feature_range.1
            )));
        }

        if self.slots_per_day == 0 || MINUTES_PER_DAY % self.slots_per_day != 0 {
            return Err(TrafficError::InvalidParameter(format!(
                "Slots per day must divide {} evenly, got {}",
                MINUTES_PER_DAY, self.slots_per_day
            )));
        }

        Ok(())
    }

    /// Slot granularity in minutes implied by `slots_per_day`
    pub fn slot_minutes(&self) -> usize {
        MINUTES_PER_DAY / self.slots_per_day
    }
}
