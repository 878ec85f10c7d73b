//! Supervised window construction and the time-respecting split

use crate::error::{Result, TrafficError};

/// Fixed-length (history, target) pairs slid one step at a time over a
/// scaled series.
///
/// Window `i` covers scaled values `[i, i + L)` as history and value `i + L`
/// as target, so a series of length `n` yields `n - L` windows.
#[derive(Debug, Clone)]
pub struct WindowSet {
    histories: Vec<Vec<f64>>,
    targets: Vec<f64>,
    window_len: usize,
}

impl WindowSet {
    /// Slide a window of length `window_len` over the series.
    ///
    /// Fails with `InsufficientSeriesLength` when the series cannot produce
    /// even one window.
    pub fn build(series: &[f64], window_len: usize) -> Result<Self> {
        if window_len == 0 {
            return Err(TrafficError::InvalidParameter(
                "Window length must be at least 1".to_string(),
            ));
        }

        if series.len() <= window_len {
            return Err(TrafficError::InsufficientSeriesLength(format!(
                "Series of length {} cannot produce windows of length {}",
                series.len(),
                window_len
            )));
        }

        let count = series.len() - window_len;
        let mut histories = Vec::with_capacity(count);
        let mut targets = Vec::with_capacity(count);

        for i in 0..count {
            histories.push(series[i..i + window_len].to_vec());
            targets.push(series[i + window_len]);
        }

        Ok(Self {
            histories,
            targets,
            window_len,
        })
    }

    /// Partition into a training prefix and a test suffix.
    ///
    /// The boundary is `floor(fraction * count)`. No shuffling: order is the
    /// sole split criterion, so no test history can precede a training target
    /// in time. Returns `(train, test, boundary)`.
    pub fn split(&self, fraction: f64) -> Result<(WindowSet, WindowSet, usize)> {
        if fraction <= 0.0 || fraction >= 1.0 {
            return Err(TrafficError::InvalidParameter(format!(
                "Split fraction must be between 0 and 1, got {}",
                fraction
            )));
        }

        let boundary = (fraction * self.len() as f64).floor() as usize;

        let train = WindowSet {
            histories: self.histories[..boundary].to_vec(),
            targets: self.targets[..boundary].to_vec(),
            window_len: self.window_len,
        };
        let test = WindowSet {
            histories: self.histories[boundary..].to_vec(),
            targets: self.targets[boundary..].to_vec(),
            window_len: self.window_len,
        };

        Ok((train, test, boundary))
    }

    /// History sequences in generation order
    pub fn histories(&self) -> &[Vec<f64>] {
        &self.histories
    }

    /// Target values in generation order
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// History length L
    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Number of windows
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    /// Whether the set holds no windows
    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}
