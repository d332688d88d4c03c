//! Ordered (timestamp, value) series for metered energy data.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// One timestamped reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Instant the reading is attributed to.
    pub timestamp: DateTime<Utc>,
    /// Reading value (kWh per interval for usage data).
    pub value: f64,
}

/// Non-empty sequence of samples with strictly increasing timestamps.
///
/// Interval durations may be irregular; they are derived from consecutive
/// timestamps. Construction validates the ordering invariant once so the
/// engine never has to re-check it mid-run.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    samples: Vec<Sample>,
}

impl TimeSeries {
    /// Validates and wraps a sample vector.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedInput`] identifying the offending index
    /// if the vector is empty, a value is not finite, or a timestamp fails
    /// to strictly increase.
    pub fn new(samples: Vec<Sample>) -> Result<Self, SimError> {
        if samples.is_empty() {
            return Err(SimError::MalformedInput {
                index: 0,
                reason: "series is empty".to_string(),
            });
        }
        for (index, sample) in samples.iter().enumerate() {
            if !sample.value.is_finite() {
                return Err(SimError::MalformedInput {
                    index,
                    reason: format!("value {} is not finite", sample.value),
                });
            }
            if index > 0 && sample.timestamp <= samples[index - 1].timestamp {
                return Err(SimError::MalformedInput {
                    index,
                    reason: format!(
                        "timestamp {} does not strictly increase",
                        sample.timestamp
                    ),
                });
            }
        }
        Ok(Self { samples })
    }

    /// Builds an hourly series starting at `start`, one value per hour.
    ///
    /// # Errors
    ///
    /// Same validation as [`TimeSeries::new`].
    pub fn hourly(start: DateTime<Utc>, values: &[f64]) -> Result<Self, SimError> {
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, &value)| Sample {
                timestamp: start + Duration::hours(i as i64),
                value,
            })
            .collect();
        Self::new(samples)
    }

    /// Number of samples. Always at least one.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; emptiness is rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The validated samples in timestamp order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterates the samples in timestamp order.
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Gap between the first two samples, if the series has more than one.
    pub fn first_gap(&self) -> Option<Duration> {
        if self.samples.len() > 1 {
            Some(self.samples[1].timestamp - self.samples[0].timestamp)
        } else {
            None
        }
    }
}
