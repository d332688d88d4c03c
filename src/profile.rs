//! Synthetic usage profiles for demos and tests.

use chrono::{DateTime, Duration, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::error::SimError;
use crate::series::{Sample, TimeSeries};

/// Sinusoidal daily usage shape with seeded Gaussian noise.
///
/// Deterministic for a fixed seed, so scenario runs built on a synthetic
/// profile stay reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageProfile {
    /// Mean usage per interval (kWh).
    pub base_kwh: f64,
    /// Daily swing amplitude (kWh).
    pub amp_kwh: f64,
    /// Phase offset of the daily shape (radians).
    pub phase_rad: f64,
    /// Gaussian noise standard deviation (kWh).
    pub noise_std: f64,
    /// RNG seed.
    pub seed: u64,
}

impl UsageProfile {
    /// Generates `intervals` samples spaced `interval_h` hours apart,
    /// starting at `start`. Values are clamped at zero — metered usage is
    /// never negative.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedInput`] if `intervals` is zero or
    /// `interval_h` is not positive.
    pub fn generate(
        &self,
        start: DateTime<Utc>,
        interval_h: f64,
        intervals: usize,
    ) -> Result<TimeSeries, SimError> {
        if !interval_h.is_finite() || interval_h <= 0.0 {
            return Err(SimError::MalformedInput {
                index: 0,
                reason: format!("interval duration {interval_h} must be > 0"),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut samples = Vec::with_capacity(intervals);
        for i in 0..intervals {
            let hour_of_day = (i as f64 * interval_h) % 24.0;
            let angle = 2.0 * std::f64::consts::PI * hour_of_day / 24.0 + self.phase_rad;
            let value = (self.base_kwh
                + self.amp_kwh * angle.sin()
                + gaussian_noise(&mut rng, self.noise_std))
            .max(0.0);
            let offset_ms = (i as f64 * interval_h * 3_600_000.0) as i64;
            samples.push(Sample {
                timestamp: start + Duration::milliseconds(offset_ms),
                value,
            });
        }
        TimeSeries::new(samples)
    }
}

/// Gaussian noise via the Box-Muller transform.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}
