//! Simulation engine: steps the usage series in timestamp order, drives the
//! battery through the chosen strategy, and accounts metered cost with and
//! without the battery.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::battery::{Battery, BatterySpec};
use crate::control::{ControlAlgorithm, DecisionContext};
use crate::error::SimError;
use crate::pricing::PricePolicy;
use crate::series::TimeSeries;

/// Fallback first-interval duration when the series has a single sample and
/// no override is configured.
pub const DEFAULT_FIRST_INTERVAL_H: f64 = 1.0;

/// Crediting policy when battery output exceeds the building's usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetMetering {
    /// Negative net draw is credited at the full retail price.
    Retail,
    /// Negative net draw earns nothing; the surplus is forfeited.
    None,
}

/// Per-run knobs that are billing policy rather than physics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    /// Duration attributed to the first sample, in hours. `None` reuses the
    /// series' own first gap; a single-sample series falls back to
    /// [`DEFAULT_FIRST_INTERVAL_H`].
    pub first_interval_h: Option<f64>,
    /// Excess-discharge crediting policy.
    pub net_metering: NetMetering,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            first_interval_h: None,
            net_metering: NetMetering::Retail,
        }
    }
}

/// One line of the run's audit trail. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalRecord {
    /// Start of the interval.
    pub timestamp: DateTime<Utc>,
    /// Interval duration (hours).
    pub duration_h: f64,
    /// Metered usage (kWh).
    pub usage_kwh: f64,
    /// Price in effect ($/kWh).
    pub price_per_kwh: f64,
    /// Power the strategy asked for (kW; positive = charge).
    pub requested_power_kw: f64,
    /// Meter-side power the battery actually achieved (kW).
    pub achieved_power_kw: f64,
    /// State of charge after the transition (kWh).
    pub soc_kwh: f64,
    /// Net energy drawn from the grid (kWh; negative = export).
    pub grid_kwh: f64,
    /// What the interval cost without the battery ($).
    pub cost_without: f64,
    /// What the interval cost with the battery ($).
    pub cost_with: f64,
}

impl fmt::Display for IntervalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | use={:>6.3} kWh @ {:>6.4} $/kWh | req={:>6.2} kW  got={:>6.2} kW  \
             SoC={:>6.2} kWh | grid={:>7.3} kWh | cost {:.4} -> {:.4}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.usage_kwh,
            self.price_per_kwh,
            self.requested_power_kw,
            self.achieved_power_kw,
            self.soc_kwh,
            self.grid_kwh,
            self.cost_without,
            self.cost_with,
        )
    }
}

/// One simulation run over a fixed usage series.
///
/// Generic over the price policy and the strategy for static dispatch. The
/// engine owns its battery for the run's duration, so independent runs can
/// execute concurrently as long as each builds its own engine.
pub struct Engine<'a, P: PricePolicy, C: ControlAlgorithm> {
    usage: &'a TimeSeries,
    policy: &'a P,
    battery: Battery,
    control: &'a C,
    options: RunOptions,
}

impl<'a, P: PricePolicy, C: ControlAlgorithm> Engine<'a, P, C> {
    /// Builds an engine for one run.
    ///
    /// # Panics
    ///
    /// Panics if the battery spec or the initial SOC is invalid (see
    /// [`Battery::new`]).
    pub fn new(
        usage: &'a TimeSeries,
        policy: &'a P,
        spec: BatterySpec,
        initial_soc_kwh: f64,
        control: &'a C,
        options: RunOptions,
    ) -> Self {
        Self {
            usage,
            policy,
            battery: Battery::new(spec, initial_soc_kwh),
            control,
            options,
        }
    }

    /// Executes the run and returns the full ordered audit trail.
    ///
    /// Deterministic: identical inputs produce identical records. Any error
    /// aborts the run with no partial results — a corrupted audit trail is
    /// worse than no result.
    ///
    /// # Errors
    ///
    /// - [`SimError::MalformedInput`] for negative usage or an invalid
    ///   first-interval override, naming the offending index
    /// - [`SimError::ScheduleGap`] if the price policy cannot resolve a
    ///   timestamp (unreachable for a validated schedule)
    pub fn run(mut self) -> Result<Vec<IntervalRecord>, SimError> {
        let samples = self.usage.samples();

        // Validate usage up front so nothing is computed from bad input.
        for (index, sample) in samples.iter().enumerate() {
            if sample.value < 0.0 {
                return Err(SimError::MalformedInput {
                    index,
                    reason: format!("negative usage {}", sample.value),
                });
            }
        }
        if let Some(h) = self.options.first_interval_h {
            if !h.is_finite() || h <= 0.0 {
                return Err(SimError::MalformedInput {
                    index: 0,
                    reason: format!("first interval duration {h} must be > 0"),
                });
            }
        }

        let first_h = match self.options.first_interval_h {
            Some(h) => h,
            None => self
                .usage
                .first_gap()
                .map_or(DEFAULT_FIRST_INTERVAL_H, duration_hours),
        };

        let mut records = Vec::with_capacity(samples.len());
        for (i, sample) in samples.iter().enumerate() {
            let duration_h = if i == 0 {
                first_h
            } else {
                duration_hours(sample.timestamp - samples[i - 1].timestamp)
            };

            let price = self.policy.price_at(sample.timestamp)?;
            if !price.is_finite() || price < 0.0 {
                return Err(SimError::MalformedInput {
                    index: i,
                    reason: format!("price {price} is out of range"),
                });
            }

            let usage_kwh = sample.value;
            let cost_without = usage_kwh * price;

            let ctx = DecisionContext {
                timestamp: sample.timestamp,
                price_per_kwh: price,
                usage_kwh,
                duration_h,
                soc_kwh: self.battery.soc_kwh(),
                spec: self.battery.spec(),
            };
            let requested_power_kw = self.control.decide(&ctx);
            let achieved_power_kw = self.battery.request_transition(requested_power_kw, duration_h);

            // Charge adds grid draw; discharge offsets usage at the meter.
            let grid_kwh = usage_kwh + achieved_power_kw * duration_h;
            let billed_kwh = match self.options.net_metering {
                NetMetering::Retail => grid_kwh,
                NetMetering::None => grid_kwh.max(0.0),
            };
            let cost_with = billed_kwh * price;

            records.push(IntervalRecord {
                timestamp: sample.timestamp,
                duration_h,
                usage_kwh,
                price_per_kwh: price,
                requested_power_kw,
                achieved_power_kw,
                soc_kwh: self.battery.soc_kwh(),
                grid_kwh,
                cost_without,
                cost_with,
            });
        }
        Ok(records)
    }
}

// Nanosecond precision so any strictly-increasing pair of timestamps yields
// a positive duration; milliseconds fall back only on i64 overflow (spans of
// centuries).
fn duration_hours(d: chrono::Duration) -> f64 {
    match d.num_nanoseconds() {
        Some(ns) => ns as f64 / 3.6e12,
        None => d.num_milliseconds() as f64 / 3_600_000.0,
    }
}
