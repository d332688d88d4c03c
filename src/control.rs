//! Dispatch strategies deciding the battery action for each interval.

use chrono::{DateTime, Timelike, Utc};

use crate::battery::BatterySpec;
use crate::pricing::HourWindow;

/// Everything a strategy may inspect when deciding an action.
///
/// The context is read-only; strategies can reason about headroom through
/// the spec but cannot mutate battery state.
#[derive(Debug, Clone)]
pub struct DecisionContext<'a> {
    /// Start of the interval being decided.
    pub timestamp: DateTime<Utc>,
    /// Price in effect for the interval.
    pub price_per_kwh: f64,
    /// Metered usage for the interval (kWh).
    pub usage_kwh: f64,
    /// Interval duration (hours).
    pub duration_h: f64,
    /// Battery state of charge entering the interval (kWh).
    pub soc_kwh: f64,
    /// The battery's immutable parameters.
    pub spec: &'a BatterySpec,
}

/// A battery dispatch strategy.
///
/// `decide` returns the requested power in kW for the upcoming interval:
/// positive to charge, negative to discharge, zero to idle. Implementations
/// take `&self` and must not retain mutable history between calls — the
/// engine is the single source of truth for battery state, which keeps
/// replay deterministic and lets strategies be unit-tested in isolation.
pub trait ControlAlgorithm {
    /// Requested power for the upcoming interval (kW, signed).
    fn decide(&self, ctx: &DecisionContext<'_>) -> f64;
}

/// Charges below a low price threshold, discharges above a high one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceThresholdControl {
    /// Charge at max rate when the price is at or below this.
    pub charge_below: f64,
    /// Discharge at max rate when the price is at or above this.
    pub discharge_above: f64,
}

impl ControlAlgorithm for PriceThresholdControl {
    fn decide(&self, ctx: &DecisionContext<'_>) -> f64 {
        if ctx.price_per_kwh <= self.charge_below {
            ctx.spec.max_charge_kw
        } else if ctx.price_per_kwh >= self.discharge_above {
            -ctx.spec.max_discharge_kw
        } else {
            0.0
        }
    }
}

/// Charges inside an off-peak hour window, discharges inside a peak window.
///
/// Discharge takes precedence if the windows overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouWindowControl {
    pub charge_window: HourWindow,
    pub discharge_window: HourWindow,
}

impl ControlAlgorithm for TouWindowControl {
    fn decide(&self, ctx: &DecisionContext<'_>) -> f64 {
        let hour = ctx.timestamp.hour();
        if self.discharge_window.contains(hour) {
            -ctx.spec.max_discharge_kw
        } else if self.charge_window.contains(hour) {
            ctx.spec.max_charge_kw
        } else {
            0.0
        }
    }
}

/// Closed set of built-in strategies, selectable from configuration.
///
/// The engine dispatches through [`ControlAlgorithm`] and never matches on
/// the variant itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    PriceThreshold(PriceThresholdControl),
    TouWindow(TouWindowControl),
}

impl ControlAlgorithm for Control {
    fn decide(&self, ctx: &DecisionContext<'_>) -> f64 {
        match self {
            Self::PriceThreshold(c) => c.decide(ctx),
            Self::TouWindow(c) => c.decide(ctx),
        }
    }
}
