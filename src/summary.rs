//! Post-hoc reduction of a run's interval records into period totals.

use std::fmt;

use serde::Serialize;

use crate::engine::IntervalRecord;
use crate::error::SimError;

/// Aggregate outcome of one simulation run.
///
/// Computed after the fact from the full record sequence so the report can
/// never disagree with the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Number of intervals in the run.
    pub interval_count: usize,
    /// Total simulated span (hours).
    pub span_h: f64,
    /// Total cost without the battery ($).
    pub cost_without: f64,
    /// Total cost with the battery ($).
    pub cost_with: f64,
    /// Savings: cost without minus cost with ($).
    pub savings: f64,
    /// Meter-side energy pushed into the battery (kWh).
    pub charged_kwh: f64,
    /// Energy the battery delivered to the meter (kWh).
    pub discharged_kwh: f64,
    /// Continuous cycle metric: delivered energy over capacity.
    pub cycle_count: f64,
    /// Time-weighted mean state of charge (kWh).
    pub mean_soc_kwh: f64,
}

impl Summary {
    /// Reduces a record sequence to period totals.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EmptyRun`] for an empty record sequence.
    ///
    /// # Panics
    ///
    /// Debug builds panic on a non-positive `capacity_kwh`; every battery in
    /// the system is constructed with a positive capacity.
    pub fn from_records(records: &[IntervalRecord], capacity_kwh: f64) -> Result<Self, SimError> {
        debug_assert!(capacity_kwh > 0.0, "capacity_kwh must be > 0");
        if records.is_empty() {
            return Err(SimError::EmptyRun);
        }

        let mut span_h = 0.0;
        let mut cost_without = 0.0;
        let mut cost_with = 0.0;
        let mut charged_kwh = 0.0;
        let mut discharged_kwh = 0.0;
        let mut soc_weight = 0.0;

        for r in records {
            span_h += r.duration_h;
            cost_without += r.cost_without;
            cost_with += r.cost_with;
            if r.achieved_power_kw > 0.0 {
                charged_kwh += r.achieved_power_kw * r.duration_h;
            } else {
                discharged_kwh += -r.achieved_power_kw * r.duration_h;
            }
            soc_weight += r.soc_kwh * r.duration_h;
        }

        let cycle_count = discharged_kwh / capacity_kwh;

        Ok(Self {
            interval_count: records.len(),
            span_h,
            cost_without,
            cost_with,
            savings: cost_without - cost_with,
            charged_kwh,
            discharged_kwh,
            cycle_count,
            mean_soc_kwh: soc_weight / span_h,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Savings Report ---")?;
        writeln!(
            f,
            "Intervals:             {} ({:.1} h)",
            self.interval_count, self.span_h
        )?;
        writeln!(f, "Cost without battery:  ${:.4}", self.cost_without)?;
        writeln!(f, "Cost with battery:     ${:.4}", self.cost_with)?;
        writeln!(f, "Savings:               ${:.4}", self.savings)?;
        writeln!(
            f,
            "Battery charged:       {:.2} kWh ({:.2} kWh delivered, {:.2} cycles)",
            self.charged_kwh, self.discharged_kwh, self.cycle_count
        )?;
        write!(f, "Mean state of charge:  {:.2} kWh", self.mean_soc_kwh)
    }
}
