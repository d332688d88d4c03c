//! Stationary battery model with a single clamped state transition.

use serde::{Deserialize, Serialize};

/// Immutable physical parameters of a battery.
///
/// The state-of-charge fractions bound the usable window of the pack,
/// keeping it away from deep discharge and overcharge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatterySpec {
    /// Total energy capacity in kWh.
    pub capacity_kwh: f64,
    /// Maximum charging power in kW (positive magnitude).
    pub max_charge_kw: f64,
    /// Maximum discharging power in kW (positive magnitude).
    pub max_discharge_kw: f64,
    /// Round-trip efficiency (0 < eta <= 1).
    pub round_trip_efficiency: f64,
    /// Lowest allowed state of charge as a fraction of capacity.
    pub min_soc_fraction: f64,
    /// Highest allowed state of charge as a fraction of capacity.
    pub max_soc_fraction: f64,
}

impl BatterySpec {
    /// One-way efficiency. The round trip is split evenly between the two
    /// legs, so each of charge and discharge applies `sqrt(eta)`.
    pub fn one_way_efficiency(&self) -> f64 {
        self.round_trip_efficiency.sqrt()
    }

    /// SOC floor in kWh.
    pub fn min_soc_kwh(&self) -> f64 {
        self.min_soc_fraction * self.capacity_kwh
    }

    /// SOC ceiling in kWh.
    pub fn max_soc_kwh(&self) -> f64 {
        self.max_soc_fraction * self.capacity_kwh
    }
}

/// Mutable battery state, owned by exactly one engine for one run.
///
/// State of charge changes only through [`Battery::request_transition`];
/// there are no raw setters, so the physical invariants are enforced in one
/// place.
///
/// # Power Convention (meter side)
/// - Positive power: charging (extra draw from the grid)
/// - Negative power: discharging (energy delivered to the building)
#[derive(Debug, Clone)]
pub struct Battery {
    spec: BatterySpec,
    soc_kwh: f64,
}

impl Battery {
    /// Creates a battery from its spec and an initial state of charge.
    ///
    /// # Panics
    ///
    /// Panics if the spec parameters are out of range or the initial SOC
    /// lies outside the allowed window.
    pub fn new(spec: BatterySpec, initial_soc_kwh: f64) -> Self {
        assert!(spec.capacity_kwh > 0.0);
        assert!(spec.max_charge_kw >= 0.0 && spec.max_discharge_kw >= 0.0);
        assert!(spec.round_trip_efficiency > 0.0 && spec.round_trip_efficiency <= 1.0);
        assert!(spec.min_soc_fraction >= 0.0 && spec.max_soc_fraction <= 1.0);
        assert!(spec.min_soc_fraction < spec.max_soc_fraction);
        assert!(
            initial_soc_kwh >= spec.min_soc_kwh() && initial_soc_kwh <= spec.max_soc_kwh(),
            "initial SOC outside the allowed window"
        );
        Self {
            spec,
            soc_kwh: initial_soc_kwh,
        }
    }

    /// The immutable spec this battery was built from.
    pub fn spec(&self) -> &BatterySpec {
        &self.spec
    }

    /// Current state of charge in kWh.
    pub fn soc_kwh(&self) -> f64 {
        self.soc_kwh
    }

    /// Attempts a charge (positive) or discharge (negative) of `power_kw`
    /// for `duration_h` hours and returns the meter-side power actually
    /// achieved.
    ///
    /// The request is clamped to the power limits, then to whatever the SOC
    /// window still admits after the one-way efficiency. Saturation is
    /// silent and expected; callers detect it by comparing the achieved
    /// value against the request.
    ///
    /// Efficiency policy: charging `E` kWh at the meter stores `E * sqrt(eta)`;
    /// delivering `E` kWh to the meter drains `E / sqrt(eta)`.
    ///
    /// # Panics
    ///
    /// Panics if `duration_h` is not positive.
    pub fn request_transition(&mut self, power_kw: f64, duration_h: f64) -> f64 {
        assert!(duration_h > 0.0, "duration_h must be > 0");
        let eta = self.spec.one_way_efficiency();

        if power_kw > 0.0 {
            let power = power_kw.min(self.spec.max_charge_kw);
            let headroom_kwh = (self.spec.max_soc_kwh() - self.soc_kwh).max(0.0);
            // Meter-side energy the SOC ceiling still admits
            let grid_kwh = (power * duration_h).min(headroom_kwh / eta);
            self.soc_kwh += grid_kwh * eta;
            grid_kwh / duration_h
        } else if power_kw < 0.0 {
            let power = (-power_kw).min(self.spec.max_discharge_kw);
            let available_kwh = (self.soc_kwh - self.spec.min_soc_kwh()).max(0.0);
            // Meter-side energy the SOC floor still admits
            let delivered_kwh = (power * duration_h).min(available_kwh * eta);
            self.soc_kwh -= delivered_kwh / eta;
            -delivered_kwh / duration_h
        } else {
            0.0
        }
    }
}
