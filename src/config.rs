//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::battery::BatterySpec;
use crate::control::{Control, PriceThresholdControl, TouWindowControl};
use crate::engine::{NetMetering, RunOptions};
use crate::error::SimError;
use crate::pricing::{DayFilter, HourWindow, RateRule, TouSchedule};
use crate::profile::UsageProfile;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from TOML
/// with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Run-level policy knobs and strategy selection.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Battery physical parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Time-of-use tariff rules.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Price-threshold strategy parameters.
    #[serde(default)]
    pub price_threshold: PriceThresholdConfig,
    /// Time-of-use-window strategy parameters.
    #[serde(default)]
    pub tou_window: TouWindowConfig,
    /// Synthetic usage profile, used when no meter CSV is supplied.
    #[serde(default)]
    pub usage: UsageConfig,
}

/// Run-level policy knobs and strategy selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Strategy: `"price_threshold"` or `"tou_window"`.
    pub control: String,
    /// Excess-discharge crediting: `"retail"` or `"none"`.
    pub net_metering: NetMetering,
    /// Duration attributed to the first sample (hours). Unset means "reuse
    /// the series' own first gap".
    pub first_interval_h: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            control: "price_threshold".to_string(),
            net_metering: NetMetering::Retail,
            first_interval_h: None,
        }
    }
}

/// Battery physical parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Total energy capacity (kWh).
    pub capacity_kwh: f64,
    /// Initial state of charge as a fraction of capacity.
    pub initial_soc_fraction: f64,
    /// Maximum charging power (kW).
    pub max_charge_kw: f64,
    /// Maximum discharging power (kW).
    pub max_discharge_kw: f64,
    /// Round-trip efficiency (0-1].
    pub round_trip_efficiency: f64,
    /// Lowest allowed state of charge as a fraction of capacity.
    pub min_soc_fraction: f64,
    /// Highest allowed state of charge as a fraction of capacity.
    pub max_soc_fraction: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_kwh: 10.0,
            initial_soc_fraction: 0.5,
            max_charge_kw: 5.0,
            max_discharge_kw: 5.0,
            round_trip_efficiency: 0.9,
            min_soc_fraction: 0.1,
            max_soc_fraction: 0.9,
        }
    }
}

/// Time-of-use tariff rules.
///
/// Either `flat_price` or a non-empty `rules` list, not both.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// Single price covering every instant ($/kWh).
    #[serde(default)]
    pub flat_price: Option<f64>,
    /// Time-of-use rules partitioning the week.
    #[serde(default)]
    pub rules: Vec<RateRuleConfig>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        // Weekday afternoon peak, off-peak everywhere else.
        Self {
            flat_price: None,
            rules: vec![
                RateRuleConfig {
                    days: "weekdays".to_string(),
                    start_hour: 12,
                    end_hour: 20,
                    price_per_kwh: 0.24,
                },
                RateRuleConfig {
                    days: "weekdays".to_string(),
                    start_hour: 20,
                    end_hour: 12,
                    price_per_kwh: 0.11,
                },
                RateRuleConfig {
                    days: "weekends".to_string(),
                    start_hour: 0,
                    end_hour: 0,
                    price_per_kwh: 0.11,
                },
            ],
        }
    }
}

/// One tariff rule as written in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateRuleConfig {
    /// `"all"`, `"weekdays"`, or `"weekends"`.
    pub days: String,
    /// Window start hour (0-23).
    pub start_hour: u32,
    /// Window end hour (exclusive; equal to start covers the day).
    pub end_hour: u32,
    /// Price ($/kWh).
    pub price_per_kwh: f64,
}

/// Price-threshold strategy parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceThresholdConfig {
    /// Charge at max rate at or below this price ($/kWh).
    pub charge_below: f64,
    /// Discharge at max rate at or above this price ($/kWh).
    pub discharge_above: f64,
}

impl Default for PriceThresholdConfig {
    fn default() -> Self {
        Self {
            charge_below: 0.12,
            discharge_above: 0.20,
        }
    }
}

/// Time-of-use-window strategy parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TouWindowConfig {
    /// Charge window start hour.
    pub charge_start_hour: u32,
    /// Charge window end hour (exclusive).
    pub charge_end_hour: u32,
    /// Discharge window start hour.
    pub discharge_start_hour: u32,
    /// Discharge window end hour (exclusive).
    pub discharge_end_hour: u32,
}

impl Default for TouWindowConfig {
    fn default() -> Self {
        Self {
            charge_start_hour: 0,
            charge_end_hour: 6,
            discharge_start_hour: 17,
            discharge_end_hour: 21,
        }
    }
}

/// Synthetic usage profile parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UsageConfig {
    /// Series start, RFC 3339.
    pub start: String,
    /// Interval duration (hours).
    pub interval_h: f64,
    /// Number of intervals to generate.
    pub intervals: usize,
    /// Mean usage per interval (kWh).
    pub base_kwh: f64,
    /// Daily swing amplitude (kWh).
    pub amp_kwh: f64,
    /// Phase offset (radians).
    pub phase_rad: f64,
    /// Gaussian noise standard deviation (kWh).
    pub noise_std: f64,
    /// RNG seed.
    pub seed: u64,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            start: "2021-06-07T00:00:00Z".to_string(),
            interval_h: 1.0,
            intervals: 168,
            base_kwh: 1.2,
            amp_kwh: 0.8,
            phase_rad: 1.2,
            noise_std: 0.1,
            seed: 42,
        }
    }
}

/// Configuration error with a field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity_kwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl ScenarioConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "tou_shift", "no_export"];

    /// The baseline scenario: weekday-peak tariff, price-threshold strategy,
    /// retail net metering.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            battery: BatteryConfig::default(),
            pricing: PricingConfig::default(),
            price_threshold: PriceThresholdConfig::default(),
            tou_window: TouWindowConfig::default(),
            usage: UsageConfig::default(),
        }
    }

    /// The tou-shift preset: clock-driven charge/discharge windows instead
    /// of price thresholds.
    pub fn tou_shift() -> Self {
        Self {
            simulation: SimulationConfig {
                control: "tou_window".to_string(),
                ..SimulationConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// The no-export preset: surplus discharge earns nothing and the battery
    /// is kept to a narrower SOC window.
    pub fn no_export() -> Self {
        Self {
            simulation: SimulationConfig {
                net_metering: NetMetering::None,
                ..SimulationConfig::default()
            },
            battery: BatteryConfig {
                min_soc_fraction: 0.2,
                max_soc_fraction: 0.8,
                ..BatteryConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "tou_shift" => Ok(Self::tou_shift()),
            "no_export" => Ok(Self::no_export()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns the list of violations.
    ///
    /// An empty vector means the configuration is valid. Tariff partitioning
    /// (gaps and overlaps) is checked separately when the schedule is built.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if s.control != "price_threshold" && s.control != "tou_window" {
            errors.push(ConfigError {
                field: "simulation.control".into(),
                message: format!(
                    "must be \"price_threshold\" or \"tou_window\", got \"{}\"",
                    s.control
                ),
            });
        }
        if let Some(h) = s.first_interval_h {
            if !h.is_finite() || h <= 0.0 {
                errors.push(ConfigError {
                    field: "simulation.first_interval_h".into(),
                    message: "must be > 0".into(),
                });
            }
        }

        let b = &self.battery;
        if b.capacity_kwh <= 0.0 {
            errors.push(ConfigError {
                field: "battery.capacity_kwh".into(),
                message: "must be > 0".into(),
            });
        }
        if !(b.round_trip_efficiency > 0.0 && b.round_trip_efficiency <= 1.0) {
            errors.push(ConfigError {
                field: "battery.round_trip_efficiency".into(),
                message: "must be in (0.0, 1.0]".into(),
            });
        }
        if !(0.0..=1.0).contains(&b.min_soc_fraction)
            || !(0.0..=1.0).contains(&b.max_soc_fraction)
            || b.min_soc_fraction >= b.max_soc_fraction
        {
            errors.push(ConfigError {
                field: "battery.min_soc_fraction".into(),
                message: "SOC window must satisfy 0 <= min < max <= 1".into(),
            });
        }
        if !(b.min_soc_fraction..=b.max_soc_fraction).contains(&b.initial_soc_fraction) {
            errors.push(ConfigError {
                field: "battery.initial_soc_fraction".into(),
                message: "must lie within the SOC window".into(),
            });
        }
        if b.max_charge_kw < 0.0 || b.max_discharge_kw < 0.0 {
            errors.push(ConfigError {
                field: "battery.max_charge_kw".into(),
                message: "power limits must be >= 0".into(),
            });
        }

        let p = &self.pricing;
        if p.flat_price.is_some() && !p.rules.is_empty() {
            errors.push(ConfigError {
                field: "pricing".into(),
                message: "set either flat_price or rules, not both".into(),
            });
        }
        if p.flat_price.is_none() && p.rules.is_empty() {
            errors.push(ConfigError {
                field: "pricing".into(),
                message: "set flat_price or at least one rule".into(),
            });
        }
        if let Some(price) = p.flat_price {
            if !price.is_finite() || price < 0.0 {
                errors.push(ConfigError {
                    field: "pricing.flat_price".into(),
                    message: "must be finite and >= 0".into(),
                });
            }
        }
        for (i, rule) in p.rules.iter().enumerate() {
            if parse_days(&rule.days).is_none() {
                errors.push(ConfigError {
                    field: format!("pricing.rules[{i}].days"),
                    message: format!(
                        "must be \"all\", \"weekdays\", or \"weekends\", got \"{}\"",
                        rule.days
                    ),
                });
            }
            if rule.start_hour > 23 || rule.end_hour > 23 {
                errors.push(ConfigError {
                    field: format!("pricing.rules[{i}].start_hour"),
                    message: "hours must be in 0..=23".into(),
                });
            }
            if !rule.price_per_kwh.is_finite() || rule.price_per_kwh < 0.0 {
                errors.push(ConfigError {
                    field: format!("pricing.rules[{i}].price_per_kwh"),
                    message: "must be finite and >= 0".into(),
                });
            }
        }

        let t = &self.price_threshold;
        if t.charge_below >= t.discharge_above {
            errors.push(ConfigError {
                field: "price_threshold.charge_below".into(),
                message: "must be < price_threshold.discharge_above".into(),
            });
        }

        let w = &self.tou_window;
        for (field, hour) in [
            ("tou_window.charge_start_hour", w.charge_start_hour),
            ("tou_window.charge_end_hour", w.charge_end_hour),
            ("tou_window.discharge_start_hour", w.discharge_start_hour),
            ("tou_window.discharge_end_hour", w.discharge_end_hour),
        ] {
            if hour > 23 {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "hours must be in 0..=23".into(),
                });
            }
        }

        let u = &self.usage;
        if self.usage_start().is_err() {
            errors.push(ConfigError {
                field: "usage.start".into(),
                message: format!("\"{}\" is not an RFC 3339 timestamp", u.start),
            });
        }
        if !u.interval_h.is_finite() || u.interval_h <= 0.0 {
            errors.push(ConfigError {
                field: "usage.interval_h".into(),
                message: "must be > 0".into(),
            });
        }
        if u.intervals == 0 {
            errors.push(ConfigError {
                field: "usage.intervals".into(),
                message: "must be > 0".into(),
            });
        }

        errors
    }

    /// The battery spec described by this scenario.
    pub fn battery_spec(&self) -> BatterySpec {
        let b = &self.battery;
        BatterySpec {
            capacity_kwh: b.capacity_kwh,
            max_charge_kw: b.max_charge_kw,
            max_discharge_kw: b.max_discharge_kw,
            round_trip_efficiency: b.round_trip_efficiency,
            min_soc_fraction: b.min_soc_fraction,
            max_soc_fraction: b.max_soc_fraction,
        }
    }

    /// Initial state of charge in kWh.
    pub fn initial_soc_kwh(&self) -> f64 {
        self.battery.initial_soc_fraction * self.battery.capacity_kwh
    }

    /// Builds the validated tariff schedule. A flat price becomes a single
    /// all-day rule.
    ///
    /// # Errors
    ///
    /// Propagates [`SimError::ScheduleGap`] / [`SimError::ScheduleOverlap`]
    /// from schedule validation.
    pub fn schedule(&self) -> Result<TouSchedule, SimError> {
        let rules = if let Some(price) = self.pricing.flat_price {
            vec![RateRule {
                days: DayFilter::All,
                window: HourWindow { start: 0, end: 0 },
                price_per_kwh: price,
            }]
        } else {
            self.pricing
                .rules
                .iter()
                .map(|r| RateRule {
                    days: parse_days(&r.days).unwrap_or(DayFilter::All),
                    window: HourWindow {
                        start: r.start_hour,
                        end: r.end_hour,
                    },
                    price_per_kwh: r.price_per_kwh,
                })
                .collect()
        };
        TouSchedule::new(rules)
    }

    /// The strategy selected by `simulation.control`.
    pub fn control(&self) -> Control {
        if self.simulation.control == "tou_window" {
            let w = &self.tou_window;
            Control::TouWindow(TouWindowControl {
                charge_window: HourWindow {
                    start: w.charge_start_hour,
                    end: w.charge_end_hour,
                },
                discharge_window: HourWindow {
                    start: w.discharge_start_hour,
                    end: w.discharge_end_hour,
                },
            })
        } else {
            let t = &self.price_threshold;
            Control::PriceThreshold(PriceThresholdControl {
                charge_below: t.charge_below,
                discharge_above: t.discharge_above,
            })
        }
    }

    /// Run options selected by the `[simulation]` section.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            first_interval_h: self.simulation.first_interval_h,
            net_metering: self.simulation.net_metering,
        }
    }

    /// The synthetic usage profile described by `[usage]`.
    pub fn usage_profile(&self) -> UsageProfile {
        let u = &self.usage;
        UsageProfile {
            base_kwh: u.base_kwh,
            amp_kwh: u.amp_kwh,
            phase_rad: u.phase_rad,
            noise_std: u.noise_std,
            seed: u.seed,
        }
    }

    /// Parsed `usage.start` timestamp.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the field is not RFC 3339.
    pub fn usage_start(&self) -> Result<DateTime<Utc>, ConfigError> {
        DateTime::parse_from_rfc3339(&self.usage.start)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| ConfigError {
                field: "usage.start".to_string(),
                message: e.to_string(),
            })
    }
}

fn parse_days(s: &str) -> Option<DayFilter> {
    match s {
        "all" => Some(DayFilter::All),
        "weekdays" => Some(DayFilter::Weekdays),
        "weekends" => Some(DayFilter::Weekends),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_is_valid() {
        let errors = ScenarioConfig::baseline().validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn all_presets_load_and_validate() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name).unwrap();
            let errors = cfg.validate();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
            assert!(cfg.schedule().is_ok(), "preset \"{name}\" schedule");
        }
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let err = ScenarioConfig::from_preset("nonexistent").unwrap_err();
        assert!(err.message.contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
control = "tou_window"
net_metering = "none"

[battery]
capacity_kwh = 13.5
initial_soc_fraction = 0.4
round_trip_efficiency = 0.92
min_soc_fraction = 0.05
max_soc_fraction = 0.95

[pricing]
flat_price = 0.18

[tou_window]
charge_start_hour = 1
charge_end_hour = 5
discharge_start_hour = 16
discharge_end_hour = 20

[usage]
start = "2022-01-03T00:00:00Z"
interval_h = 0.5
intervals = 96
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.simulation.control, "tou_window");
        assert_eq!(cfg.simulation.net_metering, NetMetering::None);
        assert_eq!(cfg.battery.capacity_kwh, 13.5);
        assert_eq!(cfg.usage.intervals, 96);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn invalid_net_metering_fails_at_parse() {
        let toml = r#"
[simulation]
net_metering = "bogus"
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let toml = r#"
[simulation]
control = "price_threshold"
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml = r#"
[battery]
capacity_kwh = 20.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.battery.capacity_kwh, 20.0);
        assert_eq!(cfg.battery.max_charge_kw, 5.0);
        assert_eq!(cfg.simulation.control, "price_threshold");
    }

    #[test]
    fn validation_catches_bad_control_name() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.control = "bogus".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.control"));
    }

    #[test]
    fn validation_catches_inverted_soc_window() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.min_soc_fraction = 0.9;
        cfg.battery.max_soc_fraction = 0.1;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "battery.min_soc_fraction"));
    }

    #[test]
    fn validation_catches_initial_soc_outside_window() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.initial_soc_fraction = 0.95;
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "battery.initial_soc_fraction")
        );
    }

    #[test]
    fn validation_catches_flat_price_alongside_rules() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.pricing.flat_price = Some(0.15);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "pricing"));
    }

    #[test]
    fn validation_catches_degenerate_thresholds() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.price_threshold.charge_below = 0.30;
        cfg.price_threshold.discharge_above = 0.20;
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "price_threshold.charge_below")
        );
    }

    #[test]
    fn validation_catches_bad_usage_start() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.usage.start = "last tuesday".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "usage.start"));
    }

    #[test]
    fn flat_price_becomes_an_all_day_rule() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.pricing.rules.clear();
        cfg.pricing.flat_price = Some(0.18);
        let schedule = cfg.schedule().unwrap();
        assert_eq!(schedule.rules().len(), 1);
        assert_eq!(schedule.rules()[0].price_per_kwh, 0.18);
    }

    #[test]
    fn control_selection_follows_the_config() {
        assert!(matches!(
            ScenarioConfig::tou_shift().control(),
            Control::TouWindow(_)
        ));
        assert!(matches!(
            ScenarioConfig::baseline().control(),
            Control::PriceThreshold(_)
        ));
    }

    #[test]
    fn no_export_preset_forfeits_surplus() {
        let cfg = ScenarioConfig::no_export();
        assert_eq!(cfg.run_options().net_metering, NetMetering::None);
    }
}
