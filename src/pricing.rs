//! Time-of-use pricing: rate rules, partition validation, and timestamp
//! resolution.

use std::fmt;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Maps a timestamp to the applicable price per kWh.
///
/// Implementations are pure functions of their configuration and the
/// timestamp; no internal mutable state.
pub trait PricePolicy {
    /// Price per kWh in effect at `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ScheduleGap`] if no rule covers the timestamp.
    /// Construction-time validation makes this unreachable for a
    /// [`TouSchedule`].
    fn price_at(&self, timestamp: DateTime<Utc>) -> Result<f64, SimError>;
}

/// Weekday/weekend classification of a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    Weekday,
    Weekend,
}

impl DayKind {
    /// Classifies the calendar day of `timestamp`.
    pub fn of(timestamp: DateTime<Utc>) -> Self {
        match timestamp.weekday() {
            Weekday::Sat | Weekday::Sun => Self::Weekend,
            _ => Self::Weekday,
        }
    }
}

impl fmt::Display for DayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekday => write!(f, "weekday"),
            Self::Weekend => write!(f, "weekend"),
        }
    }
}

/// Which calendar days a rate rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayFilter {
    All,
    Weekdays,
    Weekends,
}

impl DayFilter {
    /// Whether the filter covers days of the given kind.
    pub fn matches(self, day_kind: DayKind) -> bool {
        match self {
            Self::All => true,
            Self::Weekdays => day_kind == DayKind::Weekday,
            Self::Weekends => day_kind == DayKind::Weekend,
        }
    }
}

/// Half-open hour-of-day window `[start, end)`.
///
/// Wraps past midnight when `start > end`; `start == end` covers the whole
/// day. Hours are whole numbers in `0..=23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start: u32,
    pub end: u32,
}

impl HourWindow {
    /// Whether the window covers the given hour of day.
    pub fn contains(self, hour: u32) -> bool {
        if self.start == self.end {
            true
        } else if self.start < self.end {
            hour >= self.start && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }
}

/// One time-of-use rate rule: a price over a day filter and hour window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRule {
    pub days: DayFilter,
    pub window: HourWindow,
    pub price_per_kwh: f64,
}

/// Validated time-of-use schedule.
///
/// Construction proves that the rules partition every (day kind, hour) cell
/// into exactly one price, so gaps cannot surface mid-run.
#[derive(Debug, Clone, PartialEq)]
pub struct TouSchedule {
    rules: Vec<RateRule>,
}

impl TouSchedule {
    /// Validates the rule set and builds a schedule.
    ///
    /// # Errors
    ///
    /// - [`SimError::MalformedInput`] for an out-of-range hour or price
    /// - [`SimError::ScheduleGap`] if some (day kind, hour) cell has no rule
    /// - [`SimError::ScheduleOverlap`] if a cell is claimed more than once
    pub fn new(rules: Vec<RateRule>) -> Result<Self, SimError> {
        for (index, rule) in rules.iter().enumerate() {
            if rule.window.start > 23 || rule.window.end > 23 {
                return Err(SimError::MalformedInput {
                    index,
                    reason: format!(
                        "hour window {}..{} outside 0..=23",
                        rule.window.start, rule.window.end
                    ),
                });
            }
            if !rule.price_per_kwh.is_finite() || rule.price_per_kwh < 0.0 {
                return Err(SimError::MalformedInput {
                    index,
                    reason: format!("price {} is out of range", rule.price_per_kwh),
                });
            }
        }
        for day_kind in [DayKind::Weekday, DayKind::Weekend] {
            for hour in 0..24 {
                let claims = rules
                    .iter()
                    .filter(|r| r.days.matches(day_kind) && r.window.contains(hour))
                    .count();
                match claims {
                    0 => return Err(SimError::ScheduleGap { day_kind, hour }),
                    1 => {}
                    _ => return Err(SimError::ScheduleOverlap { day_kind, hour }),
                }
            }
        }
        Ok(Self { rules })
    }

    /// The validated rules.
    pub fn rules(&self) -> &[RateRule] {
        &self.rules
    }
}

impl PricePolicy for TouSchedule {
    fn price_at(&self, timestamp: DateTime<Utc>) -> Result<f64, SimError> {
        let day_kind = DayKind::of(timestamp);
        let hour = timestamp.hour();
        self.rules
            .iter()
            .find(|r| r.days.matches(day_kind) && r.window.contains(hour))
            .map(|r| r.price_per_kwh)
            .ok_or(SimError::ScheduleGap { day_kind, hour })
    }
}

/// Single-rate tariff: the same price at every instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatRate(pub f64);

impl PricePolicy for FlatRate {
    fn price_at(&self, _timestamp: DateTime<Utc>) -> Result<f64, SimError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rule(days: DayFilter, start: u32, end: u32, price: f64) -> RateRule {
        RateRule {
            days,
            window: HourWindow { start, end },
            price_per_kwh: price,
        }
    }

    #[test]
    fn window_contains_plain_range() {
        let w = HourWindow { start: 8, end: 20 };
        assert!(w.contains(8));
        assert!(w.contains(19));
        assert!(!w.contains(20));
        assert!(!w.contains(7));
    }

    #[test]
    fn window_wraps_past_midnight() {
        let w = HourWindow { start: 20, end: 8 };
        assert!(w.contains(23));
        assert!(w.contains(0));
        assert!(w.contains(7));
        assert!(!w.contains(8));
        assert!(!w.contains(19));
    }

    #[test]
    fn equal_bounds_cover_the_whole_day() {
        let w = HourWindow { start: 0, end: 0 };
        for hour in 0..24 {
            assert!(w.contains(hour));
        }
    }

    #[test]
    fn weekday_peak_schedule_resolves() {
        let schedule = TouSchedule::new(vec![
            rule(DayFilter::Weekdays, 12, 20, 0.24),
            rule(DayFilter::Weekdays, 20, 12, 0.11),
            rule(DayFilter::Weekends, 0, 0, 0.11),
        ])
        .unwrap();

        // 2021-06-07 is a Monday.
        let monday_peak = Utc.with_ymd_and_hms(2021, 6, 7, 15, 0, 0).unwrap();
        let monday_night = Utc.with_ymd_and_hms(2021, 6, 7, 3, 0, 0).unwrap();
        let saturday_noon = Utc.with_ymd_and_hms(2021, 6, 12, 12, 0, 0).unwrap();
        assert_eq!(schedule.price_at(monday_peak).unwrap(), 0.24);
        assert_eq!(schedule.price_at(monday_night).unwrap(), 0.11);
        assert_eq!(schedule.price_at(saturday_noon).unwrap(), 0.11);
    }

    #[test]
    fn gap_is_detected_at_construction() {
        let err = TouSchedule::new(vec![
            rule(DayFilter::Weekdays, 0, 0, 0.20),
            // weekends uncovered
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            SimError::ScheduleGap {
                day_kind: DayKind::Weekend,
                ..
            }
        ));
    }

    #[test]
    fn overlap_is_detected_at_construction() {
        let err = TouSchedule::new(vec![
            rule(DayFilter::All, 0, 12, 0.10),
            rule(DayFilter::All, 11, 0, 0.30),
        ])
        .unwrap_err();
        assert!(matches!(err, SimError::ScheduleOverlap { hour: 11, .. }));
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = TouSchedule::new(vec![rule(DayFilter::All, 0, 0, -0.10)]).unwrap_err();
        assert!(matches!(err, SimError::MalformedInput { index: 0, .. }));
    }

    #[test]
    fn out_of_range_hour_is_rejected() {
        let err = TouSchedule::new(vec![rule(DayFilter::All, 0, 24, 0.10)]).unwrap_err();
        assert!(matches!(err, SimError::MalformedInput { index: 0, .. }));
    }

    #[test]
    fn flat_rate_ignores_the_timestamp() {
        let flat = FlatRate(0.17);
        let ts = Utc.with_ymd_and_hms(2021, 6, 7, 4, 30, 0).unwrap();
        assert_eq!(flat.price_at(ts).unwrap(), 0.17);
    }
}
