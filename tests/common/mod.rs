//! Shared test fixtures for integration tests.

use chrono::{DateTime, TimeZone, Utc};
use vbat_sim::battery::BatterySpec;
use vbat_sim::pricing::{DayFilter, HourWindow, RateRule, TouSchedule};
use vbat_sim::series::TimeSeries;

/// Monday 2021-06-07 00:00 UTC.
pub fn monday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 6, 7, 0, 0, 0).unwrap()
}

/// Default battery (10 kWh, 5 kW each way, 90% round-trip, SOC 10-90%).
pub fn default_spec() -> BatterySpec {
    BatterySpec {
        capacity_kwh: 10.0,
        max_charge_kw: 5.0,
        max_discharge_kw: 5.0,
        round_trip_efficiency: 0.9,
        min_soc_fraction: 0.1,
        max_soc_fraction: 0.9,
    }
}

/// Hourly usage series starting Monday morning.
pub fn hourly_usage(values: &[f64]) -> TimeSeries {
    TimeSeries::hourly(monday(), values).unwrap()
}

/// All-day rate rule over an hour window.
pub fn all_days(start: u32, end: u32, price: f64) -> RateRule {
    RateRule {
        days: DayFilter::All,
        window: HourWindow { start, end },
        price_per_kwh: price,
    }
}

/// Cheap-then-expensive morning tariff: 0.10 for hours 0-2, 0.30 for 2-4,
/// 0.15 for the rest of the day.
pub fn morning_arbitrage_schedule() -> TouSchedule {
    TouSchedule::new(vec![
        all_days(0, 2, 0.10),
        all_days(2, 4, 0.30),
        all_days(4, 0, 0.15),
    ])
    .unwrap()
}

/// Weekday-peak tariff: 0.24 on weekday afternoons, 0.11 everywhere else.
pub fn weekday_peak_schedule() -> TouSchedule {
    TouSchedule::new(vec![
        RateRule {
            days: DayFilter::Weekdays,
            window: HourWindow { start: 12, end: 20 },
            price_per_kwh: 0.24,
        },
        RateRule {
            days: DayFilter::Weekdays,
            window: HourWindow { start: 20, end: 12 },
            price_per_kwh: 0.11,
        },
        RateRule {
            days: DayFilter::Weekends,
            window: HourWindow { start: 0, end: 0 },
            price_per_kwh: 0.11,
        },
    ])
    .unwrap()
}
