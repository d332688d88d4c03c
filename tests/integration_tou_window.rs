//! End-to-end runs with the clock-window strategy over a synthetic week.

mod common;

use common::{default_spec, monday, weekday_peak_schedule};
use vbat_sim::control::TouWindowControl;
use vbat_sim::engine::{Engine, NetMetering, RunOptions};
use vbat_sim::pricing::HourWindow;
use vbat_sim::profile::UsageProfile;
use vbat_sim::series::TimeSeries;
use vbat_sim::summary::Summary;

fn week_of_usage() -> TimeSeries {
    let profile = UsageProfile {
        base_kwh: 1.2,
        amp_kwh: 0.8,
        phase_rad: 1.2,
        noise_std: 0.1,
        seed: 42,
    };
    profile.generate(monday(), 1.0, 168).unwrap()
}

fn overnight_to_evening() -> TouWindowControl {
    TouWindowControl {
        charge_window: HourWindow { start: 0, end: 6 },
        discharge_window: HourWindow { start: 17, end: 21 },
    }
}

#[test]
fn overnight_charging_into_the_evening_peak_saves_over_a_week() {
    let usage = week_of_usage();
    let schedule = weekday_peak_schedule();
    let control = overnight_to_evening();
    let records = Engine::new(
        &usage,
        &schedule,
        default_spec(),
        5.0,
        &control,
        RunOptions::default(),
    )
    .run()
    .unwrap();

    assert_eq!(records.len(), 168);
    let summary = Summary::from_records(&records, 10.0).unwrap();
    assert!(
        summary.savings > 0.0,
        "buying at 0.11 and shifting into the 0.24 peak should pay: {:.4}",
        summary.savings
    );
    assert!(
        summary.cycle_count > 0.5,
        "a week of daily shifting should cycle the battery: {:.3}",
        summary.cycle_count
    );
    for r in &records {
        assert!((1.0..=9.0).contains(&r.soc_kwh), "SOC {:.3} out of window", r.soc_kwh);
    }
}

#[test]
fn the_strategy_acts_only_inside_its_windows() {
    let usage = week_of_usage();
    let schedule = weekday_peak_schedule();
    let control = overnight_to_evening();
    let records = Engine::new(
        &usage,
        &schedule,
        default_spec(),
        5.0,
        &control,
        RunOptions::default(),
    )
    .run()
    .unwrap();

    use chrono::Timelike;
    for r in &records {
        let hour = r.timestamp.hour();
        if !(hour < 6 || (17..21).contains(&hour)) {
            assert_eq!(
                r.requested_power_kw, 0.0,
                "idle expected at hour {hour}, requested {}",
                r.requested_power_kw
            );
        }
    }
}

#[test]
fn retail_crediting_dominates_forfeiture() {
    let usage = week_of_usage();
    let schedule = weekday_peak_schedule();
    let control = overnight_to_evening();
    let run = |net_metering| {
        let records = Engine::new(
            &usage,
            &schedule,
            default_spec(),
            5.0,
            &control,
            RunOptions {
                net_metering,
                ..RunOptions::default()
            },
        )
        .run()
        .unwrap();
        Summary::from_records(&records, 10.0).unwrap()
    };

    let retail = run(NetMetering::Retail);
    let none = run(NetMetering::None);
    assert!(
        retail.savings >= none.savings,
        "retail={:.4} none={:.4}",
        retail.savings,
        none.savings
    );
    // Physics is billing-independent.
    assert_eq!(retail.charged_kwh, none.charged_kwh);
    assert_eq!(retail.discharged_kwh, none.discharged_kwh);
}
