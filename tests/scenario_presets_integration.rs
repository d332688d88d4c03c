//! Preset scenarios run end to end, via the library and via the binary.

use std::process::Command;

use vbat_sim::config::ScenarioConfig;
use vbat_sim::engine::Engine;
use vbat_sim::summary::Summary;

fn run_preset(name: &str) -> Summary {
    let cfg = ScenarioConfig::from_preset(name).unwrap();
    let errors = cfg.validate();
    assert!(errors.is_empty(), "preset \"{name}\": {errors:?}");

    let schedule = cfg.schedule().unwrap();
    let usage = cfg
        .usage_profile()
        .generate(cfg.usage_start().unwrap(), cfg.usage.interval_h, cfg.usage.intervals)
        .unwrap();
    let control = cfg.control();
    let records = Engine::new(
        &usage,
        &schedule,
        cfg.battery_spec(),
        cfg.initial_soc_kwh(),
        &control,
        cfg.run_options(),
    )
    .run()
    .unwrap();
    assert_eq!(records.len(), cfg.usage.intervals);
    Summary::from_records(&records, cfg.battery.capacity_kwh).unwrap()
}

#[test]
fn every_preset_runs_end_to_end() {
    for name in ScenarioConfig::PRESETS {
        let summary = run_preset(name);
        assert_eq!(summary.interval_count, 168, "preset \"{name}\"");
        assert!(summary.cost_without > 0.0, "preset \"{name}\"");
    }
}

#[test]
fn presets_produce_distinct_outcomes() {
    let baseline = run_preset("baseline");
    let tou_shift = run_preset("tou_shift");
    let no_export = run_preset("no_export");

    // The clock-window strategy dispatches on schedule, not on price, so its
    // battery throughput differs from the threshold baseline.
    assert_ne!(baseline.discharged_kwh, tou_shift.discharged_kwh);
    // The no-export preset narrows the SOC window, so less energy moves.
    assert!(no_export.discharged_kwh <= baseline.discharged_kwh);
}

#[test]
fn preset_runs_are_reproducible() {
    let a = run_preset("baseline");
    let b = run_preset("baseline");
    assert_eq!(a, b);
}

#[test]
fn cli_runs_the_baseline_preset_and_reports_savings() {
    let output = Command::new(env!("CARGO_BIN_EXE_vbat-sim"))
        .args(["--preset", "baseline", "--quiet"])
        .output()
        .expect("vbat-sim process should run");

    assert!(
        output.status.success(),
        "baseline preset failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    assert!(
        stdout.contains("Savings:"),
        "summary line missing from output: {stdout}"
    );
}

#[test]
fn cli_rejects_an_unknown_preset() {
    let output = Command::new(env!("CARGO_BIN_EXE_vbat-sim"))
        .args(["--preset", "nonexistent"])
        .output()
        .expect("vbat-sim process should run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown preset"), "stderr: {stderr}");
}
