//! Simulator entry point — CLI wiring and config-driven engine construction.

use std::path::Path;
use std::process;

use vbat_sim::config::ScenarioConfig;
use vbat_sim::engine::Engine;
use vbat_sim::io::export::export_csv;
use vbat_sim::io::import::read_usage_csv;
use vbat_sim::series::TimeSeries;
use vbat_sim::summary::Summary;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    usage_path: Option<String>,
    records_out: Option<String>,
    quiet: bool,
}

fn print_help() {
    eprintln!("vbat-sim — retrospective battery-savings simulator");
    eprintln!();
    eprintln!("Usage: vbat-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>      Load scenario from TOML config file");
    eprintln!("  --preset <name>        Use a built-in preset (baseline)");
    eprintln!("  --usage <path>         Read meter data from CSV instead of the");
    eprintln!("                         synthetic profile (timestamp,usage_kwh)");
    eprintln!("  --records-out <path>   Export per-interval records to CSV");
    eprintln!("  --quiet                Print only the summary, not the records");
    eprintln!("  --help                 Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        usage_path: None,
        records_out: None,
        quiet: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--usage" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --usage requires a path argument");
                    process::exit(1);
                }
                cli.usage_path = Some(args[i].clone());
            }
            "--records-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --records-out requires a path argument");
                    process::exit(1);
                }
                cli.records_out = Some(args[i].clone());
            }
            "--quiet" => {
                cli.quiet = true;
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Loads the usage series: the CSV if one was given, otherwise the
/// scenario's synthetic profile.
fn load_usage(cli: &CliArgs, scenario: &ScenarioConfig) -> TimeSeries {
    if let Some(ref path) = cli.usage_path {
        match read_usage_csv(Path::new(path)) {
            Ok(series) => series,
            Err(e) => {
                eprintln!("error: failed to read \"{path}\": {e}");
                process::exit(1);
            }
        }
    } else {
        let start = match scenario.usage_start() {
            Ok(ts) => ts,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        };
        let u = &scenario.usage;
        match scenario.usage_profile().generate(start, u.interval_h, u.intervals) {
            Ok(series) => series,
            Err(e) => {
                eprintln!("error: failed to generate usage profile: {e}");
                process::exit(1);
            }
        }
    }
}

fn main() {
    let cli = parse_args();

    // Load config: --scenario takes priority, then --preset, then baseline.
    let scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let schedule = match scenario.schedule() {
        Ok(schedule) => schedule,
        Err(e) => {
            eprintln!("error: invalid tariff: {e}");
            process::exit(1);
        }
    };

    let usage = load_usage(&cli, &scenario);
    let control = scenario.control();

    let engine = Engine::new(
        &usage,
        &schedule,
        scenario.battery_spec(),
        scenario.initial_soc_kwh(),
        &control,
        scenario.run_options(),
    );
    let records = match engine.run() {
        Ok(records) => records,
        Err(e) => {
            eprintln!("error: simulation failed: {e}");
            process::exit(1);
        }
    };

    if !cli.quiet {
        for r in &records {
            println!("{r}");
        }
        println!();
    }

    match Summary::from_records(&records, scenario.battery.capacity_kwh) {
        Ok(summary) => println!("{summary}"),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }

    if let Some(ref path) = cli.records_out {
        if let Err(e) = export_csv(&records, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Records written to {path}");
    }
}
