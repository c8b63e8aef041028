//! `ukf-fusion` CLI: scenario runs, log replay, dataset processing, Monte-Carlo sweeps.

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use sim::replay::{load_log, save_log, MeasurementRecord};
use sim::run::{run_filter, RunReport};
use sim::scenarios::{Scenario, ScenarioKind};
use std::path::{Path, PathBuf};
use tracing::info;
use ukf_core::UkfConfig;

#[derive(Parser)]
#[command(name = "ukf-fusion", about = "Lidar/radar fusion with a CTRV unscented Kalman filter")]
struct Cli {
    /// Filter configuration (JSON); missing fields take their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a named scenario, run the filter and output metrics.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Output report to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the measurement log
        #[arg(long)]
        save_log: Option<PathBuf>,
        /// Include per-step estimates in the report
        #[arg(long)]
        estimates: bool,
    },
    /// Run the filter over a previously recorded measurement log.
    Replay {
        /// Path to log JSON file
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        estimates: bool,
    },
    /// Run the filter over a text dataset (`L ...` / `R ...` lines).
    Process {
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        estimates: bool,
    },
    /// Run a scenario over many seeds in parallel and aggregate metrics.
    Sweep {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Number of seeds, starting at `first_seed`
        #[arg(long, default_value_t = 100)]
        runs: u64,
        #[arg(long, default_value_t = 0)]
        first_seed: u64,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Report written for a single record stream.
#[derive(Serialize)]
struct StreamReport<'a> {
    source: String,
    seed: Option<u64>,
    elapsed_s: f64,
    rmse: [f64; 4],
    nis_lidar_mean: f64,
    nis_radar_mean: f64,
    nis_lidar_above_95: f64,
    nis_radar_above_95: f64,
    run: &'a RunReport,
}

impl<'a> StreamReport<'a> {
    fn new(source: String, seed: Option<u64>, elapsed_s: f64, run: &'a RunReport) -> Self {
        Self {
            source,
            seed,
            elapsed_s,
            rmse: run.rmse.rmse(),
            nis_lidar_mean: run.nis.lidar.mean(),
            nis_radar_mean: run.nis.radar.mean(),
            nis_lidar_above_95: run.nis.lidar.fraction_above_95(),
            nis_radar_above_95: run.nis.radar.fraction_above_95(),
            run,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::RunScenario {
            scenario,
            seed,
            output,
            save_log: log_path,
            estimates,
        } => {
            run_scenario(&config, scenario, seed, output.as_deref(), log_path.as_deref(), estimates)?;
        }
        Commands::Replay {
            input,
            output,
            estimates,
        } => {
            let log = load_log(&input)?;
            println!("Replaying '{}' ({} records)...", log.scenario_name, log.records.len());
            run_records(&config, log.scenario_name, Some(log.seed), &log.records, output.as_deref(), estimates)?;
        }
        Commands::Process {
            input,
            output,
            estimates,
        } => {
            let records = sim::load_dataset(&input)?;
            println!("Processing {} ({} records)...", input.display(), records.len());
            let source = input.display().to_string();
            run_records(&config, source, None, &records, output.as_deref(), estimates)?;
        }
        Commands::Sweep {
            scenario,
            runs,
            first_seed,
            output,
        } => {
            sweep(&config, scenario, first_seed, runs, output.as_deref())?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<UkfConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => UkfConfig::default(),
    };
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &UkfConfig) -> Result<()> {
    let stds = [
        ("std_a", config.process_noise.std_a),
        ("std_yawdd", config.process_noise.std_yawdd),
        ("std_px", config.lidar.std_px),
        ("std_py", config.lidar.std_py),
        ("std_rho", config.radar.std_rho),
        ("std_phi", config.radar.std_phi),
        ("std_rho_dot", config.radar.std_rho_dot),
    ];
    for (name, value) in stds {
        ensure!(value.is_finite() && value > 0.0, "{name} must be positive, got {value}");
    }
    ensure!(config.use_lidar || config.use_radar, "at least one sensor must be enabled");
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Report saved to {}", path.display());
    Ok(())
}

fn print_summary(report: &RunReport, elapsed_s: f64) {
    let rmse = report.rmse.rmse();
    println!(
        "Done: {} records, {} updates, {} skipped, {} resets, elapsed={:.3}s",
        report.records, report.updates, report.skipped, report.resets, elapsed_s
    );
    println!(
        "RMSE px={:.4} py={:.4} vx={:.4} vy={:.4}",
        rmse[0], rmse[1], rmse[2], rmse[3]
    );
    println!(
        "NIS lidar mean={:.3} (>95%: {:.1}%), radar mean={:.3} (>95%: {:.1}%)",
        report.nis.lidar.mean(),
        100.0 * report.nis.lidar.fraction_above_95(),
        report.nis.radar.mean(),
        100.0 * report.nis.radar.fraction_above_95(),
    );
}

fn run_records(
    config: &UkfConfig,
    source: String,
    seed: Option<u64>,
    records: &[MeasurementRecord],
    output_path: Option<&Path>,
    estimates: bool,
) -> Result<()> {
    let start = std::time::Instant::now();
    let report = run_filter(config, records, estimates);
    let elapsed = start.elapsed().as_secs_f64();
    print_summary(&report, elapsed);

    if let Some(opath) = output_path {
        write_json(opath, &StreamReport::new(source, seed, elapsed, &report))?;
    }
    Ok(())
}

fn run_scenario(
    config: &UkfConfig,
    kind: ScenarioKind,
    seed: u64,
    output_path: Option<&Path>,
    log_path: Option<&Path>,
    estimates: bool,
) -> Result<()> {
    let scenario = Scenario::build(kind, seed);
    println!(
        "Running scenario '{}' (seed={}, duration={:.0}s)...",
        scenario.name, seed, scenario.duration
    );
    let log = scenario.simulate();

    if let Some(lpath) = log_path {
        save_log(&log, lpath)?;
        println!("Log saved to {}", lpath.display());
    }

    run_records(config, scenario.name, Some(seed), &log.records, output_path, estimates)
}

/// Aggregate of a sweep over seeds.
#[derive(Serialize)]
struct SweepReport {
    scenario: ScenarioKind,
    runs: u64,
    first_seed: u64,
    elapsed_s: f64,
    rmse: [f64; 4],
    /// Worst single-run RMSE per component
    worst_rmse: [f64; 4],
    nis_lidar_mean: f64,
    nis_radar_mean: f64,
    nis_lidar_above_95: f64,
    nis_radar_above_95: f64,
    total: RunReport,
}

fn sweep(
    config: &UkfConfig,
    kind: ScenarioKind,
    first_seed: u64,
    runs: u64,
    output_path: Option<&Path>,
) -> Result<()> {
    ensure!(runs > 0, "sweep needs at least one run");
    info!(?kind, runs, first_seed, threads = rayon::current_num_threads(), "starting sweep");

    let start = std::time::Instant::now();
    let reports: Vec<RunReport> = (first_seed..first_seed + runs)
        .into_par_iter()
        .map(|seed| {
            let log = Scenario::build(kind, seed).simulate();
            run_filter(config, &log.records, false)
        })
        .collect();
    let elapsed = start.elapsed().as_secs_f64();

    let mut total = RunReport::default();
    let mut worst_rmse = [0.0_f64; 4];
    for report in &reports {
        total.merge(report);
        for (worst, r) in worst_rmse.iter_mut().zip(report.rmse.rmse()) {
            *worst = worst.max(r);
        }
    }
    print_summary(&total, elapsed);
    println!(
        "Worst run RMSE px={:.4} py={:.4} vx={:.4} vy={:.4}",
        worst_rmse[0], worst_rmse[1], worst_rmse[2], worst_rmse[3]
    );

    if let Some(opath) = output_path {
        let sweep_report = SweepReport {
            scenario: kind,
            runs,
            first_seed,
            elapsed_s: elapsed,
            rmse: total.rmse.rmse(),
            worst_rmse,
            nis_lidar_mean: total.nis.lidar.mean(),
            nis_radar_mean: total.nis.radar.mean(),
            nis_lidar_above_95: total.nis.lidar.fraction_above_95(),
            nis_radar_above_95: total.nis.radar.fraction_above_95(),
            total,
        };
        write_json(opath, &sweep_report)?;
    }
    Ok(())
}
