//! Run many scenario files in parallel
//!
//! Prints one summary line per scenario; failures are reported and do not stop
//! the other runs.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::warn;
use startup_valuation::io::{load_scenario, write_monthly_csv};
use startup_valuation::{ProjectionConfig, Scenario, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "run_batch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario JSON files
    #[arg(required = true)]
    scenarios: Vec<PathBuf>,

    /// Worker threads (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Directory for one monthly CSV per scenario
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Balance-sheet tolerance relative to total assets
    #[arg(long, default_value_t = 1e-6)]
    tolerance: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring worker threads")?;
    }

    let start = Instant::now();
    let mut loaded: Vec<(PathBuf, Scenario)> = Vec::with_capacity(cli.scenarios.len());
    let mut failures = 0usize;
    for path in &cli.scenarios {
        match load_scenario(path) {
            Ok(scenario) => loaded.push((path.clone(), scenario)),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                eprintln!("{}: {}", path.display(), e);
                failures += 1;
            }
        }
    }
    println!("Loaded {} scenarios in {:?}", loaded.len(), start.elapsed());

    let runner = ScenarioRunner::with_config(ProjectionConfig {
        balance_tolerance: cli.tolerance,
    });
    let scenarios: Vec<Scenario> = loaded.iter().map(|(_, s)| s.clone()).collect();
    let run_start = Instant::now();
    let results = runner.run_batch(&scenarios);
    println!("Runs complete in {:?}\n", run_start.elapsed());

    if let Some(dir) = &cli.out_dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    println!(
        "{:<24} {:>14} {:>14} {:>14} {:>14}",
        "Scenario", "Ending ARR", "Ending cash", "Equity raised", "Total FCFF"
    );
    println!("{}", "-".repeat(84));
    for ((path, scenario), result) in loaded.iter().zip(&results) {
        match result {
            Ok(result) => {
                let summary = result.projection.summary();
                println!(
                    "{:<24} {:>14.0} {:>14.0} {:>14.0} {:>14.0}",
                    scenario.name, summary.ending_arr, summary.ending_cash, summary.total_equity_raised, summary.total_fcff
                );
                if let Some(dir) = &cli.out_dir {
                    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
                    let out = dir.join(format!("{}_monthly.csv", stem));
                    let file = File::create(&out).with_context(|| format!("creating {}", out.display()))?;
                    write_monthly_csv(BufWriter::new(file), result.periods())?;
                }
            }
            Err(e) => {
                println!("{:<24} FAILED: {}", scenario.name, e);
                failures += 1;
            }
        }
    }

    println!("\nTotal time: {:?}", start.elapsed());
    if failures > 0 {
        bail!("{} of {} scenarios failed", failures, cli.scenarios.len());
    }
    Ok(())
}
