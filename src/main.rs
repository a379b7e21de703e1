//! Startup Valuation CLI
//!
//! Projects a single scenario file and prints the headline statements and valuation

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use startup_valuation::dashboard;
use startup_valuation::io::{load_scenario, write_monthly_csv, write_result_json};
use startup_valuation::{ProjectionConfig, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "startup_valuation")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario JSON file
    #[arg(short, long)]
    scenario: PathBuf,

    /// Write the monthly series as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the full run (statements and valuation) as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Balance-sheet tolerance relative to total assets
    #[arg(long, default_value_t = 1e-6)]
    tolerance: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let scenario = load_scenario(&cli.scenario)
        .with_context(|| format!("loading scenario {}", cli.scenario.display()))?;

    let runner = ScenarioRunner::with_config(ProjectionConfig {
        balance_tolerance: cli.tolerance,
    });
    let result = runner
        .run(&scenario)
        .with_context(|| format!("running scenario '{}'", scenario.name))?;

    println!("Scenario: {} ({} months from {})", scenario.name, scenario.horizon_months, scenario.start_date);
    println!("{}", "=".repeat(96));
    println!(
        "{:>4} {:>6} {:>14} {:>14} {:>14} {:>14} {:>14} {:>10}",
        "FY", "Months", "Net revenue", "EBITDA", "Net income", "FCFF", "Ending cash", "Headcount"
    );
    println!("{}", "-".repeat(96));
    for year in result.annual() {
        println!(
            "{:>4} {:>6} {:>14.0} {:>14.0} {:>14.0} {:>14.0} {:>14.0} {:>10.1}",
            year.fiscal_year,
            year.months,
            year.income_statement.net_revenue,
            year.income_statement.ebitda,
            year.income_statement.net_income,
            year.free_cash_flow.fcff,
            year.balance_sheet.cash,
            year.ending_headcount,
        );
    }

    let summary = result.projection.summary();
    println!();
    println!("Ending ARR:        ${:.0}", summary.ending_arr);
    println!("Equity raised:     ${:.0}", summary.total_equity_raised);
    println!("Minimum cash:      ${:.0} (month {})", summary.min_cash, summary.min_cash_month);

    let economics = dashboard::unit_economics(&result);
    println!("Gross margin:      {:.1}%", economics.gross_margin * 100.0);
    if let Some(runway) = dashboard::cash_trend(&result).last().and_then(|p| p.runway_months) {
        println!("Runway:            {:.1} months", runway);
    }

    let lines = dashboard::valuation_summary(&result);
    if !lines.is_empty() {
        println!();
        println!("{:<12} {:<32} {:>16} {:>16}", "Method", "Basis", "EV", "Equity");
        println!("{}", "-".repeat(79));
        for line in &lines {
            let ev = line.enterprise_value.map(|v| format!("{:.0}", v)).unwrap_or_default();
            println!("{:<12} {:<32} {:>16} {:>16.0}", line.method, line.label, ev, line.equity_value);
        }
    }

    if let Some(path) = &cli.csv {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write_monthly_csv(BufWriter::new(file), result.periods())?;
        println!("\nMonthly series written to {}", path.display());
    }

    if let Some(path) = &cli.json {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write_result_json(BufWriter::new(file), &result)?;
        println!("Full results written to {}", path.display());
    }

    Ok(())
}
