//! Generates the deterministic synthetic telemetry fixture the CSV source
//! reads: two racks, 14 days at 15-minute cadence, with a known degradation
//! acceleration, a temperature spike, and a telemetry gap.

use anyhow::Result;
use clap::Parser;

use battery_brain::synthetic;

#[derive(Parser, Debug)]
#[command(name = "gen_telemetry", about = "Generate synthetic battery telemetry fixtures")]
struct Args {
    /// Output directory for assets.json, telemetry.csv and events.csv
    #[arg(long, default_value = "data/generated/v0")]
    out_dir: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let dataset = synthetic::generate();
    dataset.write_to(&args.out_dir)?;

    println!("Generated under {}:", args.out_dir);
    println!("- assets.json");
    println!("- telemetry.csv ({} rows)", dataset.telemetry.len());
    println!("- events.csv ({} rows)", dataset.events.len());
    Ok(())
}
