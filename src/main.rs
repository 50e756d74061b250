//! battery-brain CLI
//!
//! Routes one question about battery asset telemetry through the reasoning
//! pipeline and prints the full response (answer, confidence, evidence) as
//! JSON.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use battery_brain::adapters::{parse_iso, CsvTelemetrySource, TimeWindow};
use battery_brain::brain::{route, supported_intents};

#[derive(Parser, Debug)]
#[command(name = "battery-brain", about = "Battery asset decision-support pipeline")]
struct Args {
    /// Natural language question
    question: String,

    /// One or more asset IDs
    #[arg(long = "assets", required = true, num_args = 1..)]
    assets: Vec<String>,

    /// Force an intent, or let the router infer one
    #[arg(long, default_value = "auto")]
    intent: String,

    /// Window start (ISO-8601; naive timestamps assumed UTC)
    #[arg(long, default_value = "2025-12-01T00:00:00+00:00")]
    start: String,

    /// Window end
    #[arg(long, default_value = "2025-12-15T00:00:00+00:00")]
    end: String,

    /// Boundary splitting the window into pre/post halves
    #[arg(long, default_value = "2025-12-08T00:00:00+00:00")]
    boundary: String,

    /// Requesting role, echoed into the evidence bundle
    #[arg(long, default_value = "asset_manager")]
    role: String,

    /// Directory holding assets.json, telemetry.csv and events.csv
    #[arg(long, default_value = "data/generated/v0")]
    data_dir: String,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let args = Args::parse();

    let window = TimeWindow::from_iso(&args.start, &args.end)
        .context("invalid --start/--end window")?;
    let boundary = parse_iso(&args.boundary).context("invalid --boundary timestamp")?;

    let source = CsvTelemetrySource::open(&args.data_dir).with_context(|| {
        format!(
            "failed to load telemetry from {} (run gen_telemetry to create a fixture)",
            args.data_dir
        )
    })?;

    if args.intent != "auto" && !supported_intents().contains(&args.intent.as_str()) {
        // The router will answer with the error-shaped response; no need to
        // abort here. Logged for operator visibility only.
        tracing::warn!(intent = args.intent.as_str(), "unknown intent requested");
    }

    let response = route(
        &source,
        &args.question,
        &args.assets,
        &window,
        boundary,
        &args.intent,
        &args.role,
    );

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
