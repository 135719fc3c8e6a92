use std::{fs, path::PathBuf, time::Duration};

use abscope::{analyze, error_payload, AnalysisConfig, CaptureBatch, CaptureFrame};
use anyhow::Result;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "abscope",
    about = "Detect A/B test variations across a sequence of page captures"
)]
struct Cli {
    /// Capture files in sequence order (PNG or JPEG)
    #[arg(required = true)]
    captures: Vec<PathBuf>,

    /// Minimum pixel-difference ratio flagged as variation (0.05 = 5%)
    #[arg(long, default_value_t = 0.05)]
    threshold: f64,

    /// Inter-capture delay the captures were taken with, echoed in the report
    #[arg(long, default_value_t = 3.0)]
    delay_seconds: f64,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let frames = cli
        .captures
        .iter()
        .map(|path| match fs::read(path) {
            Ok(bytes) => CaptureFrame::Image(bytes),
            Err(e) => {
                warn!("could not read {}: {}", path.display(), e);
                CaptureFrame::Failed {
                    reason: e.to_string(),
                }
            }
        })
        .collect();

    let batch = CaptureBatch::new(
        frames,
        cli.captures.len(),
        Duration::from_secs_f64(cli.delay_seconds),
    );
    let config = AnalysisConfig {
        threshold: cli.threshold,
        ..Default::default()
    };

    let (value, run_failed) = match analyze(&batch, &config) {
        Ok(report) => (serde_json::to_value(&report)?, false),
        Err(e) => (error_payload(&e), true),
    };

    if cli.pretty {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", serde_json::to_string(&value)?);
    }

    if run_failed {
        std::process::exit(1);
    }
    Ok(())
}
