use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use clicktrack::{
    config::Config,
    report::Report,
    workspace::{cleanup_old_files, discover_samples},
    AnalysisEngine, AnalysisType,
};

#[derive(Parser)]
#[command(
    name = "clicktrack",
    version,
    about = "Detect beats, onsets and tempo and render click-track overlays",
    long_about = "Clicktrack analyzes a recording for beats, downbeats, onsets and tempo, prints a markdown report and writes the source mixed with audible clicks at every detected event."
)]
struct Cli {
    /// Audio file path (WAV, MP3, FLAC, OGG, M4A, AAC)
    #[arg(short, long)]
    audio: Option<PathBuf>,

    /// Analysis to run; repeat for several (beat-tracking, onset-detection, tempo-estimation)
    #[arg(long = "analysis", default_value = "beat-tracking")]
    analyses: Vec<AnalysisType>,

    /// Directory for overlay files (overrides config and $TEMP_DIR)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write the report to this file
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Directory containing audio samples (overrides config and $SAMPLES_DIR)
    #[arg(long)]
    samples_dir: Option<PathBuf>,

    /// List the sample library and exit
    #[arg(long)]
    list_samples: bool,

    /// Delete output files older than N days before running (0 disables)
    #[arg(long)]
    cleanup_days: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    info!("Starting Clicktrack v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    if cli.list_samples {
        let samples = discover_samples(&config.samples.directory)?;
        if samples.is_empty() {
            println!("No samples found in {:?}", config.samples.directory);
        }
        for sample in samples {
            println!("{} {} ({})", sample.icon, sample.name, sample.file_name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    if let Err(e) = cleanup_old_files(&config.output.directory, config.output.cleanup_days) {
        warn!("⚠️ Cleanup failed: {}", e);
    }

    let engine = AnalysisEngine::new(config);
    let request = engine.request(cli.audio.clone(), cli.analyses.clone());

    let (report, status) = match engine.analyze(&request).await {
        Ok(outcome) => {
            for overlay in &outcome.overlays {
                info!("🎧 {} overlay: {:?}", overlay.kind.file_prefix(), overlay.destination);
            }
            for failure in &outcome.failures {
                warn!("{}", failure);
            }
            (outcome.report, ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            (Report::failure(e.user_message()), ExitCode::FAILURE)
        }
    };

    let text = report.render();
    println!("{}", text);

    if let Some(path) = &cli.report {
        std::fs::write(path, &text).with_context(|| format!("Failed to write report to {:?}", path))?;
        info!("Report saved to {:?}", path);
    }

    Ok(status)
}

/// File (or defaults), then environment, then command line
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    }
    .apply_env_overrides();

    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.clone();
    }
    if let Some(dir) = &cli.samples_dir {
        config.samples.directory = dir.clone();
    }
    if let Some(days) = cli.cleanup_days {
        config.output.cleanup_days = days;
    }

    config.validate()?;
    Ok(config)
}
