mod config;
mod engine;
mod error;
mod logging;
mod pump;
mod session;
mod translate;
mod wire;

use anyhow::{Context, Result};
use clap::Parser;
use config::WrapperConfig;
use session::{run_supervisor, StdoutSink};
use std::path::PathBuf;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::info;
use wire::WireLog;

#[derive(Parser)]
#[command(name = "maia-wrapper")]
#[command(about = "UCI wrapper presenting rating-selectable Maia networks as one engine")]
#[command(version)]
struct Cli {
    /// Wrapper configuration file (YAML); built-in defaults otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Engine binary, overriding the configured one
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Directory holding the weight files, overriding the configured one
    #[arg(long)]
    weights_dir: Option<PathBuf>,

    /// Initial rating, overriding the configured default
    #[arg(long)]
    elo: Option<u32>,

    /// Diagnostic log file, truncated at startup
    #[arg(long, default_value = "maia_wrapper.log")]
    log_file: PathBuf,

    /// Optional JSONL log of every protocol line, truncated at startup
    #[arg(long)]
    wire_log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = logging::init(&cli.log_file)
        .with_context(|| format!("failed to open log file {}", cli.log_file.display()))?;

    info!(
        git_sha = env!("MAIA_WRAPPER_GIT_SHA"),
        build_timestamp = env!("MAIA_WRAPPER_BUILD_TIMESTAMP"),
        "maia-wrapper starting"
    );

    let mut config = match &cli.config {
        Some(path) => WrapperConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => WrapperConfig::default_config(),
    };
    if let Some(engine) = cli.engine {
        config.engine.binary = engine;
    }
    if let Some(dir) = cli.weights_dir {
        config.engine.weights_dir = dir;
    }
    let initial_rating = cli.elo.unwrap_or(config.strength.default_rating);

    let wire = match &cli.wire_log {
        Some(path) => WireLog::create(path)
            .with_context(|| format!("failed to open wire log {}", path.display()))?,
        None => WireLog::disabled(),
    };

    let mut gui_rx = spawn_gui_reader();

    run_supervisor(&config, initial_rating, &mut gui_rx, &StdoutSink, &wire)
        .await
        .context("wrapper failed")?;

    info!("maia-wrapper exiting");
    Ok(())
}

/// Long-lived stdin reader. Outlives individual engine sessions so a GUI
/// line arriving during a restart is buffered, not lost. EOF closes the
/// channel, which the supervisor treats as a shutdown request.
fn spawn_gui_reader() -> UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
