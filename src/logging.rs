//! Diagnostic logging setup.
//!
//! Stdout is the UCI channel to the GUI, so all tracing output goes to a
//! file, truncated at startup like the wire log.

use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber writing to `path`.
///
/// The returned guard must stay alive for the process lifetime or
/// buffered log lines are lost.
pub fn init(path: &Path) -> Result<WorkerGuard> {
    let file = std::fs::File::create(path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,maia_wrapper=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    Ok(guard)
}
