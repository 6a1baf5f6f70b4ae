//! Logging bootstrap
//!
//! Two layers share one `RUST_LOG` filter (default
//! `registrar=info,registrar_core=info`):
//!
//! - a daily-rotated file under the platform data dir
//!   (`~/.local/share/registrar/logs/registrar.log.YYYY-MM-DD` on Linux),
//!   with targets and line numbers
//! - stderr, limited to warnings and errors, since commands print their own
//!   results to stdout

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

const LOG_FILE_PREFIX: &str = "registrar.log";
const DEFAULT_FILTER: &str = "registrar=info,registrar_core=info";

pub fn init() -> Result<()> {
    let log_dir = get_log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX))
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    let terminal_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(terminal_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!("Logging to {}", log_dir.display());
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn get_log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .context("Failed to determine data directory (XDG_DATA_HOME or platform equivalent)")?;

    Ok(data_dir.join("registrar").join("logs"))
}
