//! Shared logging setup for assetsort binaries.
//!
//! Logs always go to stderr. With [`LogConfig::log_to_file`] each run also
//! appends to `~/.assetsort/logs/<app>.log`; when that file has grown past
//! [`MAX_LOG_FILE_SIZE`] at startup it is moved aside to `<app>.log.old`
//! (replacing any previous backup) before the run starts writing.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "assetsort=info,assetsort_llm=info";
const VERBOSE_LOG_FILTER: &str = "assetsort=debug,assetsort_llm=debug";

/// Size at which a run log is moved aside on the next start
pub const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Logging configuration shared by assetsort binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Also append to `<app>.log` under [`logs_dir`].
    pub log_to_file: bool,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Initialize tracing with stderr output and, optionally, a run log file.
///
/// `RUST_LOG` overrides the default filter. `verbose` raises the console
/// filter to `debug` for the assetsort crates.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let console_filter = if config.verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        env_filter()
    };

    let file_layer = if config.log_to_file {
        let file = open_run_log(&logs_dir(), config.app_name, MAX_LOG_FILE_SIZE)?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(env_filter()),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Get the assetsort home directory: `$ASSETSORT_HOME`, else `~/.assetsort`
pub fn assetsort_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("ASSETSORT_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .map(|home| home.join(".assetsort"))
        .unwrap_or_else(|| PathBuf::from(".assetsort"))
}

/// Get the logs directory: ~/.assetsort/logs
pub fn logs_dir() -> PathBuf {
    assetsort_home().join("logs")
}

/// Open `<dir>/<app_name>.log` for appending, moving an oversized one aside first.
fn open_run_log(dir: &Path, app_name: &str, max_size: u64) -> Result<File> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create logs directory: {}", dir.display()))?;

    let path = dir.join(format!("{}.log", app_name));
    let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    if size > max_size {
        let backup = dir.join(format!("{}.log.old", app_name));
        fs::rename(&path, &backup)
            .with_context(|| format!("Failed to move {} aside", path.display()))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}
