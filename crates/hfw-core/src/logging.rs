//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable controlling the log filter.
pub const LOG_FILTER_ENV: &str = "HFW_LOG";

/// Environment variable overriding the log directory.
pub const LOG_DIR_ENV: &str = "HFW_LOG_DIR";

const LOG_FILE_NAME: &str = "hfw.log";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/hfw-shell/logs/` unless `HFW_LOG_DIR`
/// points elsewhere. Log level is controlled by the `HFW_LOG` environment variable.
///
/// # Examples
/// ```bash
/// HFW_LOG=debug my-host
/// HFW_LOG=hfw_app::state=trace,warn my-host
/// ```
pub fn init() -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_NAME);

    // Default to info for the shell crates, warn for everything else
    let env_filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new("hfw_core=info,hfw_hldl=info,hfw_app=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!("HFW shell starting");
    tracing::info!("Log directory: {}", log_dir.display());
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(())
}

/// Get the log directory path
pub fn log_directory() -> PathBuf {
    if let Ok(dir) = std::env::var(LOG_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("hfw-shell").join("logs")
}

/// Get the log file path for the current day
pub fn current_log_file() -> PathBuf {
    log_directory().join(LOG_FILE_NAME)
}
