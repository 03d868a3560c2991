//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/phonecloud/logs/`, never to stdout,
/// which carries the headless event stream.
/// Log level is controlled by the `PHONECLOUD_LOG` environment variable.
///
/// # Examples
/// ```bash
/// PHONECLOUD_LOG=debug phonecloud --device abc
/// PHONECLOUD_LOG=phonecloud_link=trace phonecloud --device abc
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "phonecloud.log");

    // Default to info for our crates, warn for everything else
    let env_filter = EnvFilter::try_from_env("PHONECLOUD_LOG").unwrap_or_else(|_| {
        EnvFilter::new("phonecloud=info,phonecloud_link=info,phonecloud_app=info,warn")
    });

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
    tracing::info!("PhoneCloud client starting");
    tracing::info!("Log directory: {}", log_dir.display());
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(())
}

/// Get the log directory path
fn get_log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("phonecloud").join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_is_namespaced() {
        assert!(get_log_directory().ends_with("phonecloud/logs"));
    }
}
