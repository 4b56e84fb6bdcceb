//! Tracing setup.
//!
//! Logs go to stderr by default so they never mix with command output on
//! stdout. With a log directory, they go to a daily rolling file through a
//! non-blocking writer instead, and the returned guard must be held until
//! exit so buffered lines are flushed.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "paws.log";

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `log_level` when set. Installing twice is not an
/// error; the second call leaves the first subscriber in place.
pub fn init_logging(
    log_level: &str,
    json_format: bool,
    log_dir: Option<PathBuf>,
) -> std::io::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = tracing_subscriber::registry().with(env_filter);
    let format = if json_format { "json" } else { "text" };

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;

            let file_appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let result = if json_format {
                subscriber
                    .with(fmt::layer().json().with_writer(non_blocking))
                    .try_init()
            } else {
                subscriber
                    .with(
                        fmt::layer()
                            .with_target(true)
                            .with_thread_names(true)
                            .with_ansi(false)
                            .with_writer(non_blocking),
                    )
                    .try_init()
            };

            if result.is_err() {
                return Ok(None);
            }

            tracing::info!(level = log_level, format, dir = %dir.display(), "Logging initialized");
            Ok(Some(guard))
        }
        None => {
            let result = if json_format {
                subscriber
                    .with(fmt::layer().json().with_writer(std::io::stderr))
                    .try_init()
            } else {
                subscriber
                    .with(
                        fmt::layer()
                            .with_target(false)
                            .with_thread_names(true)
                            .with_writer(std::io::stderr),
                    )
                    .try_init()
            };

            if result.is_ok() {
                tracing::debug!(level = log_level, format, "Logging initialized");
            }
            Ok(None)
        }
    }
}
