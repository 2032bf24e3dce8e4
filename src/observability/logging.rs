//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (stdout + optional rolling file)
//! - Resolve the filter from `RUST_LOG`, falling back to the configured level
//!
//! # Design Decisions
//! - File sink is non-blocking; the returned guard must live as long as the process
//! - Files roll daily as `nginx-agent.<date>.log`, oldest pruned past `max_files`
//! - Rollback failures are logged under the `ngx_agent::alert` target so they
//!   can be filtered and routed separately

use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

pub const LOG_FILE_PREFIX: &str = "nginx-agent";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {dir}: {source}")]
    CreateDir {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open log file: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Keeps the background log writer alive.
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.level)));

    let (file_layer, guard) = if config.log_dir.is_empty() {
        (None, None)
    } else {
        let appender = rolling_appender(Path::new(&config.log_dir), config.max_files)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()?;

    Ok(LoggingGuard { _file: guard })
}

/// Daily rolling appender under `dir`, creating the directory if needed.
pub fn rolling_appender(dir: &Path, max_files: usize) -> Result<RollingFileAppender, LoggingError> {
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        dir: dir.display().to_string(),
        source,
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(max_files)
        .build(dir)?;
    Ok(appender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_rolling_appender_creates_missing_dir() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("nested").join("agent");

        let mut appender = rolling_appender(&dir, 5).unwrap();
        appender.write_all(b"hello\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with(LOG_FILE_PREFIX));
        assert!(names[0].ends_with(".log"));
    }

    #[test]
    fn test_log_dir_that_is_a_file_fails() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("taken");
        std::fs::write(&file, "x").unwrap();

        assert!(matches!(
            rolling_appender(&file, 5),
            Err(LoggingError::CreateDir { .. })
        ));
    }
}
