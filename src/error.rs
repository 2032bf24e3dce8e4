//! Error kinds surfaced by the store, the reload supervisor and the
//! mutation coordinator.
//!
//! # Propagation
//! - `InvalidName` / `NotFound`: returned before any lock is taken, no side effects
//! - `Io` during apply and `ReloadFailed`: returned only after rollback has run
//! - `RollbackFailed`: on-disk config and the running nginx may disagree;
//!   no further automatic recovery is attempted

use std::time::Duration;
use thiserror::Error;

/// Errors produced while mutating the nginx configuration directory.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Filename is empty or resolves outside the configuration directory.
    #[error("invalid config filename {0:?}")]
    InvalidName(String),

    /// Target file does not exist.
    #[error("config file {0} not found")]
    NotFound(String),

    /// Filesystem failure on read, write, remove or listing.
    #[error("failed to {op} {target}: {source}")]
    Io {
        op: &'static str,
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Nginx did not confirm the reload.
    #[error("nginx reload failed: {0}")]
    ReloadFailed(ReloadFailure),

    /// Restoring the pre-mutation state failed after an apply or reload error.
    #[error("rollback of {filename} failed after [{cause}]: {restore}")]
    RollbackFailed {
        filename: String,
        cause: Box<AgentError>,
        restore: Box<AgentError>,
    },
}

impl AgentError {
    pub(crate) fn io(op: &'static str, target: impl Into<String>, source: std::io::Error) -> Self {
        AgentError::Io {
            op,
            target: target.into(),
            source,
        }
    }

    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::InvalidName(_) => "invalid_name",
            AgentError::NotFound(_) => "not_found",
            AgentError::Io { .. } => "io",
            AgentError::ReloadFailed(_) => "reload_failed",
            AgentError::RollbackFailed { .. } => "rollback_failed",
        }
    }
}

/// Why a reload was not confirmed.
#[derive(Debug, Error)]
pub enum ReloadFailure {
    /// The reload command could not be started.
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The reload command exited unsuccessfully.
    #[error("exited with {}: {}", status_label(*.code), .stderr)]
    Exited { code: Option<i32>, stderr: String },

    /// The reload command did not finish within the bounded wait.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

fn status_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}
