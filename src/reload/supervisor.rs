//! Nginx reload invocation.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::process::{ChildStderr, Command};
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::NginxConfig;
use crate::error::{AgentError, ReloadFailure};
use crate::observability::metrics;

/// How long stderr is still collected after a failed reload has exited.
const STDERR_GRACE: Duration = Duration::from_secs(1);

/// Runs the reload command and reports whether nginx accepted it.
#[derive(Debug, Clone)]
pub struct ReloadSupervisor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ReloadSupervisor {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &NginxConfig) -> Self {
        Self::new(
            config.binary_path.clone(),
            config.reload_args.clone(),
            Duration::from_secs(config.reload_timeout_secs),
        )
    }

    /// Run `<program> <args>` and wait for it, at most `timeout`.
    ///
    /// A command still running at the deadline is killed and reported as
    /// `ReloadFailure::TimedOut`. Only the exit of the command itself is
    /// awaited: a background process that inherited stderr does not hold the
    /// reload open, though its output may be cut from the failure message.
    pub async fn reload(&self) -> Result<(), AgentError> {
        let start = Instant::now();
        tracing::info!(program = %self.program, args = ?self.args, "Reloading nginx");

        let result = self.run().await;
        metrics::record_reload(result.is_ok(), start);

        match &result {
            Ok(()) => tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "Nginx reloaded"),
            Err(e) => tracing::warn!(error = %e, "Nginx reload failed"),
        }
        result.map_err(AgentError::ReloadFailed)
    }

    async fn run(&self) -> Result<(), ReloadFailure> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ReloadFailure::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let mut stderr = child.stderr.take().map(|pipe| tokio::spawn(drain(pipe)));

        // On any early return the child is dropped, which kills it.
        let status = match time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => {
                abort(&stderr);
                return Err(ReloadFailure::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
            Err(_) => {
                abort(&stderr);
                return Err(ReloadFailure::TimedOut(self.timeout));
            }
        };

        if status.success() {
            abort(&stderr);
            return Ok(());
        }

        let message = match stderr.as_mut() {
            Some(task) => match time::timeout(STDERR_GRACE, task).await {
                Ok(Ok(text)) => text,
                _ => String::new(),
            },
            None => String::new(),
        };
        abort(&stderr);

        Err(ReloadFailure::Exited {
            code: status.code(),
            stderr: message,
        })
    }
}

async fn drain(mut pipe: ChildStderr) -> String {
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).trim().to_string()
}

fn abort(task: &Option<JoinHandle<String>>) {
    if let Some(task) = task {
        task.abort();
    }
}
