//! Migration runner backed by an external command.

use schemacheck::{BoxError, MigrationRunner};
use schemacheck_config::MigrateConfig;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Lines of stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 20;

/// Runs a configured command with the target database in `DATABASE_URL`.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    /// Build a runner from configuration. `None` if no command is configured.
    pub fn from_config(config: &MigrateConfig) -> Option<Self> {
        let (program, args) = config.argv()?;
        Some(Self {
            timeout: config.timeout_secs.map(Duration::from_secs),
            ..Self::new(program, args.to_vec())
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Errors from running the migration command.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` {status}\n{stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("`{program}` did not finish within {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
}

impl MigrationRunner for CommandRunner {
    async fn run(&self, target: &str) -> Result<(), BoxError> {
        info!(program = %self.program, args = ?self.args, "running migrations");

        let output = Command::new(&self.program)
            .args(&self.args)
            .env("DATABASE_URL", target)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, output).await.map_err(|_| {
                RunError::TimedOut {
                    program: self.program.clone(),
                    timeout,
                }
            })?,
            None => output.await,
        }
        .map_err(|source| RunError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stdout.lines() {
            debug!(target: "schemacheck::migrate", "{line}");
        }

        if !output.status.success() {
            return Err(RunError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: tail(&stderr, STDERR_TAIL_LINES),
            }
            .into());
        }

        info!(status = %output.status, "migrations applied");
        Ok(())
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.trim_end().lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
