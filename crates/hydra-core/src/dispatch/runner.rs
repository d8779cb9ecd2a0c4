//! Execution of a single invocation as an external process.

use std::future::Future;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::process::Command;
use tracing::debug;

use crate::invocation::Invocation;

/// How one invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Failed { cause: String },
}

/// Captured result of running one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub invocation_id: u64,
    pub item: String,
    #[serde(skip)]
    pub stdout: Vec<u8>,
    #[serde(skip)]
    pub stderr: Vec<u8>,
    /// Exit code, when the process ran to completion and was not signalled.
    pub exit_code: Option<i32>,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

impl ExecutionResult {
    pub fn succeeded(invocation: &Invocation, stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        Self {
            invocation_id: invocation.id,
            item: invocation.item.to_string(),
            stdout,
            stderr,
            exit_code: Some(0),
            outcome: Outcome::Succeeded,
            elapsed: Duration::ZERO,
        }
    }

    pub fn failed(invocation: &Invocation, cause: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation.id,
            item: invocation.item.to_string(),
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: None,
            outcome: Outcome::Failed {
                cause: cause.into(),
            },
            elapsed: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Succeeded)
    }

    pub fn cause(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Succeeded => None,
            Outcome::Failed { cause } => Some(cause),
        }
    }

    /// Stdout followed by stderr, lossily decoded and trimmed.
    pub fn combined_output(&self) -> String {
        let stdout = String::from_utf8_lossy(&self.stdout);
        let stderr = String::from_utf8_lossy(&self.stderr);
        match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
            (true, true) => String::new(),
            (false, true) => stdout.trim_end().to_string(),
            (true, false) => stderr.trim_end().to_string(),
            (false, false) => format!("{}\n{}", stdout.trim_end(), stderr.trim_end()),
        }
    }
}

/// Runs invocations. Implementations must never panic on a bad command; every
/// problem is reported through the returned [`ExecutionResult`].
pub trait CommandRunner: Send + Sync + 'static {
    fn run(&self, invocation: &Invocation) -> impl Future<Output = ExecutionResult> + Send;
}

/// Runs invocations as child processes, capturing their output.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    timeout: Option<Duration>,
}

impl ShellRunner {
    pub const fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    async fn execute(&self, invocation: &Invocation) -> ExecutionResult {
        if invocation.command.trim().is_empty() {
            return ExecutionResult::failed(invocation, "empty command");
        }

        let cmd_line = invocation.command_line();
        debug!(cwd = %invocation.cwd.display(), "exec: {cmd_line}");

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, command.output()).await {
                Ok(output) => output,
                Err(_) => {
                    return ExecutionResult::failed(
                        invocation,
                        format!("timed out after {}s", limit.as_secs()),
                    );
                }
            },
            None => command.output().await,
        };

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                return ExecutionResult::failed(
                    invocation,
                    format!(
                        "failed to execute in {}: {e}",
                        invocation.cwd.display()
                    ),
                );
            }
        };

        if output.status.success() {
            ExecutionResult::succeeded(invocation, output.stdout, output.stderr)
        } else {
            let cause = output.status.code().map_or_else(
                || format!("terminated by signal ({})", output.status),
                |code| format!("exited with code {code}"),
            );
            ExecutionResult {
                exit_code: output.status.code(),
                stdout: output.stdout,
                stderr: output.stderr,
                ..ExecutionResult::failed(invocation, cause)
            }
        }
    }
}

impl CommandRunner for ShellRunner {
    async fn run(&self, invocation: &Invocation) -> ExecutionResult {
        let started = Instant::now();
        self.execute(invocation)
            .await
            .with_elapsed(started.elapsed())
    }
}
