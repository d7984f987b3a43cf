//! Tool execution: command description, process spawning, output streaming.
//!
//! Every external tool call goes through a [`CommandRunner`]. The production
//! runner spawns the process and streams stdout/stderr line by line into the
//! `log` facade; the dry-run runner only logs what would run.
//!
//! Two invocation tiers sit on top of the runner:
//! - [`run_checked`]: any non-zero exit aborts the task chain
//! - [`run_best_effort`]: failures (including a missing binary) are logged and ignored

use crate::error::{Result, TaskError};
use crate::models::TaskName;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// A fully derived external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        ToolCommand {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Short name used as the log prefix for streamed output.
    pub fn label(&self) -> String {
        std::path::Path::new(&self.program)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.clone())
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, value)?;
        }
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Exit status of a finished tool. `code` is `None` when killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    pub code: Option<i32>,
}

impl CommandOutcome {
    pub const SUCCESS: CommandOutcome = CommandOutcome { code: Some(0) };

    pub fn from_code(code: i32) -> Self {
        CommandOutcome { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external tools. The seam between task logic and the operating system.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `cmd` to completion. `Err` only when the process could not be started.
    async fn run(&self, cmd: &ToolCommand) -> Result<CommandOutcome>;
}

/// Spawns real processes and streams their output into the log.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, cmd: &ToolCommand) -> Result<CommandOutcome> {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        for (key, value) in &cmd.env {
            command.env(key, value);
        }
        if let Some(ref dir) = cmd.cwd {
            command.current_dir(dir);
        }
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command.kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| TaskError::Spawn {
            command: cmd.to_string(),
            source: e,
        })?;

        let label = cmd.label();
        let stdout = child.stdout.take().ok_or_else(|| TaskError::Spawn {
            command: cmd.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "stdout not captured"),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| TaskError::Spawn {
            command: cmd.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "stderr not captured"),
        })?;

        let mut stdout_lines = BufReader::new(stdout).lines();
        let mut stderr_lines = BufReader::new(stderr).lines();
        let mut stdout_closed = false;
        let mut stderr_closed = false;

        while !(stdout_closed && stderr_closed) {
            tokio::select! {
                line = stdout_lines.next_line(), if !stdout_closed => match line {
                    Ok(Some(line)) => log::info!("[{}] {}", label, line),
                    Ok(None) => stdout_closed = true,
                    Err(e) => {
                        log::warn!("[{}] stdout read error: {}", label, e);
                        stdout_closed = true;
                    }
                },
                line = stderr_lines.next_line(), if !stderr_closed => match line {
                    Ok(Some(line)) => log::warn!("[{}] {}", label, line),
                    Ok(None) => stderr_closed = true,
                    Err(e) => {
                        log::warn!("[{}] stderr read error: {}", label, e);
                        stderr_closed = true;
                    }
                },
            }
        }

        let status = child.wait().await.map_err(|e| TaskError::Spawn {
            command: cmd.to_string(),
            source: e,
        })?;
        log::debug!("[Exec] '{}' finished: {}", cmd, status);
        Ok(CommandOutcome {
            code: status.code(),
        })
    }
}

/// Logs every command and reports success without running anything.
#[derive(Debug, Default, Clone)]
pub struct DryRunRunner;

#[async_trait]
impl CommandRunner for DryRunRunner {
    async fn run(&self, cmd: &ToolCommand) -> Result<CommandOutcome> {
        log::info!("[DRY-RUN] {}", cmd);
        Ok(CommandOutcome::SUCCESS)
    }
}

/// Run `cmd` for `task`; a non-zero exit becomes [`TaskError::CommandFailed`].
pub async fn run_checked(
    runner: &dyn CommandRunner,
    task: TaskName,
    cmd: &ToolCommand,
) -> Result<()> {
    log::info!("[{}] $ {}", task, cmd);
    let outcome = runner.run(cmd).await?;
    if outcome.success() {
        Ok(())
    } else {
        Err(TaskError::CommandFailed {
            task: task.to_string(),
            command: cmd.to_string(),
            code: outcome.code,
        })
    }
}

/// Run `cmd` for `task`, tolerating any failure. Returns whether it succeeded.
pub async fn run_best_effort(runner: &dyn CommandRunner, task: TaskName, cmd: &ToolCommand) -> bool {
    log::info!("[{}] $ {} (failure tolerated)", task, cmd);
    match runner.run(cmd).await {
        Ok(outcome) if outcome.success() => true,
        Ok(outcome) => {
            log::warn!(
                "[{}] Ignoring failure of '{}' (exit code {:?})",
                task,
                cmd,
                outcome.code
            );
            false
        }
        Err(e) => {
            log::warn!("[{}] Ignoring failure: {}", task, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_whitespace_and_shows_env() {
        let cmd = ToolCommand::new("/usr/bin/kubectl")
            .env("NAME", "mgmt1")
            .args(["apply", "-f", "my dir"]);
        assert_eq!(cmd.to_string(), "NAME=mgmt1 /usr/bin/kubectl apply -f 'my dir'");
        assert_eq!(cmd.label(), "kubectl");
    }

    #[tokio::test]
    async fn test_process_runner_reports_exit_codes() {
        let runner = ProcessRunner;
        let ok = runner
            .run(&ToolCommand::new("sh").args(["-c", "echo hydrated; exit 0"]))
            .await
            .unwrap();
        assert!(ok.success());

        let failed = runner
            .run(&ToolCommand::new("sh").args(["-c", "echo broken >&2; exit 3"]))
            .await
            .unwrap();
        assert_eq!(failed.code, Some(3));
    }

    #[tokio::test]
    async fn test_process_runner_passes_env_and_cwd() {
        let tmp = tempfile::tempdir().unwrap();
        let cmd = ToolCommand::new("sh")
            .args(["-c", "test \"$REGION\" = us-central1 && touch marker"])
            .env("REGION", "us-central1")
            .current_dir(tmp.path());
        let outcome = ProcessRunner.run(&cmd).await.unwrap();
        assert!(outcome.success());
        assert!(tmp.path().join("marker").exists());
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let cmd = ToolCommand::new("/nonexistent/bin/anthoscli");
        let result = ProcessRunner.run(&cmd).await;
        assert!(matches!(result, Err(TaskError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_checked_and_best_effort_tiers() {
        let fail = ToolCommand::new("sh").args(["-c", "exit 4"]);

        let err = run_checked(&ProcessRunner, TaskName::ApplyCluster, &fail)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);

        assert!(!run_best_effort(&ProcessRunner, TaskName::DeleteCluster, &fail).await);
        let missing = ToolCommand::new("/nonexistent/bin/gcloud");
        assert!(!run_best_effort(&ProcessRunner, TaskName::DeleteCluster, &missing).await);
    }

    #[tokio::test]
    async fn test_dry_run_never_fails() {
        let cmd = ToolCommand::new("/nonexistent/bin/kustomize").arg("build");
        assert!(DryRunRunner.run(&cmd).await.unwrap().success());
    }
}
