//! Process-backed project command runner.

use std::process::{Output, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use atlantis_core::{ProjectCommandContext, ProjectCommandRunner, ProjectResult};

use crate::config::ExecConfig;
use crate::error::{ExecError, Result};

/// Runs `<program> <command> <extra args>` in the project directory.
///
/// The child sees the request through `ATLANTIS_*` environment variables.
/// Exit code zero is a success, any other exit code a failure, and a child
/// that cannot be started or times out is an error.
pub struct ShellProjectCommandRunner {
    config: ExecConfig,
}

impl ShellProjectCommandRunner {
    pub fn new(config: ExecConfig) -> Self {
        Self { config }
    }

    fn command(&self, ctx: &ProjectCommandContext) -> Result<Command> {
        let (exe, leading) = self
            .config
            .program
            .split_first()
            .ok_or(ExecError::EmptyCommand)?;

        let mut cmd = Command::new(exe);
        cmd.args(leading)
            .arg(ctx.command.to_string())
            .args(&ctx.extra_args)
            .current_dir(self.config.root_dir.join(&ctx.repo_rel_dir))
            .env("ATLANTIS_COMMAND", ctx.command.to_string())
            .env("ATLANTIS_WORKSPACE", &ctx.workspace)
            .env("ATLANTIS_DIR", &ctx.repo_rel_dir)
            .env("ATLANTIS_BASE_REPO", &ctx.base_repo.full_name)
            .env("ATLANTIS_HEAD_REPO", &ctx.head_repo.full_name)
            .env("ATLANTIS_PULL_NUM", ctx.pull.num.to_string())
            .env("ATLANTIS_HEAD_COMMIT", &ctx.pull.head_commit)
            .env("ATLANTIS_HEAD_BRANCH", &ctx.pull.head_branch)
            .env("ATLANTIS_BASE_BRANCH", &ctx.pull.base_branch)
            .env("ATLANTIS_USER", &ctx.user.username)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(cmd)
    }

    /// Run the project command and return the raw process output.
    pub async fn execute(&self, ctx: &ProjectCommandContext) -> Result<Output> {
        let mut cmd = self.command(ctx)?;
        let program = self.config.program.join(" ");

        let child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

        let wait = child.wait_with_output();
        let output = if self.config.timeout_secs > 0 {
            tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), wait)
                .await
                .map_err(|_| ExecError::Timeout {
                    program: program.clone(),
                    secs: self.config.timeout_secs,
                })?
        } else {
            wait.await
        };
        output.map_err(|source| ExecError::Wait { program, source })
    }
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (_, true) => stdout.into_owned(),
        (true, false) => stderr.into_owned(),
        (false, false) => format!("{stdout}\n{stderr}"),
    }
}

#[async_trait]
impl ProjectCommandRunner for ShellProjectCommandRunner {
    async fn run(&self, ctx: &ProjectCommandContext) -> ProjectResult {
        let start = Instant::now();
        debug!(dir = %ctx.repo_rel_dir, workspace = %ctx.workspace, "running project command");

        match self.execute(ctx).await {
            Ok(output) => {
                let exit_code = output.status.code().unwrap_or(-1);
                let duration_ms = start.elapsed().as_millis() as u64;
                let text = combined_output(&output);
                if output.status.success() {
                    info!(dir = %ctx.repo_rel_dir, exit_code, duration_ms, "project command succeeded");
                    ProjectResult::success(ctx, text)
                } else {
                    warn!(dir = %ctx.repo_rel_dir, exit_code, duration_ms, "project command failed");
                    ProjectResult::failure(ctx, text)
                }
            }
            Err(err) => {
                warn!(dir = %ctx.repo_rel_dir, error = %err, "project command errored");
                ProjectResult::error(ctx, err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlantis_core::fakes::fixtures;
    use atlantis_core::{CommandName, ProjectStatus};
    use tempfile::TempDir;

    fn ctx(dir: &str) -> ProjectCommandContext {
        ProjectCommandContext {
            base_repo: fixtures::github_repo(),
            head_repo: fixtures::github_repo(),
            pull: fixtures::pull(),
            user: fixtures::user(),
            command: CommandName::Plan,
            repo_rel_dir: dir.to_string(),
            workspace: "default".to_string(),
            extra_args: vec!["-no-color".to_string()],
        }
    }

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string(), "sh".to_string()]
    }

    #[tokio::test]
    async fn test_success_appends_command_and_flags() {
        let root = TempDir::new().unwrap();
        let runner = ShellProjectCommandRunner::new(
            ExecConfig::new(root.path()).with_program(vec!["echo".to_string()]),
        );

        let result = runner.run(&ctx(".")).await;
        assert_eq!(result.status, ProjectStatus::Success);
        assert_eq!(result.output.trim(), "plan -no-color");
        assert_eq!(result.repo_rel_dir, ".");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_a_failure() {
        let root = TempDir::new().unwrap();
        let runner = ShellProjectCommandRunner::new(
            ExecConfig::new(root.path()).with_program(sh("echo boom >&2; exit 3")),
        );

        let result = runner.run(&ctx(".")).await;
        assert_eq!(result.status, ProjectStatus::Failure);
        assert_eq!(result.output.trim(), "boom");
    }

    #[tokio::test]
    async fn test_runs_in_project_dir_with_request_env() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("staging")).unwrap();
        let runner = ShellProjectCommandRunner::new(
            ExecConfig::new(root.path())
                .with_program(sh("basename \"$PWD\"; echo \"$ATLANTIS_PULL_NUM $ATLANTIS_WORKSPACE $ATLANTIS_USER\"")),
        );

        let result = runner.run(&ctx("staging")).await;
        assert_eq!(result.status, ProjectStatus::Success);
        assert_eq!(result.output, "staging\n1 default lkysow\n");
    }

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let root = TempDir::new().unwrap();
        let runner = ShellProjectCommandRunner::new(
            ExecConfig::new(root.path()).with_program(vec!["definitely-not-a-real-binary".to_string()]),
        );

        let result = runner.run(&ctx(".")).await;
        assert_eq!(result.status, ProjectStatus::Error);
        assert!(result.output.starts_with("starting definitely-not-a-real-binary"));
    }

    #[tokio::test]
    async fn test_empty_program_is_an_error() {
        let root = TempDir::new().unwrap();
        let runner = ShellProjectCommandRunner::new(ExecConfig::new(root.path()).with_program(vec![]));

        let result = runner.run(&ctx(".")).await;
        assert_eq!(result.status, ProjectStatus::Error);
        assert_eq!(result.output, "no program configured to run project commands");
    }

    #[tokio::test]
    async fn test_timeout_is_an_error() {
        let root = TempDir::new().unwrap();
        let runner = ShellProjectCommandRunner::new(
            ExecConfig::new(root.path())
                .with_program(sh("sleep 10"))
                .with_timeout_secs(1),
        );

        let result = runner.run(&ctx(".")).await;
        assert_eq!(result.status, ProjectStatus::Error);
        assert!(result.output.contains("timed out after 1 seconds"));
    }
}
