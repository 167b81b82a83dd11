//! Shell Validator - 외부 명령어로 Sub-agent 출력 검증
//!
//! 출력을 stdin으로 전달하고, 종료 코드가 0이 아니면 거부합니다.
//! 거부 피드백은 stderr (없으면 stdout) 입니다.
//!
//! 환경 변수: `RELAY_TASK_ID`, `RELAY_THREAD_ID`

use crate::hook::{HookFailure, HookPoint};
use crate::plugin::PluginHooks;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// 명령어 기반 검증 플러그인
pub struct ShellValidator {
    command: String,
    working_dir: Option<PathBuf>,
    timeout: Duration,
}

impl ShellValidator {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            working_dir: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn build_command(&self, thread_id: &str, task_id: &str) -> Command {
        let (shell, shell_arg) = if cfg!(windows) {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let mut cmd = Command::new(shell);
        cmd.arg(shell_arg)
            .arg(&self.command)
            .env("RELAY_TASK_ID", task_id)
            .env("RELAY_THREAD_ID", thread_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[async_trait]
impl PluginHooks for ShellValidator {
    fn name(&self) -> &str {
        "shell-validator"
    }

    fn hook_points(&self) -> &[HookPoint] {
        &[HookPoint::OnTaskComplete]
    }

    async fn on_task_complete(
        &self,
        thread_id: &str,
        task_id: &str,
        output: &str,
    ) -> Result<(), HookFailure> {
        debug!(task_id, command = %self.command, "Running validation command");

        let mut child = self.build_command(thread_id, task_id).spawn()?;

        // stdin은 별도 태스크에서 기록 (출력 버퍼가 가득 차도 막히지 않도록)
        if let Some(mut stdin) = child.stdin.take() {
            let input = output.to_string();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    debug!("Validation command closed stdin early: {}", e);
                }
            });
        }

        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                HookFailure::message(format!(
                    "Validation command timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;

        if result.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&result.stdout).trim().to_string();
        let feedback = if !stderr.is_empty() {
            stderr
        } else if !stdout.is_empty() {
            stdout
        } else {
            format!(
                "Validation command failed with exit code: {:?}",
                result.status.code()
            )
        };

        warn!(task_id, "Validation rejected output: {}", feedback);
        Err(HookFailure::message(feedback))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accepts_on_zero_exit() {
        let validator = ShellValidator::new("grep -q ready");
        assert!(validator
            .on_task_complete("th", "t1", "all ready now")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_rejects_with_stderr() {
        let validator = ShellValidator::new("echo 'missing tests' >&2; exit 1");
        let err = validator
            .on_task_complete("th", "t1", "output")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "missing tests");
    }

    #[tokio::test]
    async fn test_rejects_with_stdout_fallback() {
        let validator = ShellValidator::new("echo \"task $RELAY_TASK_ID\"; exit 2");
        let err = validator
            .on_task_complete("th", "t9", "output")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "task t9");
    }

    #[tokio::test]
    async fn test_timeout() {
        let validator =
            ShellValidator::new("sleep 5").with_timeout(Duration::from_millis(100));
        let err = validator
            .on_task_complete("th", "t1", "")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
