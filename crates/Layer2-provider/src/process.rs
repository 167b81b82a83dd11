//! Process-backed sub-agent
//!
//! 설정된 명령어를 실행하고 프롬프트를 stdin으로 전달합니다.
//! stdout 줄은 `StreamEvent::Output`, stderr 줄은 `StreamEvent::Diagnostic`.

use crate::error::ProviderError;
use crate::r#trait::{InvocationResult, InvokeOptions, StreamEvent, SubAgentInvoker};
use async_trait::async_trait;
use relay_foundation::SubAgentConfig;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// 프로세스 기반 sub-agent
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    program: String,
    args: Vec<String>,
    model_flag: String,
    working_dir: Option<PathBuf>,
}

impl ProcessInvoker {
    /// 명령어 문자열에서 생성 (shell 문법으로 분리)
    pub fn from_command(command: &str, model_flag: impl Into<String>) -> Result<Self, ProviderError> {
        let mut parts = shlex::split(command)
            .ok_or_else(|| ProviderError::InvalidCommand(format!("cannot parse '{}'", command)))?
            .into_iter();
        let program = parts
            .next()
            .ok_or_else(|| ProviderError::InvalidCommand("command is empty".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
            model_flag: model_flag.into(),
            working_dir: None,
        })
    }

    pub fn from_config(config: &SubAgentConfig) -> Result<Self, ProviderError> {
        Self::from_command(&config.command, config.model_flag.clone())
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// 실제 실행 인자 (모델 플래그 포함)
    pub fn command_args(&self, model: Option<&str>) -> Vec<String> {
        let mut args = self.args.clone();
        if let Some(model) = model {
            if !self.model_flag.is_empty() {
                args.push(self.model_flag.clone());
                args.push(model.to_string());
            }
        }
        args
    }
}

/// 줄 단위로 읽으며 콜백 호출, 전체 텍스트 반환
async fn pump_lines<R>(reader: R, options: &InvokeOptions, wrap: fn(String) -> StreamEvent) -> String
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut collected: Vec<String> = Vec::new();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                options.emit(wrap(line.clone()));
                collected.push(line);
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read sub-agent output: {}", e);
                break;
            }
        }
    }

    collected.join("\n")
}

#[async_trait]
impl SubAgentInvoker for ProcessInvoker {
    fn name(&self) -> &str {
        &self.program
    }

    async fn invoke(
        &self,
        prompt: &str,
        options: InvokeOptions,
    ) -> Result<InvocationResult, ProviderError> {
        let start = Instant::now();
        let args = self.command_args(options.model.as_deref());

        info!(program = %self.program, model = ?options.model, "Invoking sub-agent");

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| ProviderError::spawn(&self.program, e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProviderError::Io("Failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProviderError::Io("Failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProviderError::Io("Failed to capture stderr".to_string()))?;

        // stdin writer task
        let input = prompt.to_string();
        let mut stdin_writer = stdin;
        tokio::spawn(async move {
            if let Err(e) = stdin_writer.write_all(input.as_bytes()).await {
                debug!("Sub-agent closed stdin early: {}", e);
            }
        });

        let (output, diagnostics) = tokio::join!(
            pump_lines(stdout, &options, StreamEvent::Output),
            pump_lines(stderr, &options, StreamEvent::Diagnostic),
        );

        let status = child.wait().await?;
        let exit_code = status.code();
        options.emit(StreamEvent::Exited(exit_code));

        let duration_ms = start.elapsed().as_millis() as u64;
        let error = match exit_code {
            Some(0) => None,
            _ if diagnostics.trim().is_empty() => None,
            _ => Some(diagnostics.trim().to_string()),
        };

        debug!(
            program = %self.program,
            exit_code = ?exit_code,
            duration_ms,
            "Sub-agent finished"
        );

        Ok(InvocationResult {
            output,
            exit_code,
            error,
            duration_ms,
            model: options.model.clone(),
            input_tokens: None,
            output_tokens: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_command_splits_like_shell() {
        let invoker = ProcessInvoker::from_command("claude -p --append 'two words'", "--model")
            .unwrap();
        assert_eq!(invoker.program(), "claude");
        assert_eq!(
            invoker.command_args(Some("opus")),
            vec!["-p", "--append", "two words", "--model", "opus"]
        );
        assert_eq!(invoker.command_args(None), vec!["-p", "--append", "two words"]);
    }

    #[test]
    fn test_invalid_commands() {
        assert!(matches!(
            ProcessInvoker::from_command("   ", "--model"),
            Err(ProviderError::InvalidCommand(_))
        ));
        assert!(ProcessInvoker::from_command("claude 'unterminated", "--model").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invoke_streams_and_collects() {
        use std::sync::{Arc, Mutex};

        let invoker = ProcessInvoker::from_command("sh -c 'cat; echo warn >&2'", "").unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let options = InvokeOptions::new()
            .with_stream_callback(Arc::new(move |e: StreamEvent| sink.lock().unwrap().push(e)));

        let result = invoker.invoke("line one\nline two\n", options).await.unwrap();

        assert_eq!(result.output, "line one\nline two");
        assert_eq!(result.exit_code, Some(0));
        assert!(result.error.is_none());

        let events = events.lock().unwrap();
        assert!(events.contains(&StreamEvent::Output("line one".into())));
        assert!(events.contains(&StreamEvent::Diagnostic("warn".into())));
        assert_eq!(events.last(), Some(&StreamEvent::Exited(Some(0))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invoke_reports_failure() {
        let invoker =
            ProcessInvoker::from_command("sh -c 'echo broken >&2; exit 3'", "").unwrap();
        let result = invoker.invoke("", InvokeOptions::new()).await.unwrap();

        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.error.as_deref(), Some("broken"));
        assert!(!result.is_success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invoke_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = ProcessInvoker::from_command("pwd", "")
            .unwrap()
            .with_working_dir(dir.path());

        let result = invoker.invoke("", InvokeOptions::new()).await.unwrap();

        assert_eq!(
            std::fs::canonicalize(result.output.trim()).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let invoker =
            ProcessInvoker::from_command("relay-test-no-such-binary-xyz", "--model").unwrap();
        let err = invoker.invoke("hi", InvokeOptions::new()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Spawn { .. }));
    }
}
