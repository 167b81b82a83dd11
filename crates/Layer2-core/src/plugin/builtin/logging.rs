//! Logging Plugin - 작업 라이프사이클 로그

use crate::hook::{HookFailure, HookPoint};
use crate::plugin::PluginHooks;
use async_trait::async_trait;
use tracing::info;

/// 작업 생성 / 실패와 명령어를 로그로 남기는 플러그인 (명령어를 처리하지 않음)
pub struct LoggingPlugin;

impl LoggingPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoggingPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginHooks for LoggingPlugin {
    fn name(&self) -> &str {
        "logging"
    }

    fn hook_points(&self) -> &[HookPoint] {
        &[
            HookPoint::OnTaskCreate,
            HookPoint::OnTaskFailed,
            HookPoint::OnCommand,
        ]
    }

    async fn on_task_create(&self, thread_id: &str, task_id: &str) -> Result<(), HookFailure> {
        info!(task_id, thread_id, "Task created");
        Ok(())
    }

    async fn on_task_failed(
        &self,
        thread_id: &str,
        task_id: &str,
        error: &str,
    ) -> Result<(), HookFailure> {
        info!(task_id, thread_id, error, "Task failed");
        Ok(())
    }

    async fn on_command(
        &self,
        thread_id: &str,
        command: &str,
        args: &str,
    ) -> Result<bool, HookFailure> {
        info!(thread_id, command, args, "Command seen");
        Ok(false)
    }
}
