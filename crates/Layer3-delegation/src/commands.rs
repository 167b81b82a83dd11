//! `/delegate`, `/re-delegate` 명령어 처리
//!
//! 인자를 파싱하고, 현재 plugin snapshot과 함께 위임을 시작한 뒤
//! 곧바로 응답 문자열을 돌려줍니다.

use crate::engine::DelegationRequest;
use crate::error::DelegationError;
use crate::supervisor::{DelegationSupervisor, LaunchedTask};
use relay_core::{parse_delegate_args, PluginRegistry};
use std::sync::Arc;
use tracing::info;

pub const DELEGATE: &str = "delegate";
pub const RE_DELEGATE: &str = "re-delegate";

/// 위임 명령어 핸들러
#[derive(Clone)]
pub struct DelegationCommands {
    supervisor: DelegationSupervisor,
    registry: Arc<PluginRegistry>,
}

impl DelegationCommands {
    pub fn new(supervisor: DelegationSupervisor, registry: Arc<PluginRegistry>) -> Self {
        Self {
            supervisor,
            registry,
        }
    }

    /// 이 핸들러가 처리하는 명령어인지
    pub fn handles(command: &str) -> bool {
        matches!(command, DELEGATE | RE_DELEGATE)
    }

    /// 명령어 실행
    ///
    /// `thread_id`는 명령어를 보낸 스레드이며 새 작업의 부모가 됩니다.
    pub async fn handle(
        &self,
        thread_id: &str,
        command: &str,
        args: &str,
    ) -> Result<LaunchedTask, DelegationError> {
        if !Self::handles(command) {
            return Err(DelegationError::UnknownCommand(command.to_string()));
        }

        let parsed = parse_delegate_args(command, args)?;

        let mut request =
            DelegationRequest::new(thread_id, parsed.prompt).with_hooks(self.registry.snapshot());
        if let Some(model) = parsed.model {
            request = request.with_model(model);
        }
        if let Some(max_iterations) = parsed.max_iterations {
            request = request.with_max_iterations(max_iterations);
        }

        let launched = self.supervisor.launch(request).await?;
        info!(
            parent_thread_id = thread_id,
            task_id = %launched.task_id,
            command,
            "Delegation launched"
        );
        Ok(launched)
    }

    /// 사용자 응답 문자열
    pub fn reply(launched: &LaunchedTask) -> String {
        format!(
            "Delegated task {} (thread {})",
            launched.task_id, launched.thread_id
        )
    }
}
