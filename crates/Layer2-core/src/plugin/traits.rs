//! Plugin traits - 핵심 플러그인 인터페이스

use crate::hook::{HookFailure, HookPoint};
use async_trait::async_trait;

// ============================================================================
// PluginHooks Trait
// ============================================================================

/// 플러그인 hook 트레이트
///
/// 모든 콜백은 선택 사항입니다. 구현한 콜백은 [`hook_points`](Self::hook_points)
/// 에 나열해야 runner가 호출합니다.
///
/// ```ignore
/// struct Reviewer;
///
/// #[async_trait]
/// impl PluginHooks for Reviewer {
///     fn name(&self) -> &str { "reviewer" }
///
///     fn hook_points(&self) -> &[HookPoint] { &[HookPoint::OnTaskComplete] }
///
///     async fn on_task_complete(&self, _thread: &str, _task: &str, output: &str)
///         -> Result<(), HookFailure>
///     {
///         if output.contains("TODO") {
///             return Err(HookFailure::message("Output still contains TODOs"));
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait PluginHooks: Send + Sync {
    /// 플러그인 이름 (로그 / 등록 키)
    fn name(&self) -> &str;

    /// 구현한 콜백 지점
    fn hook_points(&self) -> &[HookPoint] {
        &[]
    }

    fn implements(&self, point: HookPoint) -> bool {
        self.hook_points().contains(&point)
    }

    /// 위임 작업 생성 직후
    async fn on_task_create(&self, _thread_id: &str, _task_id: &str) -> Result<(), HookFailure> {
        Ok(())
    }

    /// Sub-agent 출력 검증
    ///
    /// `Err`를 반환하면 출력이 거부되고, 그 메시지가 다음 시도의 피드백이 됩니다.
    async fn on_task_complete(
        &self,
        _thread_id: &str,
        _task_id: &str,
        _output: &str,
    ) -> Result<(), HookFailure> {
        Ok(())
    }

    /// 반복 횟수 소진
    async fn on_task_failed(
        &self,
        _thread_id: &str,
        _task_id: &str,
        _error: &str,
    ) -> Result<(), HookFailure> {
        Ok(())
    }

    /// slash-command 처리, 처리했으면 `true`
    async fn on_command(
        &self,
        _thread_id: &str,
        _command: &str,
        _args: &str,
    ) -> Result<bool, HookFailure> {
        Ok(false)
    }

    /// Sub-agent로 보낼 프롬프트 변환
    async fn transform_prompt(&self, _thread_id: &str, prompt: String) -> Result<String, HookFailure> {
        Ok(prompt)
    }
}
