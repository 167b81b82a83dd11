//! Delegation Engine - 위임 작업 라이프사이클
//!
//! ```text
//! pending ──▶ running ──▶ evaluating ──▶ completed
//!               ▲             │
//!               └─ rejected ──┘  (max_iterations 소진 시 failed)
//! ```
//!
//! 한 번의 위임은 하나의 순차 async 체인입니다:
//! 1. Thread + Task 생성 (하나의 트랜잭션), `on_task_create`, `task:created`
//! 2. 반복: 프롬프트 구성 → sub-agent 호출 → 사용량 기록 → 명령어 처리 → 검증
//! 3. 승인되면 completed, 소진되면 failed. 두 경우 모두 부모 스레드에 알림
//!
//! 생성 이후의 저장 실패는 `warn` 로그만 남기고 실행을 중단하지 않습니다.
//! 실행 결과는 항상 [`DelegationResult`]로 반환됩니다.

use crate::notifier::{Notification, ThreadNotifier};
use crate::prompt::build_iteration_prompt;
use crate::usage::UsageRecorder;
use relay_core::{
    parse_commands, run_chain, run_first_success, run_notify, HookPoint, HookSet, PluginHooks,
};
use relay_foundation::event::task;
use relay_foundation::strings::truncate_with_ellipsis;
use relay_foundation::{
    DelegationStore, Error, EventBus, MessageRecord, RelayConfig, Result, TaskRecord, TaskStatus,
    ThreadRecord, DEFAULT_MAX_ITERATIONS, DEFAULT_MODEL,
};
use relay_provider::{InvocationResult, InvokeOptions, PricingTable, StreamEvent, SubAgentInvoker};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Thread 이름 최대 길이 (문자)
pub const THREAD_NAME_MAX_CHARS: usize = 50;

/// 검증 hook이 이유 없이 거부했을 때
pub const REJECTED_WITHOUT_FEEDBACK: &str = "Task was rejected without specific feedback.";

// ============================================================================
// Request / Result
// ============================================================================

/// 위임 요청
#[derive(Clone)]
pub struct DelegationRequest {
    pub prompt: String,
    pub parent_thread_id: String,
    /// 없으면 엔진 기본값
    pub max_iterations: Option<u32>,
    /// 없으면 엔진 기본 모델
    pub model: Option<String>,
    /// 요청 시점의 plugin snapshot
    pub hooks: HookSet,
}

impl DelegationRequest {
    pub fn new(parent_thread_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            parent_thread_id: parent_thread_id.into(),
            max_iterations: None,
            model: None,
            hooks: Arc::from(Vec::<Arc<dyn PluginHooks>>::new()),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }
}

impl std::fmt::Debug for DelegationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegationRequest")
            .field("prompt", &self.prompt)
            .field("parent_thread_id", &self.parent_thread_id)
            .field("max_iterations", &self.max_iterations)
            .field("model", &self.model)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// 생성 완료된 (아직 실행 전) 위임 작업
#[derive(Clone)]
pub struct CreatedTask {
    pub task: TaskRecord,
    pub thread: ThreadRecord,
    pub parent_thread_id: String,
    /// 실제로 사용할 모델
    pub model: String,
    hooks: HookSet,
}

impl std::fmt::Debug for CreatedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatedTask")
            .field("task", &self.task)
            .field("thread", &self.thread)
            .field("parent_thread_id", &self.parent_thread_id)
            .field("model", &self.model)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl CreatedTask {
    pub fn task_id(&self) -> &str {
        &self.task.id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread.id
    }
}

/// 최종 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationStatus {
    Completed,
    Failed,
}

impl From<DelegationStatus> for TaskStatus {
    fn from(status: DelegationStatus) -> Self {
        match status {
            DelegationStatus::Completed => TaskStatus::Completed,
            DelegationStatus::Failed => TaskStatus::Failed,
        }
    }
}

/// 위임 실행 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationResult {
    pub task_id: String,
    pub thread_id: String,
    pub status: DelegationStatus,
    /// 승인된 출력 (completed 일 때만)
    pub result: Option<String>,
    pub iterations: u32,
}

impl DelegationResult {
    pub fn is_completed(&self) -> bool {
        self.status == DelegationStatus::Completed
    }
}

// ============================================================================
// Engine
// ============================================================================

/// 엔진 기본값
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub default_model: String,
    pub default_max_iterations: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            default_max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl From<&RelayConfig> for EngineSettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            default_model: config.default_model.clone(),
            default_max_iterations: config.default_max_iterations,
        }
    }
}

/// 검증 결과
enum Verdict {
    Accepted,
    Rejected(String),
}

/// 위임 작업 라이프사이클 엔진
pub struct DelegationEngine {
    store: Arc<dyn DelegationStore>,
    invoker: Arc<dyn SubAgentInvoker>,
    bus: Arc<EventBus>,
    usage: UsageRecorder,
    notifier: ThreadNotifier,
    settings: EngineSettings,
}

impl DelegationEngine {
    pub fn new(
        store: Arc<dyn DelegationStore>,
        invoker: Arc<dyn SubAgentInvoker>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            usage: UsageRecorder::new(Arc::clone(&store), PricingTable::new()),
            notifier: ThreadNotifier::new(Arc::clone(&store), Arc::clone(&bus)),
            store,
            invoker,
            bus,
            settings: EngineSettings::default(),
        }
    }

    /// 설정 파일 기반 생성 (기본값 + 가격표)
    pub fn from_config(
        config: &RelayConfig,
        store: Arc<dyn DelegationStore>,
        invoker: Arc<dyn SubAgentInvoker>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self::new(store, invoker, bus)
            .with_settings(EngineSettings::from(config))
            .with_pricing(PricingTable::new().with_overrides(&config.pricing))
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.usage = UsageRecorder::new(Arc::clone(&self.store), pricing);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn DelegationStore> {
        &self.store
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Thread + Task 생성
    ///
    /// 호출자에게 에러가 전달되는 유일한 단계입니다.
    pub async fn create(&self, request: DelegationRequest) -> Result<CreatedTask> {
        if request.prompt.trim().is_empty() {
            return Err(Error::InvalidInput("delegation prompt is empty".to_string()));
        }
        if self.store.get_thread(&request.parent_thread_id)?.is_none() {
            return Err(Error::ThreadNotFound(request.parent_thread_id));
        }

        let model = request
            .model
            .unwrap_or_else(|| self.settings.default_model.clone());
        let max_iterations = request
            .max_iterations
            .unwrap_or(self.settings.default_max_iterations);

        let name = truncate_with_ellipsis(&request.prompt, THREAD_NAME_MAX_CHARS);
        let thread = ThreadRecord::task(&request.parent_thread_id, name);
        let task = TaskRecord::new(
            &thread.id,
            &request.prompt,
            max_iterations,
            Some(model.clone()),
        );
        self.store.create_task_thread(&thread, &task)?;

        info!(
            task_id = %task.id,
            thread_id = %thread.id,
            parent_thread_id = %request.parent_thread_id,
            model = %model,
            max_iterations,
            "Delegation task created"
        );

        let (thread_id, task_id) = (thread.id.as_str(), task.id.as_str());
        run_notify(&request.hooks, HookPoint::OnTaskCreate, |hook| async move {
            hook.on_task_create(thread_id, task_id).await
        })
        .await;

        self.bus
            .publish(task::created(task_id, thread_id, &request.parent_thread_id))
            .await;

        Ok(CreatedTask {
            task,
            thread,
            parent_thread_id: request.parent_thread_id,
            model,
            hooks: request.hooks,
        })
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// 반복 루프 실행 (승인 또는 소진까지)
    pub async fn run(&self, created: CreatedTask) -> DelegationResult {
        let CreatedTask {
            task,
            thread,
            parent_thread_id,
            model,
            hooks,
        } = created;
        let (task_id, thread_id) = (task.id.as_str(), thread.id.as_str());
        let max_iterations = task.max_iterations;
        let mut feedback: Option<String> = None;

        for iteration in 1..=max_iterations {
            persist(
                self.store.begin_iteration(task_id, iteration),
                task_id,
                "begin iteration",
            );
            debug!(task_id, iteration, max_iterations, "Starting iteration");

            let prompt = build_iteration_prompt(&task.prompt, feedback.as_deref());
            let prompt = run_chain(
                &hooks,
                HookPoint::TransformPrompt,
                prompt,
                |hook, prompt| async move { hook.transform_prompt(thread_id, prompt).await },
            )
            .await;

            persist(
                self.store.append_message(&MessageRecord::user(thread_id, &prompt)),
                task_id,
                "append prompt",
            );

            let result = self.invoke(task_id, thread_id, iteration, &model, &prompt).await;

            persist(
                self.store
                    .append_message(&MessageRecord::assistant(thread_id, &result.output)),
                task_id,
                "append output",
            );
            persist(
                self.usage.record(task_id, thread_id, &model, &prompt, &result),
                task_id,
                "record usage",
            );

            self.dispatch_commands(&hooks, thread_id, &result.output).await;

            if !result.is_success() {
                let message = format!(
                    "Sub-agent invocation failed with exit code {}: {}",
                    result.exit_code.unwrap_or(-1),
                    result.error.as_deref().unwrap_or("unknown error")
                );
                warn!(task_id, iteration, "{}", message);
                feedback = Some(message);
                continue;
            }

            persist(
                self.store.set_task_status(task_id, TaskStatus::Evaluating),
                task_id,
                "set evaluating",
            );

            let verdict = evaluate(&hooks, thread_id, task_id, &result.output).await;
            let accepted = matches!(verdict, Verdict::Accepted);
            self.bus
                .publish(task::evaluated(task_id, thread_id, iteration, accepted))
                .await;

            match verdict {
                Verdict::Accepted => {
                    persist(
                        self.store
                            .finish_task(task_id, TaskStatus::Completed, Some(&result.output)),
                        task_id,
                        "complete task",
                    );
                    self.bus
                        .publish(task::validated(task_id, thread_id, &parent_thread_id, iteration))
                        .await;
                    persist(
                        self.notifier
                            .notify(&Notification::completed(
                                &parent_thread_id,
                                thread_id,
                                task_id,
                                iteration,
                                &result.output,
                            ))
                            .await,
                        task_id,
                        "notify parent",
                    );

                    info!(task_id, iterations = iteration, "Delegation task completed");

                    return DelegationResult {
                        task_id: task.id.clone(),
                        thread_id: thread.id.clone(),
                        status: DelegationStatus::Completed,
                        result: Some(result.output),
                        iterations: iteration,
                    };
                }
                Verdict::Rejected(reason) => {
                    info!(task_id, iteration, feedback = %reason, "Output rejected");
                    self.bus
                        .publish(task::progress(
                            task_id,
                            thread_id,
                            iteration,
                            max_iterations,
                            &reason,
                        ))
                        .await;
                    feedback = Some(reason);
                }
            }
        }

        // 반복 소진 (max_iterations = 0 포함)
        persist(
            self.store.finish_task(task_id, TaskStatus::Failed, None),
            task_id,
            "fail task",
        );

        let error = format!(
            "Task failed after {} iterations. Last feedback: {}",
            max_iterations,
            feedback.as_deref().unwrap_or("none")
        );
        let error_ref = error.as_str();
        run_notify(&hooks, HookPoint::OnTaskFailed, |hook| async move {
            hook.on_task_failed(thread_id, task_id, error_ref).await
        })
        .await;

        self.bus
            .publish(task::failed(
                task_id,
                thread_id,
                &parent_thread_id,
                max_iterations,
                &error,
            ))
            .await;
        persist(
            self.notifier
                .notify(&Notification::failed(
                    &parent_thread_id,
                    thread_id,
                    task_id,
                    max_iterations,
                    feedback.as_deref(),
                ))
                .await,
            task_id,
            "notify parent",
        );

        warn!(task_id, iterations = max_iterations, "Delegation task failed");

        DelegationResult {
            task_id: task.id.clone(),
            thread_id: thread.id.clone(),
            status: DelegationStatus::Failed,
            result: None,
            iterations: max_iterations,
        }
    }

    /// 생성 + 실행
    pub async fn delegate(&self, request: DelegationRequest) -> Result<DelegationResult> {
        let created = self.create(request).await?;
        Ok(self.run(created).await)
    }

    /// Sub-agent 호출, 스트림 이벤트는 `task:stream`으로 재발행
    ///
    /// 호출 에러 (spawn 실패 등)는 exit code -1 의 실패 결과로 변환합니다.
    async fn invoke(
        &self,
        task_id: &str,
        thread_id: &str,
        iteration: u32,
        model: &str,
        prompt: &str,
    ) -> InvocationResult {
        let (tx, mut rx) = mpsc::unbounded_channel::<StreamEvent>();
        let options = InvokeOptions::new()
            .with_model(model)
            .with_stream_callback(Arc::new(move |event: StreamEvent| {
                let _ = tx.send(event);
            }));

        let start = Instant::now();
        let invocation = async {
            let outcome = self.invoker.invoke(prompt, options).await;
            match outcome {
                Ok(result) => result,
                Err(e) => {
                    warn!(
                        task_id,
                        invoker = self.invoker.name(),
                        error = %e,
                        "Sub-agent invocation error"
                    );
                    InvocationResult::from_error(&e, start.elapsed().as_millis() as u64)
                }
            }
        };

        // invoker가 콜백을 계속 들고 있을 수 있으므로 채널 종료가 아니라
        // 호출 완료 시점에 전달을 멈춥니다
        tokio::pin!(invocation);
        let result = loop {
            tokio::select! {
                biased;
                Some(event) = rx.recv() => {
                    self.publish_stream(task_id, thread_id, iteration, event).await;
                }
                result = &mut invocation => break result,
            }
        };

        // 완료 전에 보낸 이벤트는 마저 전달
        while let Ok(event) = rx.try_recv() {
            self.publish_stream(task_id, thread_id, iteration, event).await;
        }
        result
    }

    async fn publish_stream(
        &self,
        task_id: &str,
        thread_id: &str,
        iteration: u32,
        event: StreamEvent,
    ) {
        let payload = serde_json::to_value(&event).unwrap_or(Value::Null);
        self.bus
            .publish(task::stream(task_id, thread_id, iteration, payload))
            .await;
    }

    /// 출력의 slash-command를 `on_command`로 전달 (first-success)
    async fn dispatch_commands(&self, hooks: &HookSet, thread_id: &str, output: &str) {
        for parsed in parse_commands(output) {
            let (command, args) = (parsed.command.as_str(), parsed.args.as_str());
            let claimed = run_first_success(hooks, HookPoint::OnCommand, |hook| async move {
                hook.on_command(thread_id, command, args).await
            })
            .await;
            if !claimed {
                debug!(thread_id, command, "No plugin handled command");
            }
        }
    }
}

/// `on_task_complete` 검증: 첫 번째 실패에서 거부
async fn evaluate(hooks: &HookSet, thread_id: &str, task_id: &str, output: &str) -> Verdict {
    for hook in hooks.iter().filter(|hook| hook.implements(HookPoint::OnTaskComplete)) {
        if let Err(e) = hook.on_task_complete(thread_id, task_id, output).await {
            let cause = e.to_string();
            debug!(hook = hook.name(), task_id, cause = %cause, "Validation hook rejected output");
            return if cause.trim().is_empty() {
                Verdict::Rejected(REJECTED_WITHOUT_FEEDBACK.to_string())
            } else {
                Verdict::Rejected(format!("Validation hook error: {}", cause))
            };
        }
    }
    Verdict::Accepted
}

/// 생성 이후 저장 실패는 로그만
fn persist<T>(result: Result<T>, task_id: &str, step: &'static str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(task_id, step, error = %e, "Failed to persist delegation state");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_foundation::Storage;

    #[test]
    fn test_request_builder() {
        let request = DelegationRequest::new("parent", "do it")
            .with_model("opus")
            .with_max_iterations(2);
        assert_eq!(request.model.as_deref(), Some("opus"));
        assert_eq!(request.max_iterations, Some(2));
        assert!(request.hooks.is_empty());
    }

    #[test]
    fn test_settings_from_config() {
        let config = RelayConfig::new()
            .default_model("haiku")
            .default_max_iterations(7);
        let settings = EngineSettings::from(&config);
        assert_eq!(settings.default_model, "haiku");
        assert_eq!(settings.default_max_iterations, 7);
    }

    #[test]
    fn test_persist_swallows_errors() {
        let ok: Option<u32> = persist(Ok(3), "t", "step");
        assert_eq!(ok, Some(3));
        let err: Option<u32> = persist(Err(Error::Storage("disk".into())), "t", "step");
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn test_create_requires_existing_parent() {
        struct Never;

        #[async_trait::async_trait]
        impl SubAgentInvoker for Never {
            fn name(&self) -> &str {
                "never"
            }

            async fn invoke(
                &self,
                _prompt: &str,
                _options: InvokeOptions,
            ) -> std::result::Result<InvocationResult, relay_provider::ProviderError> {
                unreachable!("create never invokes")
            }
        }

        let storage = Arc::new(Storage::in_memory().unwrap());
        let engine = DelegationEngine::new(storage, Arc::new(Never), Arc::new(EventBus::new()));

        let err = engine
            .create(DelegationRequest::new("missing", "prompt"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ThreadNotFound(id) if id == "missing"));

        let err = engine
            .create(DelegationRequest::new("missing", "   "))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
