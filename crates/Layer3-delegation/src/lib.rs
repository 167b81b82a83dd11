//! # relay-delegation
//!
//! 위임 작업 라이프사이클 엔진입니다. 대화 스레드에서 `/delegate`로 요청된
//! 작업을 별도 task 스레드에서 sub-agent에게 맡기고, plugin 검증을 통과할 때까지
//! (또는 `max_iterations` 소진까지) 피드백과 함께 재시도합니다.
//!
//! ## 핵심 컴포넌트
//!
//! - **DelegationEngine**: 상태 머신 (`pending → running ⇄ evaluating → completed | failed`)
//! - **DelegationSupervisor**: 백그라운드 실행 + 종료 시 drain
//! - **DelegationCommands**: `/delegate`, `/re-delegate` 처리
//! - **UsageRecorder**: 호출별 토큰/비용 기록
//! - **ThreadNotifier**: 부모 스레드 알림
//!
//! ## 사용 예
//!
//! ```ignore
//! use relay_delegation::{DelegationEngine, DelegationRequest, DelegationSupervisor};
//!
//! let engine = Arc::new(DelegationEngine::from_config(&config, store, invoker, bus));
//! let supervisor = DelegationSupervisor::new(engine);
//!
//! let launched = supervisor
//!     .launch(DelegationRequest::new(&thread_id, "Write the parser").with_hooks(registry.snapshot()))
//!     .await?;
//!
//! // 종료 시 진행 중인 위임 완료 대기
//! supervisor.shutdown().await;
//! ```

pub mod commands;
pub mod engine;
pub mod error;
pub mod notifier;
pub mod prompt;
pub mod supervisor;
pub mod usage;

pub use commands::DelegationCommands;
pub use engine::{
    CreatedTask, DelegationEngine, DelegationRequest, DelegationResult, DelegationStatus,
    EngineSettings,
};
pub use error::DelegationError;
pub use notifier::{Notification, ThreadNotifier};
pub use prompt::build_iteration_prompt;
pub use supervisor::{DelegationSupervisor, LaunchedTask};
pub use usage::{estimate_tokens, UsageRecorder};
