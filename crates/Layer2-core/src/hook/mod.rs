//! # Hook System
//!
//! 플러그인 콜백을 여러 플러그인에 걸쳐 실행하는 전략 모음.
//!
//! ## 콜백 지점
//!
//! - `onTaskCreate`: 위임 작업 생성 (notify)
//! - `onTaskComplete`: Sub-agent 출력 검증, 실패 = 거부
//! - `onTaskFailed`: 반복 소진 (notify)
//! - `onCommand`: 출력 내 slash-command (first-success)
//! - `transformPrompt`: 프롬프트 변환 (chain)
//!
//! ## 예시
//!
//! ```ignore
//! let hooks = registry.snapshot();
//! let claimed = run_first_success(&hooks, HookPoint::OnCommand, |hook| async move {
//!     hook.on_command(&thread_id, &cmd.command, &cmd.args).await
//! })
//! .await;
//! ```

mod runner;
mod types;

pub use runner::{run_chain, run_first_success, run_notify};
pub use types::{value_to_text, HookFailure, HookPoint, HookSet};
