//! relay-core: Hook substrate for Relay
//!
//! Layer2 - 플러그인 / hook / 명령어 파싱
//!
//! # 주요 모듈
//!
//! - `plugin`: `PluginHooks` 트레이트, `PluginRegistry`, 내장 플러그인
//! - `hook`: 세 가지 실행 전략 (notify, first-success, chain)
//! - `command`: slash-command 추출, `/delegate` 인자 파싱
//!
//! # 사용 예시
//!
//! ```ignore
//! use relay_core::{parse_commands, run_first_success, HookPoint, PluginRegistry};
//!
//! let registry = PluginRegistry::new();
//! registry.register(Arc::new(CheckinPlugin::new()));
//!
//! let hooks = registry.snapshot();
//! for cmd in parse_commands(&output) {
//!     run_first_success(&hooks, HookPoint::OnCommand, |hook| {
//!         let (thread_id, cmd) = (&thread_id, &cmd);
//!         async move { hook.on_command(thread_id, &cmd.command, &cmd.args).await }
//!     })
//!     .await;
//! }
//! ```

pub mod command;
pub mod hook;
pub mod plugin;

// Re-exports: Command
pub use command::{
    parse_command_line, parse_commands, parse_delegate_args, DelegateArgs, DelegateArgsError,
    ParsedCommand,
};

// Re-exports: Hook
pub use hook::{run_chain, run_first_success, run_notify, HookFailure, HookPoint, HookSet};

// Re-exports: Plugin
pub use plugin::builtin::{CheckIn, CheckinPlugin, LoggingPlugin, ShellValidator};
pub use plugin::{PluginHooks, PluginRegistry};
