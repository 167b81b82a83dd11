//! # Plugin System
//!
//! 위임 작업 라이프사이클에 참여하는 플러그인.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                PluginRegistry                  │
//! │  ┌──────────┬──────────┬──────────────────┐   │
//! │  │ logging  │ checkin  │ shell-validator  │   │
//! │  └──────────┴──────────┴──────────────────┘   │
//! │                    │ snapshot()                │
//! │                    ▼                           │
//! │        HookSet (불변, 요청마다 전달)            │
//! └───────────────────────────────────────────────┘
//! ```

pub mod builtin;
mod registry;
mod traits;

pub use registry::PluginRegistry;
pub use traits::PluginHooks;
