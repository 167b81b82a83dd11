//! # relay-foundation
//!
//! Foundation layer for Relay:
//! - Error: 공통 에러 타입 (`Error`, `Result`)
//! - Config: 통합 설정 (`RelayConfig`, JSON 글로벌 + 프로젝트 병합)
//! - Storage: SQLite (스레드, 메시지, 작업, 사용량), JsonStore (범용)
//! - Event: 이벤트 버스 (위임 작업 라이프사이클 브로드캐스트)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Layer3: DelegationEngine                                │
//! │     │                    │                    │          │
//! │     ▼                    ▼                    ▼          │
//! │  DelegationStore      EventBus            RelayConfig    │
//! │  (Storage: SQLite)    (listeners,         (JsonStore)    │
//! │                        history)                          │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod storage;
pub mod strings;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    PricingEntry, RelayConfig, SubAgentConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_MODEL,
    DEFAULT_SUBAGENT_COMMAND, RELAY_CONFIG_FILE,
};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{
    // JSON (범용)
    JsonStore,
    // SQLite (런타임 데이터)
    AgentRunRecord,
    AgentRunStatus,
    DelegationStore,
    MessageRecord,
    MessageRole,
    Storage,
    TaskRecord,
    TaskStatus,
    ThreadKind,
    ThreadRecord,
    ThreadStatus,
    UsageMetricRecord,
};

// ============================================================================
// Event (이벤트 시스템)
// ============================================================================
pub use event::{
    EventBus, EventBusConfig, EventCategory, EventFilter, EventId, EventListener, EventSeverity,
    ListenerId, RelayEvent,
};
