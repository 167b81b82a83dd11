//! Storage module for Relay
//!
//! - `db`: SQLite - 런타임 데이터 (스레드, 메시지, 작업, 사용량)
//! - `json`: JSON - 범용 파일 저장/로드

mod db;
mod gateway;
mod json;
mod records;

// SQLite Storage (런타임 데이터)
pub use db::{Storage, DATABASE_FILE};
pub use gateway::DelegationStore;
pub use records::{
    now_rfc3339, AgentRunRecord, AgentRunStatus, MessageRecord, MessageRole, TaskRecord,
    TaskStatus, ThreadKind, ThreadRecord, ThreadStatus, UsageMetricRecord,
};

// JSON Storage (범용)
pub use json::JsonStore;
