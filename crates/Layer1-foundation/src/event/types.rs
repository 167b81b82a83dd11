//! Event Types - 브로드캐스트 이벤트 정의
//!
//! 이벤트 이름은 `<category>:<action>` 형식이며 (`task:created`),
//! 데이터는 camelCase JSON 입니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ============================================================================
// Event ID
// ============================================================================

/// 이벤트 고유 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Event Category
// ============================================================================

/// 이벤트 카테고리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// 시스템 이벤트 (시작, 종료)
    System,
    /// 위임 작업 라이프사이클
    Task,
    /// 스레드 간 알림
    Thread,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Task => "task",
            Self::Thread => "thread",
        }
    }
}

// ============================================================================
// Event Severity
// ============================================================================

/// 이벤트 심각도
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

// ============================================================================
// RelayEvent
// ============================================================================

/// 브로드캐스트 이벤트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayEvent {
    pub id: EventId,

    /// 이벤트 이름 (예: "task:created", "thread:notification")
    pub event_type: String,

    pub category: EventCategory,

    pub severity: EventSeverity,

    pub timestamp: DateTime<Utc>,

    /// 이벤트 소스 (모듈)
    pub source: String,

    /// 이벤트 데이터 (camelCase JSON)
    pub data: Value,
}

impl RelayEvent {
    pub fn new(event_type: impl Into<String>, category: EventCategory) -> Self {
        Self {
            id: EventId::new(),
            event_type: event_type.into(),
            category,
            severity: EventSeverity::Info,
            timestamp: Utc::now(),
            source: String::new(),
            data: Value::Null,
        }
    }

    pub fn with_severity(mut self, severity: EventSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// 데이터 필드 조회 (문자열)
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

// ============================================================================
// 사전 정의된 이벤트 타입들
// ============================================================================

/// 위임 작업 이벤트
pub mod task {
    use super::*;

    pub const CREATED: &str = "task:created";
    pub const STREAM: &str = "task:stream";
    pub const EVALUATED: &str = "task:evaluated";
    pub const VALIDATED: &str = "task:validated";
    pub const PROGRESS: &str = "task:progress";
    pub const FAILED: &str = "task:failed";

    fn event(name: &str) -> RelayEvent {
        RelayEvent::new(name, EventCategory::Task).with_source("delegation")
    }

    /// 작업 생성
    pub fn created(task_id: &str, thread_id: &str, parent_thread_id: &str) -> RelayEvent {
        event(CREATED).with_data(json!({
            "taskId": task_id,
            "threadId": thread_id,
            "parentThreadId": parent_thread_id,
        }))
    }

    /// Sub-agent 스트림 이벤트 전달
    pub fn stream(task_id: &str, thread_id: &str, iteration: u32, stream_event: Value) -> RelayEvent {
        event(STREAM)
            .with_severity(EventSeverity::Debug)
            .with_data(json!({
                "taskId": task_id,
                "threadId": thread_id,
                "iteration": iteration,
                "event": stream_event,
            }))
    }

    /// 검증 결과
    pub fn evaluated(task_id: &str, thread_id: &str, iteration: u32, accepted: bool) -> RelayEvent {
        event(EVALUATED).with_data(json!({
            "taskId": task_id,
            "threadId": thread_id,
            "iteration": iteration,
            "accepted": accepted,
        }))
    }

    /// 작업 승인 (완료)
    pub fn validated(
        task_id: &str,
        thread_id: &str,
        parent_thread_id: &str,
        iterations: u32,
    ) -> RelayEvent {
        event(VALIDATED).with_data(json!({
            "taskId": task_id,
            "threadId": thread_id,
            "parentThreadId": parent_thread_id,
            "iterations": iterations,
        }))
    }

    /// 거부 후 재시도
    pub fn progress(
        task_id: &str,
        thread_id: &str,
        iteration: u32,
        max_iterations: u32,
        feedback: &str,
    ) -> RelayEvent {
        event(PROGRESS).with_data(json!({
            "taskId": task_id,
            "threadId": thread_id,
            "iteration": iteration,
            "maxIterations": max_iterations,
            "status": "rejected",
            "feedback": feedback,
        }))
    }

    /// 반복 횟수 소진
    pub fn failed(
        task_id: &str,
        thread_id: &str,
        parent_thread_id: &str,
        iterations: u32,
        error: &str,
    ) -> RelayEvent {
        event(FAILED)
            .with_severity(EventSeverity::Warning)
            .with_data(json!({
                "taskId": task_id,
                "threadId": thread_id,
                "parentThreadId": parent_thread_id,
                "iterations": iterations,
                "error": error,
            }))
    }
}

/// 스레드 이벤트
pub mod thread {
    use super::*;

    pub const NOTIFICATION: &str = "thread:notification";

    /// 부모 스레드 알림
    pub fn notification(
        parent_thread_id: &str,
        task_thread_id: &str,
        task_id: &str,
        status: &str,
    ) -> RelayEvent {
        RelayEvent::new(NOTIFICATION, EventCategory::Thread)
            .with_source("notifier")
            .with_data(json!({
                "parentThreadId": parent_thread_id,
                "taskThreadId": task_thread_id,
                "taskId": task_id,
                "status": status,
            }))
    }
}

/// 시스템 이벤트
pub mod system {
    use super::*;

    pub fn started(version: &str) -> RelayEvent {
        RelayEvent::new("system:started", EventCategory::System)
            .with_source("relay")
            .with_data(json!({ "version": version }))
    }

    pub fn shutdown(reason: &str) -> RelayEvent {
        RelayEvent::new("system:shutdown", EventCategory::System)
            .with_source("relay")
            .with_data(json!({ "reason": reason }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_payload_keys() {
        let event = task::progress("t1", "th1", 2, 5, "try again");
        assert_eq!(event.event_type, "task:progress");
        assert_eq!(event.category, EventCategory::Task);
        assert_eq!(event.data["maxIterations"], 5);
        assert_eq!(event.data["status"], "rejected");
        assert_eq!(event.data_str("feedback"), Some("try again"));
    }

    #[test]
    fn test_notification_payload_keys() {
        let event = thread::notification("parent", "child", "t1", "completed");
        assert_eq!(event.event_type, "thread:notification");
        assert_eq!(event.data_str("parentThreadId"), Some("parent"));
        assert_eq!(event.data_str("taskThreadId"), Some("child"));
        assert_eq!(event.data_str("status"), Some("completed"));
    }
}
