//! Record types persisted by [`Storage`](super::Storage)
//!
//! Thread / Task / Message / AgentRun / UsageMetric

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 현재 시각 (RFC 3339)
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ============================================================================
// Status enums
// ============================================================================

/// Delegated task status
///
/// `pending → running ⇄ evaluating → {completed | failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Evaluating,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Evaluating => "evaluating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "evaluating" => Some(Self::Evaluating),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal state (cannot transition further)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 스레드 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadKind {
    /// 일반 대화 스레드
    Conversation,
    /// 위임 작업 전용 스레드
    Task,
}

impl ThreadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conversation => "conversation",
            Self::Task => "task",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "conversation" => Some(Self::Conversation),
            "task" => Some(Self::Task),
            _ => None,
        }
    }
}

/// 스레드 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    Active,
    Completed,
    Failed,
}

impl ThreadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// Sub-agent invocation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRunStatus {
    Completed,
    Failed,
}

impl AgentRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// Thread record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub id: String,
    pub kind: ThreadKind,
    pub status: ThreadStatus,
    pub name: Option<String>,
    /// 위임을 요청한 대화 스레드
    pub parent_thread_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ThreadRecord {
    /// 일반 대화 스레드 생성
    pub fn conversation(name: Option<String>) -> Self {
        let now = now_rfc3339();
        Self {
            id: new_id(),
            kind: ThreadKind::Conversation,
            status: ThreadStatus::Active,
            name,
            parent_thread_id: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// 위임 작업 스레드 생성
    pub fn task(parent_thread_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = now_rfc3339();
        Self {
            id: new_id(),
            kind: ThreadKind::Task,
            status: ThreadStatus::Active,
            name: Some(name.into()),
            parent_thread_id: Some(parent_thread_id.into()),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    /// Always the task's own thread, never the parent's
    pub thread_id: String,
    pub prompt: String,
    pub status: TaskStatus,
    pub max_iterations: u32,
    pub current_iteration: u32,
    pub model: Option<String>,
    /// Present only once completed
    pub result: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

impl TaskRecord {
    pub fn new(
        thread_id: impl Into<String>,
        prompt: impl Into<String>,
        max_iterations: u32,
        model: Option<String>,
    ) -> Self {
        let now = now_rfc3339();
        Self {
            id: new_id(),
            thread_id: thread_id.into(),
            prompt: prompt.into(),
            status: TaskStatus::Pending,
            max_iterations,
            current_iteration: 0,
            model,
            result: None,
            created_at: now.clone(),
            updated_at: now,
            completed_at: None,
        }
    }
}

/// Message record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub thread_id: String,
    pub role: MessageRole,
    pub content: String,
    /// Structured metadata (JSON)
    pub metadata: Option<Value>,
    pub created_at: String,
}

impl MessageRecord {
    pub fn new(thread_id: impl Into<String>, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            thread_id: thread_id.into(),
            role,
            content: content.into(),
            metadata: None,
            created_at: now_rfc3339(),
        }
    }

    pub fn user(thread_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(thread_id, MessageRole::User, content)
    }

    pub fn assistant(thread_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(thread_id, MessageRole::Assistant, content)
    }

    pub fn system(thread_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(thread_id, MessageRole::System, content)
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// One sub-agent invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRunRecord {
    pub id: String,
    pub task_id: String,
    pub thread_id: String,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// USD
    pub cost_estimate: f64,
    pub duration_ms: u64,
    pub status: AgentRunStatus,
    pub error: Option<String>,
    pub completed_at: String,
}

impl AgentRunRecord {
    pub fn new(task_id: impl Into<String>, thread_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            task_id: task_id.into(),
            thread_id: thread_id.into(),
            model: model.into(),
            input_tokens: 0,
            output_tokens: 0,
            cost_estimate: 0.0,
            duration_ms: 0,
            status: AgentRunStatus::Completed,
            error: None,
            completed_at: now_rfc3339(),
        }
    }
}

/// Usage metric sample (`token.input`, `token.output`, `token.total`, `token.cost`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageMetricRecord {
    pub id: Option<i64>,
    pub run_id: String,
    pub name: String,
    pub value: f64,
    pub model: String,
    pub recorded_at: String,
}

impl UsageMetricRecord {
    pub fn new(run_id: impl Into<String>, name: impl Into<String>, value: f64, model: impl Into<String>) -> Self {
        Self {
            id: None,
            run_id: run_id.into(),
            name: name.into(),
            value,
            model: model.into(),
            recorded_at: now_rfc3339(),
        }
    }
}
