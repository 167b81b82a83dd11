//! Persistence gateway used by the delegation engine
//!
//! [`Storage`](super::Storage) 가 SQLite로 구현합니다. 하나의 논리적 단계
//! (Thread+Task 생성, 상태 전이, AgentRun+메트릭 기록)는 하나의 트랜잭션입니다.

use super::records::{
    AgentRunRecord, MessageRecord, TaskRecord, TaskStatus, ThreadRecord, UsageMetricRecord,
};
use crate::Result;

/// Persistence gateway for threads, tasks, messages and usage
pub trait DelegationStore: Send + Sync {
    // ========================================================================
    // Threads
    // ========================================================================

    /// Create a standalone thread (conversation threads)
    fn create_thread(&self, thread: &ThreadRecord) -> Result<()>;

    /// Create a task thread and its task in one transaction
    fn create_task_thread(&self, thread: &ThreadRecord, task: &TaskRecord) -> Result<()>;

    fn get_thread(&self, id: &str) -> Result<Option<ThreadRecord>>;

    /// Most recently updated threads first
    fn list_threads(&self, limit: Option<u32>) -> Result<Vec<ThreadRecord>>;

    // ========================================================================
    // Tasks
    // ========================================================================

    fn get_task(&self, id: &str) -> Result<Option<TaskRecord>>;

    /// Set `current_iteration` and move the task to `running`
    fn begin_iteration(&self, task_id: &str, iteration: u32) -> Result<()>;

    fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<()>;

    /// Terminal transition of a task and its thread
    ///
    /// `result` is stored only for [`TaskStatus::Completed`].
    fn finish_task(&self, task_id: &str, status: TaskStatus, result: Option<&str>) -> Result<()>;

    // ========================================================================
    // Messages
    // ========================================================================

    fn append_message(&self, message: &MessageRecord) -> Result<()>;

    /// Messages of a thread in insertion order
    fn get_messages(&self, thread_id: &str) -> Result<Vec<MessageRecord>>;

    // ========================================================================
    // Usage
    // ========================================================================

    /// Write an agent run and its metrics in one transaction
    fn record_agent_run(&self, run: &AgentRunRecord, metrics: &[UsageMetricRecord]) -> Result<()>;

    fn get_agent_runs(&self, task_id: &str) -> Result<Vec<AgentRunRecord>>;

    fn get_usage_metrics(&self, run_id: &str) -> Result<Vec<UsageMetricRecord>>;
}
