//! Cross-thread notification
//!
//! 위임 작업이 끝나면 부모 스레드에 system 메시지를 남기고
//! `thread:notification` 이벤트를 발행합니다.

use relay_foundation::event::thread;
use relay_foundation::strings::truncate_chars;
use relay_foundation::{DelegationStore, EventBus, MessageRecord, Result, TaskStatus};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// 성공 요약 최대 길이 (문자)
pub const SUMMARY_MAX_CHARS: usize = 200;

/// 실패 시 피드백이 없을 때
pub const NO_FEEDBACK: &str = "No feedback available.";

/// 메시지 metadata `type`
pub const NOTIFICATION_TYPE: &str = "cross-thread-notification";

/// 알림 한 건
#[derive(Debug, Clone)]
pub struct Notification<'a> {
    pub parent_thread_id: &'a str,
    pub task_thread_id: &'a str,
    pub task_id: &'a str,
    pub status: TaskStatus,
    pub iterations: u32,
    pub summary: String,
}

impl<'a> Notification<'a> {
    /// 승인된 출력 요약 (200자)
    pub fn completed(
        parent_thread_id: &'a str,
        task_thread_id: &'a str,
        task_id: &'a str,
        iterations: u32,
        output: &str,
    ) -> Self {
        Self {
            parent_thread_id,
            task_thread_id,
            task_id,
            status: TaskStatus::Completed,
            iterations,
            summary: truncate_chars(output, SUMMARY_MAX_CHARS).to_string(),
        }
    }

    /// 마지막 피드백 요약
    pub fn failed(
        parent_thread_id: &'a str,
        task_thread_id: &'a str,
        task_id: &'a str,
        iterations: u32,
        last_feedback: Option<&str>,
    ) -> Self {
        Self {
            parent_thread_id,
            task_thread_id,
            task_id,
            status: TaskStatus::Failed,
            iterations,
            summary: last_feedback.unwrap_or(NO_FEEDBACK).to_string(),
        }
    }

    /// `Task completed after 2 iteration(s): ...`
    pub fn content(&self) -> String {
        format!(
            "Task {} after {} iteration(s): {}",
            self.status, self.iterations, self.summary
        )
    }
}

/// 부모 스레드 알림
#[derive(Clone)]
pub struct ThreadNotifier {
    store: Arc<dyn DelegationStore>,
    bus: Arc<EventBus>,
}

impl ThreadNotifier {
    pub fn new(store: Arc<dyn DelegationStore>, bus: Arc<EventBus>) -> Self {
        Self { store, bus }
    }

    /// system 메시지 저장 후 브로드캐스트
    pub async fn notify(&self, notification: &Notification<'_>) -> Result<MessageRecord> {
        let message = MessageRecord::system(notification.parent_thread_id, notification.content())
            .with_metadata(json!({
                "type": NOTIFICATION_TYPE,
                "sourceThreadId": notification.task_thread_id,
                "taskId": notification.task_id,
                "status": notification.status.as_str(),
                "iterations": notification.iterations,
            }));
        self.store.append_message(&message)?;

        info!(
            parent_thread_id = notification.parent_thread_id,
            task_id = notification.task_id,
            status = %notification.status,
            "Notified parent thread"
        );

        self.bus
            .publish(thread::notification(
                notification.parent_thread_id,
                notification.task_thread_id,
                notification.task_id,
                notification.status.as_str(),
            ))
            .await;

        Ok(message)
    }
}
