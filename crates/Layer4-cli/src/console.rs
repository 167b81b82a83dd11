//! Console event listener
//!
//! 위임 라이프사이클 이벤트를 stdout에 출력합니다. 로그는 stderr로 가므로
//! stdout은 대화 출력만 남습니다.

use async_trait::async_trait;
use relay_foundation::event::{task, thread};
use relay_foundation::strings::{truncate_chars, truncate_with_ellipsis};
use relay_foundation::{DelegationStore, EventCategory, EventListener, MessageRole, RelayEvent};
use std::sync::Arc;

/// 짧은 id 표시 길이
const SHORT_ID: usize = 8;

/// 피드백 표시 최대 길이
const FEEDBACK_PREVIEW: usize = 120;

/// 브로드캐스트 출력 리스너
pub struct ConsoleListener {
    store: Arc<dyn DelegationStore>,
    /// sub-agent 출력 줄까지 표시
    stream: bool,
}

impl ConsoleListener {
    pub fn new(store: Arc<dyn DelegationStore>, stream: bool) -> Self {
        Self { store, stream }
    }

    /// 부모 스레드에 저장된 알림 본문
    fn notification_content(&self, event: &RelayEvent) -> Option<String> {
        let parent = event.data_str("parentThreadId")?;
        let task_id = event.data_str("taskId")?;
        let messages = self.store.get_messages(parent).ok()?;
        messages
            .into_iter()
            .rev()
            .filter(|message| message.role == MessageRole::System)
            .find(|message| {
                message
                    .metadata
                    .as_ref()
                    .and_then(|metadata| metadata.get("taskId"))
                    .and_then(|value| value.as_str())
                    == Some(task_id)
            })
            .map(|message| message.content)
    }
}

fn short(id: &str) -> &str {
    truncate_chars(id, SHORT_ID)
}

/// 이벤트 한 줄 표시 (표시하지 않는 이벤트는 `None`)
pub fn format_event(event: &RelayEvent, stream: bool) -> Option<String> {
    let task_id = event.data_str("taskId").map(short).unwrap_or("?");

    match event.event_type.as_str() {
        task::CREATED => Some(format!(
            "[task {}] created (thread {})",
            task_id,
            event.data_str("threadId").map(short).unwrap_or("?")
        )),
        task::STREAM if stream => {
            let line = event.data["event"]["data"].as_str()?;
            match event.data["event"]["type"].as_str()? {
                "output" => Some(format!("[task {}] │ {}", task_id, line)),
                "diagnostic" => Some(format!("[task {}] ! {}", task_id, line)),
                _ => None,
            }
        }
        task::PROGRESS => Some(format!(
            "[task {}] iteration {}/{} rejected: {}",
            task_id,
            event.data["iteration"],
            event.data["maxIterations"],
            truncate_with_ellipsis(event.data_str("feedback").unwrap_or(""), FEEDBACK_PREVIEW)
        )),
        task::VALIDATED => Some(format!(
            "[task {}] accepted after {} iteration(s)",
            task_id, event.data["iterations"]
        )),
        task::FAILED => Some(format!(
            "[task {}] failed after {} iteration(s)",
            task_id, event.data["iterations"]
        )),
        _ => None,
    }
}

#[async_trait]
impl EventListener for ConsoleListener {
    fn name(&self) -> &str {
        "console"
    }

    fn categories(&self) -> Option<Vec<EventCategory>> {
        Some(vec![EventCategory::Task, EventCategory::Thread])
    }

    async fn on_event(&self, event: &RelayEvent) {
        if event.event_type == thread::NOTIFICATION {
            match self.notification_content(event) {
                Some(content) => println!("📬 {}", content),
                None => println!(
                    "📬 task {} {}",
                    event.data_str("taskId").map(short).unwrap_or("?"),
                    event.data_str("status").unwrap_or("finished")
                ),
            }
            return;
        }

        if let Some(line) = format_event(event, self.stream) {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_lifecycle_events() {
        let created = task::created("task-123456789", "thread-abcdefgh", "parent");
        assert_eq!(
            format_event(&created, false).unwrap(),
            "[task task-123] created (thread thread-a)"
        );

        let progress = task::progress("t1", "th1", 2, 5, "Validation hook error: tests fail");
        assert_eq!(
            format_event(&progress, false).unwrap(),
            "[task t1] iteration 2/5 rejected: Validation hook error: tests fail"
        );

        let failed = task::failed("t1", "th1", "p", 3, "boom");
        assert_eq!(
            format_event(&failed, false).unwrap(),
            "[task t1] failed after 3 iteration(s)"
        );
    }

    #[test]
    fn test_stream_lines_only_when_enabled() {
        let event = task::stream("t1", "th1", 1, json!({ "type": "output", "data": "hello" }));
        assert!(format_event(&event, false).is_none());
        assert_eq!(format_event(&event, true).unwrap(), "[task t1] │ hello");

        let exited = task::stream("t1", "th1", 1, json!({ "type": "exited", "data": 0 }));
        assert!(format_event(&exited, true).is_none());
    }
}
