//! Event Bus - 이벤트 브로드캐스트
//!
//! 한 번의 `publish`는 세 곳으로 전달됩니다:
//! 1. 히스토리 (최근 N개, 발행순)
//! 2. `broadcast` 채널 (`receiver()` 구독자)
//! 3. 등록된 리스너 (필터 통과 시, 등록 순서대로 await)

use super::types::{EventCategory, EventSeverity, RelayEvent};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, trace};

// ============================================================================
// EventListener
// ============================================================================

/// 리스너 등록 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// 이벤트 리스너
#[async_trait]
pub trait EventListener: Send + Sync {
    fn name(&self) -> &str;

    /// 받을 카테고리 (`None` = 전부)
    fn categories(&self) -> Option<Vec<EventCategory>> {
        None
    }

    async fn on_event(&self, event: &RelayEvent);
}

// ============================================================================
// EventFilter
// ============================================================================

/// 이벤트 필터 (설정된 조건 모두 만족해야 통과)
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub categories: Option<Vec<EventCategory>>,

    /// 이벤트 이름 prefix (예: `"task:"`)
    pub event_types: Option<Vec<String>>,

    pub min_severity: Option<EventSeverity>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_types(mut self, types: Vec<String>) -> Self {
        self.event_types = Some(types);
        self
    }

    pub fn with_min_severity(mut self, severity: EventSeverity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    pub fn matches(&self, event: &RelayEvent) -> bool {
        let category_ok = self
            .categories
            .as_ref()
            .map_or(true, |categories| categories.contains(&event.category));
        let type_ok = self.event_types.as_ref().map_or(true, |prefixes| {
            prefixes
                .iter()
                .any(|prefix| event.event_type.starts_with(prefix.as_str()))
        });
        let severity_ok = self.min_severity.map_or(true, |min| event.severity >= min);

        category_ok && type_ok && severity_ok
    }
}

// ============================================================================
// EventBus
// ============================================================================

/// 이벤트 버스 설정
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// `broadcast` 채널 용량 (느린 수신자는 lag)
    pub channel_capacity: usize,

    /// 히스토리 보관 개수
    pub history_size: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            history_size: 1000,
        }
    }
}

struct Subscription {
    id: ListenerId,
    listener: Arc<dyn EventListener>,
    filter: EventFilter,
}

/// 이벤트 버스
///
/// 위임 엔진, 알림, 콘솔 출력이 하나의 버스를 공유합니다 (전역 인스턴스 없음).
///
/// ```ignore
/// let bus = Arc::new(EventBus::new());
/// let id = bus.subscribe(Arc::new(ConsoleListener::new(store, false))).await;
/// bus.publish(task::created(&task_id, &thread_id, &parent_id)).await;
/// bus.unsubscribe(id).await;
/// ```
pub struct EventBus {
    sender: broadcast::Sender<RelayEvent>,
    subscriptions: RwLock<Vec<Subscription>>,
    history: RwLock<VecDeque<RelayEvent>>,
    history_size: usize,
    next_listener: AtomicU64,
    published: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            subscriptions: RwLock::new(Vec::new()),
            history: RwLock::new(VecDeque::with_capacity(config.history_size.min(1024))),
            history_size: config.history_size,
            next_listener: AtomicU64::new(1),
            published: AtomicU64::new(0),
        }
    }

    /// 리스너 등록 (`categories()` 기준 필터)
    pub async fn subscribe(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        let filter = EventFilter {
            categories: listener.categories(),
            ..Default::default()
        };
        self.subscribe_with_filter(listener, filter).await
    }

    pub async fn subscribe_with_filter(
        &self,
        listener: Arc<dyn EventListener>,
        filter: EventFilter,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        debug!(listener = listener.name(), listener_id = %id, "Event listener subscribed");

        self.subscriptions.write().await.push(Subscription {
            id,
            listener,
            filter,
        });
        id
    }

    pub async fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut subscriptions = self.subscriptions.write().await;
        let before = subscriptions.len();
        subscriptions.retain(|subscription| subscription.id != id);
        before != subscriptions.len()
    }

    /// 이벤트 발행
    pub async fn publish(&self, event: RelayEvent) {
        let seq = self.published.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(seq, event_type = %event.event_type, "Publishing event");

        if self.history_size > 0 {
            let mut history = self.history.write().await;
            if history.len() == self.history_size {
                history.pop_front();
            }
            history.push_back(event.clone());
        }

        // 수신자가 없으면 Err, 무시
        let _ = self.sender.send(event.clone());

        // 리스너 안에서 다시 publish 할 수 있으므로 락을 놓고 호출
        let targets: Vec<Arc<dyn EventListener>> = self
            .subscriptions
            .read()
            .await
            .iter()
            .filter(|subscription| subscription.filter.matches(&event))
            .map(|subscription| Arc::clone(&subscription.listener))
            .collect();

        for listener in targets {
            listener.on_event(&event).await;
        }
    }

    pub fn receiver(&self) -> broadcast::Receiver<RelayEvent> {
        self.sender.subscribe()
    }

    /// 최근 이벤트 (발행순, `limit`이면 마지막 N개)
    pub async fn history(&self, limit: Option<usize>) -> Vec<RelayEvent> {
        let history = self.history.read().await;
        let skip = limit.map_or(0, |limit| history.len().saturating_sub(limit));
        history.iter().skip(skip).cloned().collect()
    }

    /// 지금까지 발행된 이벤트 수
    pub fn event_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::types::{task, thread};
    use std::sync::Mutex;

    /// 받은 이벤트 이름 기록
    struct Recorder {
        seen: Mutex<Vec<String>>,
        categories: Option<Vec<EventCategory>>,
    }

    impl Recorder {
        fn new(categories: Option<Vec<EventCategory>>) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                categories,
            })
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventListener for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn categories(&self) -> Option<Vec<EventCategory>> {
            self.categories.clone()
        }

        async fn on_event(&self, event: &RelayEvent) {
            self.seen.lock().unwrap().push(event.event_type.clone());
        }
    }

    #[tokio::test]
    async fn test_subscribe_and_unsubscribe() {
        let bus = EventBus::new();
        let recorder = Recorder::new(None);

        let id = bus.subscribe(recorder.clone()).await;

        bus.publish(task::created("t1", "th1", "p1")).await;
        assert_eq!(recorder.seen(), vec![task::CREATED]);

        assert!(bus.unsubscribe(id).await);
        assert!(!bus.unsubscribe(id).await);
        bus.publish(task::created("t2", "th2", "p1")).await;
        assert_eq!(recorder.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_listener_categories() {
        let bus = EventBus::new();
        let recorder = Recorder::new(Some(vec![EventCategory::Thread]));
        bus.subscribe(recorder.clone()).await;

        bus.publish(task::created("t1", "th1", "p1")).await;
        bus.publish(thread::notification("p1", "th1", "t1", "completed"))
            .await;

        assert_eq!(recorder.seen(), vec![thread::NOTIFICATION]);
    }

    #[tokio::test]
    async fn test_explicit_filter() {
        let bus = EventBus::new();
        let recorder = Recorder::new(None);
        bus.subscribe_with_filter(
            recorder.clone(),
            EventFilter::new().with_min_severity(EventSeverity::Warning),
        )
        .await;

        bus.publish(task::evaluated("t1", "th1", 1, false)).await;
        bus.publish(task::failed("t1", "th1", "p1", 1, "boom")).await;

        assert_eq!(recorder.seen(), vec![task::FAILED]);
    }

    #[tokio::test]
    async fn test_receiver_gets_events() {
        let bus = EventBus::new();
        let mut rx = bus.receiver();

        bus.publish(task::evaluated("t1", "th1", 1, true)).await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, task::EVALUATED);
        assert_eq!(event.data["accepted"], true);
    }

    #[tokio::test]
    async fn test_history_is_bounded_and_ordered() {
        let bus = EventBus::with_config(EventBusConfig {
            history_size: 5,
            ..Default::default()
        });

        for i in 0..10 {
            bus.publish(task::evaluated("t1", "th1", i, false)).await;
        }

        let history = bus.history(None).await;
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].data["iteration"], 5);
        assert_eq!(history[4].data["iteration"], 9);

        let last_two = bus.history(Some(2)).await;
        assert_eq!(last_two[0].data["iteration"], 8);
        assert_eq!(bus.event_count(), 10);
    }

    #[test]
    fn test_event_type_prefix_filter() {
        let filter = EventFilter::new().with_event_types(vec!["thread:".to_string()]);
        assert!(!filter.matches(&task::created("t1", "th1", "p1")));
        assert!(filter.matches(&thread::notification("p1", "th1", "t1", "completed")));
    }
}
