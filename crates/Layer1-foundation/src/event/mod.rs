//! Event System - 이벤트 발행/구독 시스템
//!
//! 위임 작업 라이프사이클과 스레드 알림을 브로드캐스트합니다.
//!
//! ```text
//! DelegationEngine ──publish──▶ EventBus ──▶ Listener 1 (console)
//!                                   │    └──▶ Listener N
//!                                   └──▶ broadcast::Receiver
//! ```
//!
//! ## 사용법
//!
//! ```ignore
//! use relay_foundation::event::{EventBus, EventListener, RelayEvent, task};
//!
//! struct MyListener;
//!
//! #[async_trait]
//! impl EventListener for MyListener {
//!     fn name(&self) -> &str { "my_listener" }
//!
//!     async fn on_event(&self, event: &RelayEvent) {
//!         println!("Received: {}", event.event_type);
//!     }
//! }
//!
//! let bus = Arc::new(EventBus::new());
//! bus.subscribe(Arc::new(MyListener)).await;
//! bus.publish(task::created(&task_id, &thread_id, &parent_id)).await;
//! ```

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventBusConfig, EventFilter, EventListener, ListenerId};

pub use types::{system, task, thread, EventCategory, EventId, EventSeverity, RelayEvent};
