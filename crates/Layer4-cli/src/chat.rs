//! Interactive chat loop
//!
//! stdin 한 줄 = 대화 스레드의 user 메시지 하나.
//! slash-command는 `/delegate` 계열이면 `DelegationCommands`로, 아니면
//! 등록된 plugin의 `on_command`로 전달됩니다.

use relay_core::{parse_command_line, run_first_success, HookPoint, PluginRegistry};
use relay_delegation::{DelegationCommands, DelegationSupervisor};
use relay_foundation::event::system;
use relay_foundation::{DelegationStore, Error, EventBus, MessageRecord, ThreadRecord};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

/// Chat 세션 구성 요소
pub struct ChatSession {
    pub store: Arc<dyn DelegationStore>,
    pub bus: Arc<EventBus>,
    pub registry: Arc<PluginRegistry>,
    pub supervisor: DelegationSupervisor,
}

/// 한 줄 처리 결과
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    /// 일반 메시지 (저장만)
    None,
    Text(String),
}

impl ChatSession {
    /// 기존 스레드 재개 또는 새 대화 스레드 생성
    pub fn open_thread(&self, thread_id: Option<&str>) -> relay_foundation::Result<ThreadRecord> {
        match thread_id {
            Some(id) => self
                .store
                .get_thread(id)?
                .ok_or_else(|| Error::ThreadNotFound(id.to_string())),
            None => {
                let thread = ThreadRecord::conversation(None);
                self.store.create_thread(&thread)?;
                Ok(thread)
            }
        }
    }

    /// 입력 한 줄 처리
    pub async fn handle_line(&self, thread_id: &str, line: &str) -> Reply {
        if let Err(e) = self.store.append_message(&MessageRecord::user(thread_id, line)) {
            warn!(thread_id, error = %e, "Failed to store message");
        }

        let Some(parsed) = parse_command_line(line) else {
            return Reply::None;
        };
        let (command, args) = (parsed.command.as_str(), parsed.args.as_str());

        if DelegationCommands::handles(command) {
            let commands = DelegationCommands::new(self.supervisor.clone(), self.registry.clone());
            return match commands.handle(thread_id, command, args).await {
                Ok(launched) => Reply::Text(DelegationCommands::reply(&launched)),
                Err(e) => Reply::Text(e.to_string()),
            };
        }

        let hooks = self.registry.snapshot();
        let claimed = run_first_success(&hooks, HookPoint::OnCommand, |hook| async move {
            hook.on_command(thread_id, command, args).await
        })
        .await;

        if claimed {
            debug!(thread_id, command, "Command handled by plugin");
            Reply::None
        } else {
            Reply::Text(format!("Unknown command: /{}", command))
        }
    }

    /// stdin이 끝나거나 Ctrl-C까지 실행, 이후 진행 중인 위임 완료 대기
    pub async fn run(&self, thread: &ThreadRecord) -> anyhow::Result<()> {
        println!("Thread: {}", thread.id);
        println!("Type a message, or /delegate [model=<id>] [maxIterations=<n>] <prompt>");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    None
                }
            };
            let Some(line) = line else { break };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Reply::Text(text) = self.handle_line(&thread.id, line).await {
                println!("{}", text);
            }
        }

        let active = self.supervisor.active();
        if active > 0 {
            println!("Waiting for {} delegation(s) to finish...", active);
        }
        self.supervisor.shutdown().await;
        self.bus.publish(system::shutdown("input closed")).await;
        debug!(events = self.bus.event_count(), "Chat session closed");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relay_core::CheckinPlugin;
    use relay_delegation::DelegationEngine;
    use relay_foundation::Storage;
    use relay_provider::{InvocationResult, InvokeOptions, ProviderError, SubAgentInvoker};

    struct Echo;

    #[async_trait]
    impl SubAgentInvoker for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn invoke(
            &self,
            prompt: &str,
            _options: InvokeOptions,
        ) -> Result<InvocationResult, ProviderError> {
            Ok(InvocationResult::success(prompt))
        }
    }

    fn session() -> (ChatSession, Arc<CheckinPlugin>) {
        let store: Arc<dyn DelegationStore> = Arc::new(Storage::in_memory().unwrap());
        let bus = Arc::new(EventBus::new());
        let engine = Arc::new(DelegationEngine::new(store.clone(), Arc::new(Echo), bus.clone()));
        let registry = Arc::new(PluginRegistry::new());
        let checkin = Arc::new(CheckinPlugin::new());
        registry.register(checkin.clone());

        let session = ChatSession {
            store,
            bus,
            registry,
            supervisor: DelegationSupervisor::new(engine),
        };
        (session, checkin)
    }

    #[tokio::test]
    async fn test_plain_messages_are_stored() {
        let (session, _) = session();
        let thread = session.open_thread(None).unwrap();

        assert_eq!(session.handle_line(&thread.id, "hello there").await, Reply::None);
        let messages = session.store.get_messages(&thread.id).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello there");
    }

    #[tokio::test]
    async fn test_commands_route_to_plugins_or_unknown() {
        let (session, checkin) = session();
        let thread = session.open_thread(None).unwrap();

        assert_eq!(session.handle_line(&thread.id, "/checkin halfway").await, Reply::None);
        assert_eq!(checkin.checkins(&thread.id).len(), 1);

        assert_eq!(
            session.handle_line(&thread.id, "/frobnicate now").await,
            Reply::Text("Unknown command: /frobnicate".to_string())
        );
    }

    #[tokio::test]
    async fn test_delegate_launches_and_drains() {
        let (session, _) = session();
        let thread = session.open_thread(None).unwrap();

        let Reply::Text(reply) = session.handle_line(&thread.id, "/delegate Echo this").await else {
            panic!("expected a reply");
        };
        assert!(reply.starts_with("Delegated task "));

        let Reply::Text(usage) = session.handle_line(&thread.id, "/delegate model=x").await else {
            panic!("expected usage");
        };
        assert!(usage.starts_with("Usage: /delegate"));

        session.supervisor.shutdown().await;
        let notes = session.store.get_messages(&thread.id).unwrap();
        assert!(notes
            .iter()
            .any(|m| m.content == "Task completed after 1 iteration(s): Echo this"));
    }

    #[test]
    fn test_unknown_thread_is_an_error() {
        let (session, _) = session();
        assert!(matches!(
            session.open_thread(Some("missing")),
            Err(Error::ThreadNotFound(_))
        ));
    }
}
