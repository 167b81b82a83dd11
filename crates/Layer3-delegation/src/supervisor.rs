//! Delegation Supervisor - 백그라운드 위임 실행
//!
//! `launch`는 Task가 저장된 직후 반환하고, 반복 루프는 `TaskTracker`가
//! 관리하는 백그라운드 task에서 계속됩니다. `shutdown`은 진행 중인 모든
//! 위임이 끝날 때까지 기다립니다.

use crate::engine::{DelegationEngine, DelegationRequest};
use relay_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// 백그라운드로 시작된 위임 작업
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchedTask {
    pub task_id: String,
    pub thread_id: String,
}

/// 위임 작업 감독자
#[derive(Clone)]
pub struct DelegationSupervisor {
    engine: Arc<DelegationEngine>,
    tracker: TaskTracker,
}

impl DelegationSupervisor {
    pub fn new(engine: Arc<DelegationEngine>) -> Self {
        Self {
            engine,
            tracker: TaskTracker::new(),
        }
    }

    pub fn engine(&self) -> &Arc<DelegationEngine> {
        &self.engine
    }

    /// Task 생성 후 백그라운드 실행
    pub async fn launch(&self, request: DelegationRequest) -> Result<LaunchedTask> {
        if self.tracker.is_closed() {
            return Err(Error::Task("supervisor is shutting down".to_string()));
        }

        let created = self.engine.create(request).await?;
        let launched = LaunchedTask {
            task_id: created.task_id().to_string(),
            thread_id: created.thread_id().to_string(),
        };

        let engine = Arc::clone(&self.engine);
        self.tracker.spawn(async move {
            let outcome = engine.run(created).await;
            if outcome.is_completed() {
                info!(
                    task_id = %outcome.task_id,
                    iterations = outcome.iterations,
                    "Background delegation completed"
                );
            } else {
                warn!(
                    task_id = %outcome.task_id,
                    iterations = outcome.iterations,
                    "Background delegation failed"
                );
            }
        });

        Ok(launched)
    }

    /// 진행 중인 위임 수
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    /// 새 위임을 막고 진행 중인 위임 완료 대기
    pub async fn shutdown(&self) {
        self.tracker.close();
        if !self.tracker.is_empty() {
            info!(active = self.tracker.len(), "Waiting for delegations to finish");
        }
        self.tracker.wait().await;
    }
}
