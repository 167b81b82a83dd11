//! Checkin Plugin - `/checkin <text>` 진행 보고 수집
//!
//! Sub-agent가 출력에 `/checkin ...` 줄을 남기면 스레드별로 보관합니다.

use crate::hook::{HookFailure, HookPoint};
use crate::plugin::PluginHooks;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tracing::info;

/// 스레드당 보관하는 최대 체크인 수
const DEFAULT_MAX_PER_THREAD: usize = 50;

/// 체크인 하나
#[derive(Debug, Clone)]
pub struct CheckIn {
    pub message: String,
    pub at: DateTime<Utc>,
}

/// `/checkin` 명령어를 처리하는 플러그인
pub struct CheckinPlugin {
    max_per_thread: usize,
    checkins: Mutex<HashMap<String, VecDeque<CheckIn>>>,
}

impl CheckinPlugin {
    pub const COMMAND: &'static str = "checkin";

    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_PER_THREAD)
    }

    pub fn with_capacity(max_per_thread: usize) -> Self {
        Self {
            max_per_thread: max_per_thread.max(1),
            checkins: Mutex::new(HashMap::new()),
        }
    }

    /// 스레드의 체크인 (오래된 순)
    pub fn checkins(&self, thread_id: &str) -> Vec<CheckIn> {
        self.checkins
            .lock()
            .get(thread_id)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for CheckinPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginHooks for CheckinPlugin {
    fn name(&self) -> &str {
        "checkin"
    }

    fn hook_points(&self) -> &[HookPoint] {
        &[HookPoint::OnCommand]
    }

    async fn on_command(
        &self,
        thread_id: &str,
        command: &str,
        args: &str,
    ) -> Result<bool, HookFailure> {
        if command != Self::COMMAND {
            return Ok(false);
        }
        if args.is_empty() {
            return Err(HookFailure::message("Usage: /checkin <message>"));
        }

        info!(thread_id, checkin = args, "Check-in");

        let mut checkins = self.checkins.lock();
        let list = checkins.entry(thread_id.to_string()).or_default();
        list.push_back(CheckIn {
            message: args.to_string(),
            at: Utc::now(),
        });
        while list.len() > self.max_per_thread {
            list.pop_front();
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claims_only_checkin() {
        let plugin = CheckinPlugin::new();

        assert!(plugin.on_command("th", "checkin", "Done").await.unwrap());
        assert!(!plugin.on_command("th", "deploy", "now").await.unwrap());
        assert!(plugin.on_command("th", "checkin", "").await.is_err());

        let list = plugin.checkins("th");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].message, "Done");
        assert!(plugin.checkins("other").is_empty());
    }

    #[tokio::test]
    async fn test_bounded_per_thread() {
        let plugin = CheckinPlugin::with_capacity(2);
        for i in 0..5 {
            plugin
                .on_command("th", "checkin", &format!("step {}", i))
                .await
                .unwrap();
        }

        let messages: Vec<_> = plugin
            .checkins("th")
            .into_iter()
            .map(|c| c.message)
            .collect();
        assert_eq!(messages, vec!["step 3", "step 4"]);
    }
}
