//! Hook Runner - 플러그인 콜백 실행 전략
//!
//! 세 가지 호출 형태:
//! - [`run_notify`]: 모든 구현 hook 호출, 실패는 로그만
//! - [`run_first_success`]: `true`를 반환하는 첫 hook에서 중단
//! - [`run_chain`]: 값을 순서대로 변환, 실패한 hook은 건너뜀
//!
//! 어떤 hook 실패도 호출자에게 전파되지 않습니다.

use super::types::{HookFailure, HookPoint};
use crate::plugin::PluginHooks;
use std::future::Future;
use std::sync::Arc;
use tracing::{trace, warn};

fn implementing<'a>(
    hooks: &'a [Arc<dyn PluginHooks>],
    point: HookPoint,
) -> impl Iterator<Item = &'a Arc<dyn PluginHooks>> {
    hooks.iter().filter(move |hook| hook.implements(point))
}

fn log_failure(hook: &dyn PluginHooks, point: HookPoint, err: &HookFailure) {
    warn!(
        hook = hook.name(),
        point = %point,
        error = %err,
        "Hook failed"
    );
}

/// 모든 구현 hook을 순서대로 호출
pub async fn run_notify<F, Fut>(hooks: &[Arc<dyn PluginHooks>], point: HookPoint, mut invoke: F)
where
    F: FnMut(Arc<dyn PluginHooks>) -> Fut,
    Fut: Future<Output = Result<(), HookFailure>>,
{
    for hook in implementing(hooks, point) {
        trace!(hook = hook.name(), point = %point, "Notifying hook");
        if let Err(e) = invoke(Arc::clone(hook)).await {
            log_failure(hook.as_ref(), point, &e);
        }
    }
}

/// 첫 번째로 `true`를 반환한 hook에서 중단
///
/// 아무도 처리하지 않으면 (빈 목록 포함) `false`.
pub async fn run_first_success<F, Fut>(
    hooks: &[Arc<dyn PluginHooks>],
    point: HookPoint,
    mut invoke: F,
) -> bool
where
    F: FnMut(Arc<dyn PluginHooks>) -> Fut,
    Fut: Future<Output = Result<bool, HookFailure>>,
{
    for hook in implementing(hooks, point) {
        match invoke(Arc::clone(hook)).await {
            Ok(true) => {
                trace!(hook = hook.name(), point = %point, "Hook claimed call");
                return true;
            }
            Ok(false) => {}
            Err(e) => log_failure(hook.as_ref(), point, &e),
        }
    }
    false
}

/// 값을 hook 체인으로 전달
///
/// 실패한 hook은 건너뛰고 그 이전 값이 다음 hook으로 전달됩니다.
pub async fn run_chain<T, F, Fut>(
    hooks: &[Arc<dyn PluginHooks>],
    point: HookPoint,
    initial: T,
    mut invoke: F,
) -> T
where
    T: Clone,
    F: FnMut(Arc<dyn PluginHooks>, T) -> Fut,
    Fut: Future<Output = Result<T, HookFailure>>,
{
    let mut value = initial;
    for hook in implementing(hooks, point) {
        match invoke(Arc::clone(hook), value.clone()).await {
            Ok(next) => value = next,
            Err(e) => log_failure(hook.as_ref(), point, &e),
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// 호출 기록용 테스트 hook
    struct Probe {
        name: String,
        points: Vec<HookPoint>,
        claim: Result<bool, String>,
        append: Option<String>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Probe {
        fn new(name: &str, calls: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name: name.to_string(),
                points: vec![HookPoint::OnCommand, HookPoint::TransformPrompt, HookPoint::OnTaskCreate],
                claim: Ok(false),
                append: None,
                calls: Arc::clone(calls),
            }
        }

        fn claims(mut self, claim: Result<bool, String>) -> Self {
            self.claim = claim;
            self
        }

        fn appends(mut self, suffix: &str) -> Self {
            self.append = Some(suffix.to_string());
            self
        }

        fn only(mut self, points: Vec<HookPoint>) -> Self {
            self.points = points;
            self
        }
    }

    #[async_trait]
    impl PluginHooks for Probe {
        fn name(&self) -> &str {
            &self.name
        }

        fn hook_points(&self) -> &[HookPoint] {
            &self.points
        }

        async fn on_task_create(&self, _thread_id: &str, _task_id: &str) -> Result<(), HookFailure> {
            self.calls.lock().push(self.name.clone());
            match &self.claim {
                Err(e) => Err(HookFailure::message(e.clone())),
                Ok(_) => Ok(()),
            }
        }

        async fn on_command(
            &self,
            _thread_id: &str,
            _command: &str,
            _args: &str,
        ) -> Result<bool, HookFailure> {
            self.calls.lock().push(self.name.clone());
            self.claim.clone().map_err(HookFailure::Message)
        }

        async fn transform_prompt(&self, _thread_id: &str, prompt: String) -> Result<String, HookFailure> {
            self.calls.lock().push(self.name.clone());
            match &self.append {
                Some(suffix) => Ok(format!("{}{}", prompt, suffix)),
                None => Err(HookFailure::value(serde_json::Value::Null)),
            }
        }
    }

    fn set(hooks: Vec<Probe>) -> Vec<Arc<dyn PluginHooks>> {
        hooks
            .into_iter()
            .map(|h| Arc::new(h) as Arc<dyn PluginHooks>)
            .collect()
    }

    #[tokio::test]
    async fn test_first_success_stops_at_claim() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let hooks = set(vec![
            Probe::new("a", &calls),
            Probe::new("b", &calls).claims(Err("boom".into())),
            Probe::new("c", &calls).claims(Ok(true)),
            Probe::new("d", &calls).claims(Ok(true)),
        ]);

        let claimed = run_first_success(&hooks, HookPoint::OnCommand, |hook| async move {
            hook.on_command("th", "checkin", "done").await
        })
        .await;

        assert!(claimed);
        assert_eq!(*calls.lock(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_first_success_empty() {
        let hooks: Vec<Arc<dyn PluginHooks>> = Vec::new();
        let claimed = run_first_success(&hooks, HookPoint::OnCommand, |hook| async move {
            hook.on_command("th", "x", "").await
        })
        .await;
        assert!(!claimed);
    }

    #[tokio::test]
    async fn test_capability_is_checked() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let hooks = set(vec![
            Probe::new("a", &calls).claims(Ok(true)).only(vec![HookPoint::OnTaskCreate]),
            Probe::new("b", &calls),
        ]);

        let claimed = run_first_success(&hooks, HookPoint::OnCommand, |hook| async move {
            hook.on_command("th", "x", "").await
        })
        .await;

        assert!(!claimed);
        assert_eq!(*calls.lock(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_notify_isolates_failures() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let hooks = set(vec![
            Probe::new("a", &calls).claims(Err("first".into())),
            Probe::new("b", &calls),
            Probe::new("c", &calls).claims(Err("third".into())),
        ]);

        run_notify(&hooks, HookPoint::OnTaskCreate, |hook| async move {
            hook.on_task_create("th", "task").await
        })
        .await;

        assert_eq!(*calls.lock(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_chain_skips_failed_hook() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let hooks = set(vec![
            Probe::new("a", &calls).appends("-a"),
            Probe::new("b", &calls),
            Probe::new("c", &calls).appends("-c"),
        ]);

        let result = run_chain(
            &hooks,
            HookPoint::TransformPrompt,
            "start".to_string(),
            |hook, prompt| async move { hook.transform_prompt("th", prompt).await },
        )
        .await;

        assert_eq!(result, "start-a-c");
        assert_eq!(*calls.lock(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_chain_without_implementers() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let hooks = set(vec![Probe::new("a", &calls)
            .appends("-a")
            .only(vec![HookPoint::OnCommand])]);

        let result = run_chain(
            &hooks,
            HookPoint::TransformPrompt,
            "start".to_string(),
            |hook, prompt| async move { hook.transform_prompt("th", prompt).await },
        )
        .await;

        assert_eq!(result, "start");
        assert!(calls.lock().is_empty());
    }
}
