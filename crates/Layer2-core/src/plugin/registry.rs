//! Plugin Registry - 플러그인 저장소

use super::traits::PluginHooks;
use crate::hook::{HookPoint, HookSet};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// 플러그인 레지스트리 - 등록 순서 = 호출 순서
pub struct PluginRegistry {
    plugins: RwLock<Vec<Arc<dyn PluginHooks>>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(Vec::new()),
        }
    }

    /// 플러그인 등록 (같은 이름이 있으면 `false`)
    pub fn register(&self, plugin: Arc<dyn PluginHooks>) -> bool {
        let mut plugins = self.plugins.write();

        if plugins.iter().any(|p| p.name() == plugin.name()) {
            warn!("Plugin {} is already registered", plugin.name());
            return false;
        }

        info!(
            plugin = plugin.name(),
            hooks = ?plugin.hook_points(),
            "Registered plugin"
        );
        plugins.push(plugin);
        true
    }

    /// 플러그인 등록 해제
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn PluginHooks>> {
        let mut plugins = self.plugins.write();
        let index = plugins.iter().position(|p| p.name() == name)?;
        info!("Unregistered plugin: {}", name);
        Some(plugins.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PluginHooks>> {
        self.plugins
            .read()
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    /// 등록된 플러그인 이름 (등록 순서)
    pub fn names(&self) -> Vec<String> {
        self.plugins
            .read()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// 특정 콜백을 구현한 플러그인 이름
    pub fn implementors(&self, point: HookPoint) -> Vec<String> {
        self.plugins
            .read()
            .iter()
            .filter(|p| p.implements(point))
            .map(|p| p.name().to_string())
            .collect()
    }

    /// 현재 플러그인 목록의 불변 스냅샷
    ///
    /// 이후 등록/해제는 이미 전달된 스냅샷에 영향을 주지 않습니다.
    pub fn snapshot(&self) -> HookSet {
        self.plugins.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Named(&'static str, &'static [HookPoint]);

    #[async_trait]
    impl PluginHooks for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn hook_points(&self) -> &[HookPoint] {
            self.1
        }
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let registry = PluginRegistry::new();
        assert!(registry.register(Arc::new(Named("a", &[]))));
        assert!(!registry.register(Arc::new(Named("a", &[]))));
        assert!(registry.register(Arc::new(Named("b", &[HookPoint::OnCommand]))));

        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(registry.implementors(HookPoint::OnCommand), vec!["b"]);
    }

    #[test]
    fn test_snapshot_is_immutable() {
        let registry = PluginRegistry::new();
        registry.register(Arc::new(Named("a", &[])));

        let snapshot = registry.snapshot();
        registry.register(Arc::new(Named("b", &[])));
        assert!(registry.unregister("a").is_some());

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name(), "a");
        assert_eq!(registry.names(), vec!["b"]);
        assert!(registry.unregister("missing").is_none());
    }
}
