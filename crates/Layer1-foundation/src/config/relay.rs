//! Relay Config - 통합 설정
//!
//! 글로벌(`<config_dir>/relay/config.json`)과 프로젝트(`.relay/config.json`)
//! 설정을 병합합니다. 프로젝트 설정이 우선합니다.

use crate::storage::JsonStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 설정 파일명
pub const RELAY_CONFIG_FILE: &str = "config.json";

/// 기본 모델
pub const DEFAULT_MODEL: &str = "sonnet";

/// 기본 최대 반복 횟수
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// 기본 sub-agent 명령어
pub const DEFAULT_SUBAGENT_COMMAND: &str = "claude -p";

const DEFAULT_MODEL_FLAG: &str = "--model";

// ============================================================================
// Relay Config (통합)
// ============================================================================

/// Relay 통합 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    /// 버전 (마이그레이션용)
    #[serde(default = "default_version")]
    pub version: u32,

    /// 위임 작업 기본 모델
    #[serde(default = "default_model")]
    pub default_model: String,

    /// 위임 작업 기본 최대 반복 횟수
    #[serde(default = "default_max_iterations")]
    pub default_max_iterations: u32,

    /// SQLite 데이터 디렉토리
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Sub-agent 실행 설정
    #[serde(default)]
    pub subagent: SubAgentConfig,

    /// 모델별 가격 (USD / 1M tokens), 기본 가격표보다 먼저 매칭
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pricing: BTreeMap<String, PricingEntry>,

    /// 이벤트 히스토리 크기
    #[serde(default = "default_event_history_size")]
    pub event_history_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            default_model: default_model(),
            default_max_iterations: default_max_iterations(),
            data_dir: None,
            subagent: SubAgentConfig::default(),
            pricing: BTreeMap::new(),
            event_history_size: default_event_history_size(),
        }
    }
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        // 1. 글로벌 설정
        if let Ok(global) = JsonStore::global() {
            if let Some(global_config) = global.load_optional::<RelayConfig>(RELAY_CONFIG_FILE)? {
                config.merge(global_config);
            }
        }

        // 2. 프로젝트 설정
        if let Ok(project) = JsonStore::current_project() {
            if let Some(project_config) =
                project.load_optional::<RelayConfig>(RELAY_CONFIG_FILE)?
            {
                config.merge(project_config);
            }
        }

        Ok(config)
    }

    /// 특정 저장소에서 로드 (테스트 / 명시적 경로)
    pub fn load_from(store: &JsonStore) -> Result<Self> {
        let mut config = Self::new();
        if let Some(loaded) = store.load_optional::<RelayConfig>(RELAY_CONFIG_FILE)? {
            config.merge(loaded);
        }
        Ok(config)
    }

    /// 글로벌 설정 저장 (`relay config --save`)
    pub fn save_global(&self) -> Result<()> {
        self.save_to(&JsonStore::global()?)
    }

    pub fn save_to(&self, store: &JsonStore) -> Result<()> {
        store.save(RELAY_CONFIG_FILE, self)
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: RelayConfig) {
        if other.default_model != default_model() {
            self.default_model = other.default_model;
        }
        if other.default_max_iterations != default_max_iterations() {
            self.default_max_iterations = other.default_max_iterations;
        }
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
        if other.event_history_size != default_event_history_size() {
            self.event_history_size = other.event_history_size;
        }

        self.subagent.merge(other.subagent);
        self.pricing.extend(other.pricing);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// 데이터 디렉토리 (설정값 또는 `<data_local_dir>/relay`)
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("relay"))
            .ok_or_else(|| Error::Config("Cannot find data directory".to_string()))
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn default_max_iterations(mut self, max_iterations: u32) -> Self {
        self.default_max_iterations = max_iterations;
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }
}

// ============================================================================
// Sub-agent Config
// ============================================================================

/// Sub-agent 프로세스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAgentConfig {
    /// 실행 명령어 (shell 문법으로 분리)
    #[serde(default = "default_subagent_command")]
    pub command: String,

    /// 모델 지정 플래그
    #[serde(default = "default_model_flag")]
    pub model_flag: String,
}

impl Default for SubAgentConfig {
    fn default() -> Self {
        Self {
            command: default_subagent_command(),
            model_flag: default_model_flag(),
        }
    }
}

impl SubAgentConfig {
    fn merge(&mut self, other: SubAgentConfig) {
        if other.command != default_subagent_command() {
            self.command = other.command;
        }
        if other.model_flag != default_model_flag() {
            self.model_flag = other.model_flag;
        }
    }
}

// ============================================================================
// Pricing
// ============================================================================

/// 모델 가격 (USD / 1M tokens)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingEntry {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

// ============================================================================
// Helpers
// ============================================================================

fn default_version() -> u32 {
    1
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

fn default_subagent_command() -> String {
    DEFAULT_SUBAGENT_COMMAND.to_string()
}

fn default_model_flag() -> String {
    DEFAULT_MODEL_FLAG.to_string()
}

fn default_event_history_size() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.default_model, "sonnet");
        assert_eq!(config.default_max_iterations, 5);
        assert_eq!(config.subagent.command, "claude -p");
        assert_eq!(config.subagent.model_flag, "--model");
        assert!(config.pricing.is_empty());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RelayConfig =
            serde_json::from_str(r#"{"defaultMaxIterations": 3}"#).unwrap();
        assert_eq!(config.default_max_iterations, 3);
        assert_eq!(config.default_model, "sonnet");
        assert_eq!(config.event_history_size, 1000);
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = RelayConfig::default().default_model("opus");
        let other: RelayConfig = serde_json::from_str(
            r#"{
                "subagent": {"command": "my-agent --print"},
                "pricing": {"local-llm": {"inputPerMillion": 0.0, "outputPerMillion": 0.0}}
            }"#,
        )
        .unwrap();

        base.merge(other);

        // 기본값은 덮어쓰지 않음
        assert_eq!(base.default_model, "opus");
        assert_eq!(base.subagent.command, "my-agent --print");
        assert_eq!(base.subagent.model_flag, "--model");
        assert!(base.pricing.contains_key("local-llm"));
    }

    #[test]
    fn test_load_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        let missing = RelayConfig::load_from(&store).unwrap();
        assert_eq!(missing.default_max_iterations, 5);

        let saved = RelayConfig::default()
            .default_max_iterations(2)
            .data_dir(dir.path().join("data"));
        saved.save_to(&store).unwrap();

        let loaded = RelayConfig::load_from(&store).unwrap();
        assert_eq!(loaded.default_max_iterations, 2);
        assert_eq!(loaded.resolve_data_dir().unwrap(), dir.path().join("data"));
    }
}
