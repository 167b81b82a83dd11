//! Hook 타입 정의
//!
//! - [`HookPoint`]: 플러그인이 구현할 수 있는 콜백 지점
//! - [`HookFailure`]: 콜백 실패 (에러 / 메시지 / 임의 JSON 값)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::plugin::PluginHooks;

/// 불변 hook 스냅샷 (위임 요청마다 전달)
pub type HookSet = Arc<[Arc<dyn PluginHooks>]>;

// ============================================================================
// HookPoint - 콜백 지점
// ============================================================================

/// 플러그인 콜백 지점
///
/// 플러그인은 [`PluginHooks::hook_points`]로 구현한 지점을 알리고,
/// runner는 호출 전에 이 목록을 확인합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookPoint {
    /// 작업 생성 직후 (notify)
    OnTaskCreate,
    /// Sub-agent 출력 검증 (실패 = 거부)
    OnTaskComplete,
    /// 반복 횟수 소진 (notify)
    OnTaskFailed,
    /// 출력 내 slash-command 처리 (first-success)
    OnCommand,
    /// Sub-agent로 보내는 프롬프트 변환 (chain)
    TransformPrompt,
}

impl HookPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnTaskCreate => "onTaskCreate",
            Self::OnTaskComplete => "onTaskComplete",
            Self::OnTaskFailed => "onTaskFailed",
            Self::OnCommand => "onCommand",
            Self::TransformPrompt => "transformPrompt",
        }
    }
}

impl std::fmt::Display for HookPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// HookFailure
// ============================================================================

/// Hook 콜백 실패
///
/// 어떤 형태든 문자열로 변환되어 로그 / 거부 피드백에 사용됩니다.
#[derive(Error, Debug)]
pub enum HookFailure {
    /// 에러 객체 (메시지 사용)
    #[error("{0}")]
    Error(Box<dyn std::error::Error + Send + Sync>),

    /// 일반 메시지
    #[error("{0}")]
    Message(String),

    /// 임의 값
    #[error("{}", value_to_text(.0))]
    Value(Value),
}

impl HookFailure {
    pub fn error(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Error(err.into())
    }

    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    pub fn value(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<String> for HookFailure {
    fn from(s: String) -> Self {
        Self::Message(s)
    }
}

impl From<&str> for HookFailure {
    fn from(s: &str) -> Self {
        Self::Message(s.to_string())
    }
}

impl From<Value> for HookFailure {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<relay_foundation::Error> for HookFailure {
    fn from(err: relay_foundation::Error) -> Self {
        Self::Error(Box::new(err))
    }
}

impl From<std::io::Error> for HookFailure {
    fn from(err: std::io::Error) -> Self {
        Self::Error(Box::new(err))
    }
}

/// JSON 값의 문자열 표현 (`null` → "null", 문자열 → 그대로, 배열 → 쉼표 연결)
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => value_to_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_text() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert_eq!(HookFailure::from(io).to_string(), "boom");
        assert_eq!(HookFailure::message("bad output").to_string(), "bad output");
        assert_eq!(HookFailure::value(Value::Null).to_string(), "null");
        assert_eq!(HookFailure::value(json!("plain")).to_string(), "plain");
        assert_eq!(HookFailure::value(json!(42)).to_string(), "42");
        assert_eq!(HookFailure::value(json!([1, "a", null])).to_string(), "1,a,");
        assert_eq!(
            HookFailure::value(json!({"k": 1})).to_string(),
            "[object Object]"
        );
    }

    #[test]
    fn test_hook_point_names() {
        assert_eq!(HookPoint::OnTaskComplete.to_string(), "onTaskComplete");
        assert_eq!(
            serde_json::to_string(&HookPoint::TransformPrompt).unwrap(),
            "\"transformPrompt\""
        );
    }
}
