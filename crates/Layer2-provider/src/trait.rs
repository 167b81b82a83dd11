//! Sub-agent invocation trait and common types

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Events emitted while a sub-agent runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    /// stdout line
    Output(String),

    /// stderr line
    Diagnostic(String),

    /// Process finished (`None` when killed by a signal)
    Exited(Option<i32>),
}

/// Stream callback
pub type StreamCallback = Arc<dyn Fn(StreamEvent) + Send + Sync>;

/// Options for one invocation
#[derive(Clone, Default)]
pub struct InvokeOptions {
    /// Model override
    pub model: Option<String>,

    /// Called for every stream event
    pub on_stream_event: Option<StreamCallback>,
}

impl InvokeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_stream_callback(mut self, callback: StreamCallback) -> Self {
        self.on_stream_event = Some(callback);
        self
    }

    pub(crate) fn emit(&self, event: StreamEvent) {
        if let Some(callback) = &self.on_stream_event {
            callback(event);
        }
    }
}

impl std::fmt::Debug for InvokeOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvokeOptions")
            .field("model", &self.model)
            .field("on_stream_event", &self.on_stream_event.is_some())
            .finish()
    }
}

/// Result of one invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationResult {
    /// Full stdout
    pub output: String,

    /// Exit code, `None` when unknown
    pub exit_code: Option<i32>,

    pub error: Option<String>,

    pub duration_ms: u64,

    /// Model actually used, if the invoker knows it
    pub model: Option<String>,

    /// Reported token counts
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

impl InvocationResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            exit_code: Some(0),
            ..Default::default()
        }
    }

    pub fn failure(exit_code: i32, error: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Invoker error reported as a failed invocation (exit code -1)
    pub fn from_error(err: &ProviderError, duration_ms: u64) -> Self {
        Self {
            duration_ms,
            ..Self::failure(-1, err.to_string())
        }
    }

    /// A missing exit code counts as success
    pub fn is_success(&self) -> bool {
        self.exit_code.map_or(true, |code| code == 0)
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.input_tokens = Some(input_tokens);
        self.output_tokens = Some(output_tokens);
        self
    }
}

/// Sub-agent invocation gateway
#[async_trait]
pub trait SubAgentInvoker: Send + Sync {
    /// Invoker name (logging)
    fn name(&self) -> &str;

    /// Run the sub-agent once with the given prompt
    async fn invoke(
        &self,
        prompt: &str,
        options: InvokeOptions,
    ) -> Result<InvocationResult, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rules() {
        assert!(InvocationResult::success("ok").is_success());
        assert!(InvocationResult::default().is_success());
        assert!(!InvocationResult::failure(2, "bad").is_success());

        let spawn = InvocationResult::from_error(&ProviderError::spawn("x", "missing"), 3);
        assert_eq!(spawn.exit_code, Some(-1));
        assert_eq!(spawn.duration_ms, 3);
    }

    #[test]
    fn test_stream_event_json() {
        let json = serde_json::to_value(StreamEvent::Output("line".into())).unwrap();
        assert_eq!(json["type"], "output");
        assert_eq!(json["data"], "line");
    }
}
