//! Provider-specific error types
//!
//! ProviderError는 sub-agent 실행 관련 세부 에러를 관리합니다.
//! relay_foundation::Error와의 변환을 지원합니다.

use relay_foundation::Error as FoundationError;
use thiserror::Error;

/// Errors that can occur while invoking a sub-agent
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Command string is empty or cannot be split
    #[error("Invalid sub-agent command: {0}")]
    InvalidCommand(String),

    /// Process could not be started
    #[error("Failed to spawn sub-agent '{program}': {message}")]
    Spawn { program: String, message: String },

    /// Pipe / wait failure
    #[error("Sub-agent I/O error: {0}")]
    Io(String),

    /// Invoker not configured
    #[error("Sub-agent not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    pub fn spawn(program: &str, err: impl std::fmt::Display) -> Self {
        ProviderError::Spawn {
            program: program.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        ProviderError::Io(err.to_string())
    }
}

// ============================================================================
// relay_foundation::Error 변환
// ============================================================================

impl From<ProviderError> for FoundationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidCommand(msg) | ProviderError::NotConfigured(msg) => {
                FoundationError::Config(msg)
            }
            other => FoundationError::SubAgent(other.to_string()),
        }
    }
}
