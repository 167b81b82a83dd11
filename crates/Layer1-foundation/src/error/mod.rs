//! Error types for Relay
//!
//! Layer1 공통 에러. 상위 레이어는 자체 에러 (`ProviderError`, `HookFailure`,
//! `DelegationError`)를 두고 필요할 때 이 타입으로 변환합니다.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Relay 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    /// 설정 파일 / 경로 문제
    #[error("Configuration error: {0}")]
    Config(String),

    /// SQLite 작업 실패 (문맥 포함)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Sub-agent 실행 실패
    #[error("Sub-agent error: {0}")]
    SubAgent(String),

    /// 잘못된 작업 상태 전이
    #[error("Task error: {0}")]
    Task(String),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 저장소 에러 (`<context>: <cause>`)
    pub fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        Error::Storage(format!("{}: {}", context, err))
    }

    /// 사용자 입력으로 생긴 에러 (그대로 보여줘도 됨)
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::ThreadNotFound(_) | Error::TaskNotFound(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ThreadNotFound(_) | Error::TaskNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_helper_formats_context() {
        let err = Error::storage("Failed to save message", "disk full");
        assert_eq!(
            err.to_string(),
            "Storage error: Failed to save message: disk full"
        );
    }

    #[test]
    fn test_classification() {
        assert!(Error::InvalidInput("x".into()).is_user_facing());
        assert!(Error::TaskNotFound("t".into()).is_not_found());
        assert!(!Error::Internal("x".into()).is_user_facing());
        assert!(!Error::Storage("x".into()).is_not_found());
    }

    #[test]
    fn test_io_conversion() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
