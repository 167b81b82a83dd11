//! Delegation command errors

use relay_core::DelegateArgsError;
use thiserror::Error;

/// `/delegate` 처리 에러
#[derive(Error, Debug)]
pub enum DelegationError {
    /// 잘못된 인자 (사용법 메시지)
    #[error(transparent)]
    Usage(#[from] DelegateArgsError),

    #[error("Not a delegation command: /{0}")]
    UnknownCommand(String),

    /// Task 생성 실패
    #[error("Failed to launch delegation: {0}")]
    Launch(#[from] relay_foundation::Error),
}

impl DelegationError {
    /// 호출자에게 그대로 보여줄 수 있는 에러
    pub fn is_user_facing(&self) -> bool {
        match self {
            Self::Usage(_) | Self::UnknownCommand(_) => true,
            Self::Launch(e) => e.is_user_facing(),
        }
    }
}
