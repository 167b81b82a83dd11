//! Iteration prompt 구성

/// 재시도 프롬프트 구분선
pub const FEEDBACK_DIVIDER: &str = "\n\n---\n\n";

/// 피드백 머리말
pub const FEEDBACK_HEADER: &str = "Previous attempt was rejected with the following feedback:\n";

/// 첫 시도는 원본 그대로, 재시도는 원본 + 구분선 + 직전 피드백
pub fn build_iteration_prompt(original: &str, feedback: Option<&str>) -> String {
    match feedback {
        None => original.to_string(),
        Some(feedback) => format!("{original}{FEEDBACK_DIVIDER}{FEEDBACK_HEADER}{feedback}"),
    }
}
