//! String Utilities
//!
//! 문자(char) 단위 자르기. 바이트 단위로 자르면 UTF-8 경계에서 panic 하므로
//! 항상 이 헬퍼를 사용합니다.
//!
//! ```ignore
//! use relay_foundation::strings::{truncate_chars, truncate_with_ellipsis};
//!
//! let summary = truncate_chars(&output, 200);
//! let name: CowStr = truncate_with_ellipsis(&prompt, 50);
//! ```

use std::borrow::Cow;

/// Copy-on-write string type
pub type CowStr<'a> = Cow<'a, str>;

/// Ellipsis appended by [`truncate_with_ellipsis`]
pub const ELLIPSIS: &str = "...";

/// 앞에서부터 최대 `max_chars` 문자
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

/// `max_chars` 보다 길면 잘라서 `...` 추가 (짧으면 zero-copy)
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> CowStr<'_> {
    let truncated = truncate_chars(s, max_chars);
    if truncated.len() == s.len() {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(format!("{}{}", truncated, ELLIPSIS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("", 3), "");
        // multi-byte
        assert_eq!(truncate_chars("안녕하세요", 2), "안녕");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        let short = truncate_with_ellipsis("short prompt", 50);
        assert!(matches!(short, Cow::Borrowed(_)));

        let long = "x".repeat(60);
        let name = truncate_with_ellipsis(&long, 50);
        assert_eq!(name.chars().count(), 53);
        assert!(name.ends_with("..."));

        let exact = "y".repeat(50);
        assert_eq!(truncate_with_ellipsis(&exact, 50), exact);
    }
}
