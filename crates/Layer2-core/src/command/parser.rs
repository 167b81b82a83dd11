//! Slash-command 추출
//!
//! 자유 텍스트에서 `/command args` 형태의 줄을 찾습니다.
//! 줄 앞 공백은 무시하고, 줄 중간의 `/`나 단독 `/`는 명령어가 아닙니다.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static COMMAND_LINE: OnceLock<Regex> = OnceLock::new();

fn command_line() -> &'static Regex {
    COMMAND_LINE.get_or_init(|| {
        Regex::new(r"^/([\w-]+)(\s+.*)?$").expect("command line pattern is a valid regex")
    })
}

/// 추출된 명령어
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommand {
    /// `/` 없는 명령어 이름
    pub command: String,
    /// 나머지 인자 (앞뒤 공백 제거)
    pub args: String,
}

impl ParsedCommand {
    pub fn new(command: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: args.into(),
        }
    }
}

/// 텍스트의 모든 명령어 (문서 순서)
pub fn parse_commands(text: &str) -> Vec<ParsedCommand> {
    text.lines()
        .filter_map(|line| parse_command_line(line.trim_start()))
        .collect()
}

/// 한 줄이 명령어면 파싱
pub fn parse_command_line(line: &str) -> Option<ParsedCommand> {
    let caps = command_line().captures(line)?;
    let command = caps.get(1)?.as_str();
    let args = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
    Some(ParsedCommand::new(command, args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_blank_lines() {
        assert_eq!(
            parse_commands("/checkin Done\n\n\n"),
            vec![ParsedCommand::new("checkin", "Done")]
        );
    }

    #[test]
    fn test_mid_line_slash_is_not_command() {
        assert!(parse_commands("Use the /api/v1/endpoint").is_empty());
        assert!(parse_commands("/").is_empty());
        assert!(parse_commands("/ spaced").is_empty());
    }

    #[test]
    fn test_multiple_commands_in_order() {
        let text = "Working on it.\n  /checkin   halfway there  \nmore text\n/re-delegate model=opus fix it\n/done";
        assert_eq!(
            parse_commands(text),
            vec![
                ParsedCommand::new("checkin", "halfway there"),
                ParsedCommand::new("re-delegate", "model=opus fix it"),
                ParsedCommand::new("done", ""),
            ]
        );
    }

    #[test]
    fn test_path_like_token_is_not_command() {
        // `/api/v1` 는 이름 뒤에 공백이 아닌 문자가 옴
        assert!(parse_command_line("/api/v1 call").is_none());
        assert!(parse_command_line("/checkin\tdone").is_some());
    }
}
