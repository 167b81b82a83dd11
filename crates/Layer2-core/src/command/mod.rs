//! Command parsing
//!
//! - `parser`: 자유 텍스트에서 slash-command 추출
//! - `delegate`: `/delegate` 파라미터 파싱

mod delegate;
mod parser;

pub use delegate::{parse_delegate_args, DelegateArgs, DelegateArgsError};
pub use parser::{parse_command_line, parse_commands, ParsedCommand};
