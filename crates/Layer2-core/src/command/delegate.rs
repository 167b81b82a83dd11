//! `/delegate` 인자 파싱
//!
//! `/delegate [model=<id>] [maxIterations=<n>] <prompt>`
//!
//! - 파라미터 토큰은 공백으로 구분된 단어 전체, 각각 첫 번째만 인식
//! - `maxIterations`는 양의 정수만 허용, 아니면 무시
//! - 인식된 토큰은 값이 무시되더라도 프롬프트에서 제거

use thiserror::Error;

const MODEL_PARAM: &str = "model=";
const MAX_ITERATIONS_PARAM: &str = "maxIterations=";

/// 파싱된 `/delegate` 인자
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DelegateArgs {
    pub prompt: String,
    pub model: Option<String>,
    /// 항상 1 이상
    pub max_iterations: Option<u32>,
}

/// `/delegate` 인자 에러
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DelegateArgsError {
    #[error("Usage: /{command} [model=<id>] [maxIterations=<n>] <prompt>")]
    MissingPrompt { command: String },
}

/// `/delegate`, `/re-delegate` 인자 파싱
pub fn parse_delegate_args(command: &str, args: &str) -> Result<DelegateArgs, DelegateArgsError> {
    let mut parsed = DelegateArgs::default();
    let mut seen_model = false;
    let mut seen_max_iterations = false;
    let mut words = Vec::new();

    for word in args.split_whitespace() {
        if !seen_model {
            if let Some(value) = word.strip_prefix(MODEL_PARAM) {
                seen_model = true;
                if !value.is_empty() {
                    parsed.model = Some(value.to_string());
                }
                continue;
            }
        }
        if !seen_max_iterations {
            if let Some(value) = word.strip_prefix(MAX_ITERATIONS_PARAM) {
                seen_max_iterations = true;
                parsed.max_iterations = value.parse::<u32>().ok().filter(|n| *n > 0);
                continue;
            }
        }
        words.push(word);
    }

    parsed.prompt = words.join(" ");
    if parsed.prompt.is_empty() {
        return Err(DelegateArgsError::MissingPrompt {
            command: command.to_string(),
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_prompt() {
        let args = parse_delegate_args("delegate", "write the docs").unwrap();
        assert_eq!(args.prompt, "write the docs");
        assert_eq!(args.model, None);
        assert_eq!(args.max_iterations, None);
    }

    #[test]
    fn test_parameters_are_stripped() {
        let args =
            parse_delegate_args("delegate", "model=opus maxIterations=3 refactor the parser")
                .unwrap();
        assert_eq!(args.prompt, "refactor the parser");
        assert_eq!(args.model.as_deref(), Some("opus"));
        assert_eq!(args.max_iterations, Some(3));
    }

    #[test]
    fn test_invalid_max_iterations_is_ignored_but_stripped() {
        for raw in ["maxIterations=0", "maxIterations=-2", "maxIterations=abc"] {
            let args = parse_delegate_args("delegate", &format!("{} fix it", raw)).unwrap();
            assert_eq!(args.prompt, "fix it");
            assert_eq!(args.max_iterations, None);
        }
    }

    #[test]
    fn test_only_first_occurrence_is_recognized() {
        let args = parse_delegate_args("delegate", "model=a do model=b").unwrap();
        assert_eq!(args.model.as_deref(), Some("a"));
        assert_eq!(args.prompt, "do model=b");
    }

    #[test]
    fn test_embedded_parameter_is_not_a_token() {
        let args = parse_delegate_args("delegate", "set xmodel=1 in config").unwrap();
        assert_eq!(args.model, None);
        assert_eq!(args.prompt, "set xmodel=1 in config");
    }

    #[test]
    fn test_missing_prompt() {
        let err = parse_delegate_args("re-delegate", "model=opus").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Usage: /re-delegate [model=<id>] [maxIterations=<n>] <prompt>"
        );
        assert!(parse_delegate_args("delegate", "   ").is_err());
    }

    proptest! {
        #[test]
        fn parse_never_panics(s in ".*") {
            let _ = parse_delegate_args("delegate", &s);
        }

        #[test]
        fn max_iterations_is_positive(
            prefix in "[a-z ]{0,20}",
            value in "-?[0-9a-z]{0,6}",
            suffix in "[a-z ]{0,20}",
        ) {
            let input = format!("{} maxIterations={} {}", prefix, value, suffix);
            if let Ok(args) = parse_delegate_args("delegate", &input) {
                if let Some(n) = args.max_iterations {
                    prop_assert!(n >= 1);
                }
            }
        }

        #[test]
        fn single_tokens_never_survive(
            words in proptest::collection::vec("[a-zA-Z0-9=._-]{1,12}", 1..8),
            model in "[a-z0-9.-]{0,10}",
            iterations in "[0-9a-z-]{0,4}",
        ) {
            let mut all: Vec<String> = words
                .into_iter()
                .filter(|w| !w.starts_with(MODEL_PARAM) && !w.starts_with(MAX_ITERATIONS_PARAM))
                .collect();
            let kept = all.len();
            all.insert(0, format!("{}{}", MODEL_PARAM, model));
            all.push(format!("{}{}", MAX_ITERATIONS_PARAM, iterations));
            let input = all.join(" ");

            match parse_delegate_args("delegate", &input) {
                Ok(args) => {
                    prop_assert!(!args.prompt.split(' ').any(|w| w.starts_with(MODEL_PARAM)));
                    prop_assert!(!args.prompt.split(' ').any(|w| w.starts_with(MAX_ITERATIONS_PARAM)));
                    prop_assert_eq!(args.prompt.split(' ').count(), kept);
                }
                Err(_) => prop_assert_eq!(kept, 0),
            }
        }
    }
}
