//! Config - 통합 설정 관리
//!
//! - `relay.rs` - RelayConfig 통합 설정 (모델, 반복 횟수, sub-agent, 가격)

mod relay;

pub use relay::{
    PricingEntry, RelayConfig, SubAgentConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_MODEL,
    DEFAULT_SUBAGENT_COMMAND, RELAY_CONFIG_FILE,
};
