//! Model pricing tiers
//!
//! 모델 id → 가격 (USD per 1M tokens):
//! 1. 정확히 일치 (소문자)
//! 2. 모델 id에 포함된 첫 번째 키
//! 3. 기본 tier (`sonnet`)
//!
//! 설정의 `pricing` 항목은 기본 가격표보다 먼저 같은 순서로 매칭됩니다.

use relay_foundation::PricingEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 기본 tier 이름
pub const DEFAULT_TIER: &str = "sonnet";

/// 모델 가격 정보 (USD per 1M tokens)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_price: f64,
    pub output_price: f64,
}

impl ModelPricing {
    pub const fn new(input: f64, output: f64) -> Self {
        Self {
            input_price: input,
            output_price: output,
        }
    }

    /// 비용 계산
    pub fn calculate(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        let input_cost = (input_tokens as f64 / 1_000_000.0) * self.input_price;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * self.output_price;
        input_cost + output_cost
    }
}

impl From<PricingEntry> for ModelPricing {
    fn from(entry: PricingEntry) -> Self {
        Self::new(entry.input_per_million, entry.output_per_million)
    }
}

/// 기본 가격표 (매칭 순서대로)
const BUILTIN_TIERS: [(&str, ModelPricing); 3] = [
    ("opus", ModelPricing::new(15.0, 75.0)),
    ("sonnet", ModelPricing::new(3.0, 15.0)),
    ("haiku", ModelPricing::new(0.8, 4.0)),
];

const DEFAULT_PRICING: ModelPricing = ModelPricing::new(3.0, 15.0);

/// 가격표
#[derive(Debug, Clone)]
pub struct PricingTable {
    overrides: Vec<(String, ModelPricing)>,
    tiers: Vec<(String, ModelPricing)>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            overrides: Vec::new(),
            tiers: BUILTIN_TIERS
                .iter()
                .map(|(name, pricing)| (name.to_string(), *pricing))
                .collect(),
        }
    }
}

impl PricingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 설정의 가격 항목 추가 (키는 소문자로 저장)
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, PricingEntry>) -> Self {
        self.overrides.extend(
            overrides
                .iter()
                .map(|(name, entry)| (name.to_lowercase(), ModelPricing::from(*entry))),
        );
        self
    }

    fn lookup(table: &[(String, ModelPricing)], model: &str) -> Option<ModelPricing> {
        table
            .iter()
            .find(|(name, _)| name == model)
            .or_else(|| table.iter().find(|(name, _)| model.contains(name.as_str())))
            .map(|(_, pricing)| *pricing)
    }

    /// 모델 가격 조회
    pub fn resolve(&self, model: &str) -> ModelPricing {
        let model = model.to_lowercase();
        Self::lookup(&self.overrides, &model)
            .or_else(|| Self::lookup(&self.tiers, &model))
            .unwrap_or(DEFAULT_PRICING)
    }

    /// 비용 계산 (USD)
    pub fn cost(&self, model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        self.resolve(model).calculate(input_tokens, output_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_sonnet_cost() {
        let table = PricingTable::new();
        assert!(approx(table.cost("sonnet", 1_000_000, 500_000), 10.5));
    }

    #[test]
    fn test_substring_and_case() {
        let table = PricingTable::new();
        assert_eq!(table.resolve("Claude-OPUS-4-1"), ModelPricing::new(15.0, 75.0));
        assert_eq!(table.resolve("claude-3-5-haiku-latest"), ModelPricing::new(0.8, 4.0));
        // 알 수 없는 모델은 기본 tier
        assert_eq!(table.resolve("gpt-4o"), table.resolve(DEFAULT_TIER));
    }

    #[test]
    fn test_overrides_win() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "Local".to_string(),
            PricingEntry {
                input_per_million: 0.0,
                output_per_million: 0.0,
            },
        );
        overrides.insert(
            "opus".to_string(),
            PricingEntry {
                input_per_million: 5.0,
                output_per_million: 25.0,
            },
        );
        let table = PricingTable::new().with_overrides(&overrides);

        assert!(approx(table.cost("local-llama", 1_000_000, 1_000_000), 0.0));
        assert!(approx(table.cost("claude-opus-4", 1_000_000, 0), 5.0));
        assert!(approx(table.cost("haiku", 0, 1_000_000), 4.0));
    }
}
