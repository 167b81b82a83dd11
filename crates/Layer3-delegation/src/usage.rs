//! Usage recording
//!
//! 호출 1회 = `AgentRun` 1개 + 메트릭 4개 (`token.input`, `token.output`,
//! `token.total`, `token.cost`), 하나의 트랜잭션으로 기록합니다.
//!
//! 토큰 수는 sub-agent가 보고한 값을 우선 사용하고, 없으면 `ceil(chars / 4)`
//! 로 추정합니다.

use relay_foundation::{
    AgentRunRecord, AgentRunStatus, DelegationStore, Result, UsageMetricRecord,
};
use relay_provider::{InvocationResult, PricingTable};
use std::sync::Arc;
use tracing::debug;

pub const METRIC_INPUT_TOKENS: &str = "token.input";
pub const METRIC_OUTPUT_TOKENS: &str = "token.output";
pub const METRIC_TOTAL_TOKENS: &str = "token.total";
pub const METRIC_COST: &str = "token.cost";

/// 대략적인 토큰 추정 (문자 4개당 1 토큰, 올림)
pub fn estimate_tokens(text: &str) -> u64 {
    let chars = text.chars().count() as u64;
    chars.div_ceil(4)
}

/// 호출별 사용량 기록기
#[derive(Clone)]
pub struct UsageRecorder {
    store: Arc<dyn DelegationStore>,
    pricing: PricingTable,
}

impl UsageRecorder {
    pub fn new(store: Arc<dyn DelegationStore>, pricing: PricingTable) -> Self {
        Self { store, pricing }
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// 한 번의 호출 기록
    ///
    /// `model`은 요청한 모델이며, 결과에 실제 모델이 있으면 그것을 사용합니다.
    pub fn record(
        &self,
        task_id: &str,
        thread_id: &str,
        model: &str,
        prompt: &str,
        result: &InvocationResult,
    ) -> Result<AgentRunRecord> {
        let model = result.model.as_deref().unwrap_or(model);
        let input_tokens = result.input_tokens.unwrap_or_else(|| estimate_tokens(prompt));
        let output_tokens = result
            .output_tokens
            .unwrap_or_else(|| estimate_tokens(&result.output));
        let total_tokens = input_tokens + output_tokens;
        let cost = self.pricing.cost(model, input_tokens, output_tokens);

        let mut run = AgentRunRecord::new(task_id, thread_id, model);
        run.input_tokens = input_tokens;
        run.output_tokens = output_tokens;
        run.cost_estimate = cost;
        run.duration_ms = result.duration_ms;
        if result.is_success() {
            run.status = AgentRunStatus::Completed;
        } else {
            run.status = AgentRunStatus::Failed;
            run.error = result.error.clone();
        }

        let metrics = [
            UsageMetricRecord::new(&run.id, METRIC_INPUT_TOKENS, input_tokens as f64, model),
            UsageMetricRecord::new(&run.id, METRIC_OUTPUT_TOKENS, output_tokens as f64, model),
            UsageMetricRecord::new(&run.id, METRIC_TOTAL_TOKENS, total_tokens as f64, model),
            UsageMetricRecord::new(&run.id, METRIC_COST, cost, model),
        ];

        self.store.record_agent_run(&run, &metrics)?;

        debug!(
            task_id,
            run_id = %run.id,
            model,
            input_tokens,
            output_tokens,
            cost,
            "Recorded agent run"
        );

        Ok(run)
    }
}
