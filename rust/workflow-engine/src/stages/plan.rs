use std::sync::Arc;

use async_trait::async_trait;
use scripta_llm_gateway::LlmGateway;

use crate::error::WorkflowResult;
use crate::stage::{Stage, StageInput};
use crate::types::{NodeMetrics, StageOutcome};

use super::{elapsed_ms, infra_err, into_writing_mode};

/// Generates an outline from the user's prompt. Never fails a gate —
/// an `Err` here is always an infrastructure error, not a rejected
/// outline (§4.1: Plan has no acceptance gate).
pub struct PlanStage {
    gateway: Arc<dyn LlmGateway>,
}

impl PlanStage {
    #[must_use]
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Stage for PlanStage {
    fn name(&self) -> &'static str {
        "plan"
    }

    async fn execute(&self, input: &StageInput) -> WorkflowResult<StageOutcome> {
        let start = std::time::Instant::now();
        let mode = into_writing_mode(input.config.writing_mode);
        let result = self
            .gateway
            .generate_outline(&input.user_prompt, mode)
            .await
            .map_err(infra_err)?;

        let metrics = NodeMetrics {
            word_count: Some(result.content.split_whitespace().count() as u32),
            token_usage: Some(result.tokens_used),
            processing_time_ms: Some(elapsed_ms(start)),
            ..NodeMetrics::default()
        };

        Ok(StageOutcome::pass(result.content, metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Config;
    use scripta_llm_gateway::HttpLlmGateway;

    #[tokio::test]
    async fn plan_passes_using_mock_gateway_when_unconfigured() {
        let stage = PlanStage::new(Arc::new(HttpLlmGateway::new(None)));
        let input = StageInput {
            artifact: String::new(),
            user_prompt: "a history of tea".to_string(),
            config: Config::default(),
        };
        let outcome = stage.execute(&input).await.expect("plan never errors against the mock gateway");
        assert!(outcome.passed);
        assert!(!outcome.content.is_empty());
        assert!(outcome.metrics.word_count.unwrap_or_default() > 0);
    }
}
