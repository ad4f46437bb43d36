use std::sync::Arc;

use async_trait::async_trait;
use scripta_llm_gateway::LlmGateway;

use crate::error::WorkflowResult;
use crate::stage::{Stage, StageInput};
use crate::types::{NodeMetrics, StageOutcome};

use super::{elapsed_ms, infra_err, into_writing_mode};

/// Expands the most recent accepted outline into full content. Like
/// Plan, Draft has no acceptance gate of its own — it always passes
/// unless the gateway call fails (§4.1).
pub struct DraftStage {
    gateway: Arc<dyn LlmGateway>,
}

impl DraftStage {
    #[must_use]
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Stage for DraftStage {
    fn name(&self) -> &'static str {
        "draft"
    }

    async fn execute(&self, input: &StageInput) -> WorkflowResult<StageOutcome> {
        let start = std::time::Instant::now();
        let mode = into_writing_mode(input.config.writing_mode);
        let result = self
            .gateway
            .generate_content(&input.artifact, mode, input.config.target_word_count)
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
    async fn draft_expands_an_outline_into_content() {
        let stage = DraftStage::new(Arc::new(HttpLlmGateway::new(None)));
        let input = StageInput {
            artifact: "I. Introduction\nII. Body\nIII. Conclusion".to_string(),
            user_prompt: String::new(),
            config: Config::default(),
        };
        let outcome = stage.execute(&input).await.expect("draft never errors against the mock gateway");
        assert!(outcome.passed);
        assert!(!outcome.content.is_empty());
    }
}
