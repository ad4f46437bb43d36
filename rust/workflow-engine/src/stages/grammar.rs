use std::sync::Arc;

use async_trait::async_trait;
use scripta_llm_gateway::LlmGateway;

use crate::error::WorkflowResult;
use crate::stage::{Stage, StageInput};
use crate::types::{NodeMetrics, StageOutcome};

use super::{elapsed_ms, infra_err};

/// Runs a grammar check over the draft. Passes if the reported error
/// count is at most `config.max_grammar_errors` (§4.1, §9).
///
/// On Pass, the artifact advances to the corrected content the
/// gateway returned; on Fail, the uncorrected draft is kept so the
/// rollback-to-Draft retry starts from the same text.
pub struct GrammarStage {
    gateway: Arc<dyn LlmGateway>,
}

impl GrammarStage {
    #[must_use]
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Stage for GrammarStage {
    fn name(&self) -> &'static str {
        "grammar"
    }

    async fn execute(&self, input: &StageInput) -> WorkflowResult<StageOutcome> {
        let start = std::time::Instant::now();
        let result = self.gateway.check_grammar(&input.artifact).await.map_err(infra_err)?;

        let metrics = NodeMetrics {
            grammar_errors: Some(result.errors),
            token_usage: Some(result.tokens_used),
            processing_time_ms: Some(elapsed_ms(start)),
            ..NodeMetrics::default()
        };

        if result.errors <= input.config.max_grammar_errors {
            Ok(StageOutcome::pass(result.corrected_content, metrics))
        } else {
            let reason = format!(
                "{} grammar errors exceed the maximum of {}",
                result.errors, input.config.max_grammar_errors
            );
            Ok(StageOutcome::fail(input.artifact.clone(), metrics, reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Config;
    use scripta_llm_gateway::HttpLlmGateway;

    #[tokio::test]
    async fn short_draft_passes_the_grammar_gate() {
        let stage = GrammarStage::new(Arc::new(HttpLlmGateway::new(None)));
        let input = StageInput {
            artifact: "A short, clean draft.".to_string(),
            user_prompt: String::new(),
            config: Config::default(),
        };
        let outcome = stage.execute(&input).await.unwrap();
        assert!(outcome.passed);
    }

    #[tokio::test]
    async fn excessive_errors_fail_the_gate() {
        let stage = GrammarStage::new(Arc::new(HttpLlmGateway::new(None)));
        let long_draft = "word ".repeat(1200);
        let input = StageInput {
            artifact: long_draft,
            user_prompt: String::new(),
            config: Config { max_grammar_errors: 0, ..Config::default() },
        };
        let outcome = stage.execute(&input).await.unwrap();
        assert!(!outcome.passed);
        assert!(outcome.metrics.grammar_errors.unwrap_or_default() > 0);
    }
}
