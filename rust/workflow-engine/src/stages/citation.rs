use std::sync::Arc;

use async_trait::async_trait;
use scripta_citation_validator::CitationValidator;

use crate::error::WorkflowResult;
use crate::stage::{Stage, StageInput};
use crate::types::{NodeMetrics, StageOutcome};

use super::elapsed_ms;

/// Validates the draft's bibliography. Passes if there are no
/// citations to check, or if `validation_rate` meets
/// `config.citation_validity_threshold` (§4.1, §9).
///
/// Content is passed through unchanged — this stage only gates, it
/// never rewrites the draft.
pub struct CitationStage {
    validator: Arc<CitationValidator>,
}

impl CitationStage {
    #[must_use]
    pub fn new(validator: Arc<CitationValidator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl Stage for CitationStage {
    fn name(&self) -> &'static str {
        "citation"
    }

    async fn execute(&self, input: &StageInput) -> WorkflowResult<StageOutcome> {
        let start = std::time::Instant::now();
        let report = self.validator.validate_bibliography(&input.artifact).await;

        let metrics = NodeMetrics {
            citation_count: Some(report.total_citations),
            processing_time_ms: Some(elapsed_ms(start)),
            ..NodeMetrics::default()
        };

        let passed = report.total_citations == 0 || report.validation_rate >= input.config.citation_validity_threshold;

        if passed {
            Ok(StageOutcome::pass(input.artifact.clone(), metrics))
        } else {
            let reason = format!(
                "validation rate {:.2} below threshold {:.2} ({} of {} citations verified)",
                report.validation_rate, input.config.citation_validity_threshold, report.valid_citations, report.total_citations
            );
            Ok(StageOutcome::fail(input.artifact.clone(), metrics, reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Config;
    use scripta_cache::Cache;

    #[tokio::test]
    async fn empty_bibliography_always_passes() {
        let stage = CitationStage::new(Arc::new(CitationValidator::new(Cache::in_memory("test"))));
        let input = StageInput {
            artifact: "This draft cites nothing at all.".to_string(),
            user_prompt: String::new(),
            config: Config::default(),
        };
        let outcome = stage.execute(&input).await.unwrap();
        assert!(outcome.passed);
        assert_eq!(outcome.metrics.citation_count, Some(0));
    }

    #[tokio::test]
    async fn numbered_citations_pass_the_gate_on_format_alone() {
        let stage = CitationStage::new(Arc::new(CitationValidator::new(Cache::in_memory("test"))));
        let input = StageInput {
            artifact: "This claim is supported [1] and so is this one [2].".to_string(),
            user_prompt: String::new(),
            config: Config::default(),
        };
        let outcome = stage.execute(&input).await.unwrap();
        assert!(outcome.passed);
        assert_eq!(outcome.metrics.citation_count, Some(2));
    }
}
