use std::sync::Arc;

use async_trait::async_trait;
use scripta_readability_analyzer::ReadabilityAnalyzer;

use crate::error::WorkflowResult;
use crate::stage::{Stage, StageInput};
use crate::types::{NodeMetrics, StageOutcome};

use super::elapsed_ms;

/// Scores the grammar-checked draft for readability. Passes if the
/// Flesch Reading Ease score is at least `config.readability_threshold`
/// (§4.1, §4.4). The final gate: a Pass here is what moves a document
/// to `Done`.
pub struct ReadabilityStage {
    analyzer: Arc<ReadabilityAnalyzer>,
}

impl ReadabilityStage {
    #[must_use]
    pub fn new(analyzer: Arc<ReadabilityAnalyzer>) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl Stage for ReadabilityStage {
    fn name(&self) -> &'static str {
        "readability"
    }

    async fn execute(&self, input: &StageInput) -> WorkflowResult<StageOutcome> {
        let start = std::time::Instant::now();
        let analysis = self.analyzer.analyze(&input.artifact).await;

        let metrics = NodeMetrics {
            readability_score: Some(analysis.score),
            processing_time_ms: Some(elapsed_ms(start)),
            ..NodeMetrics::default()
        };

        if analysis.score >= input.config.readability_threshold {
            Ok(StageOutcome::pass(input.artifact.clone(), metrics))
        } else {
            let reason = format!(
                "readability score {:.1} below threshold {:.1}",
                analysis.score, input.config.readability_threshold
            );
            Ok(StageOutcome::fail(input.artifact.clone(), metrics, reason))
        }
    }
}
