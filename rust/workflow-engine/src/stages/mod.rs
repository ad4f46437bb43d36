//! Concrete [`crate::stage::Stage`] implementations, one per pipeline
//! stage (§4.1).
//!
//! Plan and Draft always pass their stage (an `Err` only ever means an
//! infrastructure failure); Citation, Grammar, and Readability evaluate
//! an acceptance gate against the document's `Config` thresholds.

mod citation;
mod draft;
mod grammar;
mod plan;
mod readability;

pub use citation::CitationStage;
pub use draft::DraftStage;
pub use grammar::GrammarStage;
pub use plan::PlanStage;
pub use readability::ReadabilityStage;

fn into_writing_mode(mode: crate::types::WritingMode) -> scripta_llm_gateway::WritingMode {
    match mode {
        crate::types::WritingMode::Academic => scripta_llm_gateway::WritingMode::Academic,
        crate::types::WritingMode::Blog => scripta_llm_gateway::WritingMode::Blog,
        crate::types::WritingMode::Social => scripta_llm_gateway::WritingMode::Social,
    }
}

fn infra_err(err: impl std::fmt::Display) -> crate::error::WorkflowError {
    crate::error::WorkflowError::Infrastructure { message: err.to_string() }
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(start: std::time::Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
