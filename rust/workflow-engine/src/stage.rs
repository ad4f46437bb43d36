//! The `Stage` trait (§4.1's stage contracts).
//!
//! Each of the five pipeline stages implements `Stage`, receiving the
//! current artifact and the document's config, and returning a
//! [`StageOutcome`]. Stages are infrastructure-fallible (an `Err` is
//! always a [`WorkflowError::Infrastructure`]): a gate failure is not
//! an `Err`, it's a `StageOutcome { passed: false, .. }`.

use async_trait::async_trait;

use crate::error::WorkflowResult;
use crate::types::{Config, StageOutcome};

/// Input available to a stage execution.
#[derive(Debug, Clone)]
pub struct StageInput {
    /// The artifact produced by the previous stage (the outline for
    /// Draft, the draft content for Citation/Grammar/Readability).
    pub artifact: String,
    /// The original user prompt, needed by Plan.
    pub user_prompt: String,
    pub config: Config,
}

#[async_trait]
pub trait Stage: Send + Sync {
    /// Human-readable stage name, used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Run the stage. Returns `Err` only for infrastructure failures;
    /// a quality-gate failure is a normal `Ok(StageOutcome::fail(..))`.
    async fn execute(&self, input: &StageInput) -> WorkflowResult<StageOutcome>;
}
