//! Error taxonomy for the workflow engine.
//!
//! Six categories: `Validation`, `NotFound`, `Conflict`, `GateFailure`,
//! `Infrastructure`, and `Fatal`. `GateFailure` counts against a node's
//! `retry_count`; `Infrastructure` counts against a separate per-stage
//! infrastructure retry cap and is retried with exponential backoff.
//! Only `Fatal` (and programming errors) transitions a Document to `Failed`.

use serde::ser::SerializeMap;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    /// Malformed request at the boundary.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Document or node missing or not owned.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Start requested on a non-terminal document.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Stage produced an artifact failing its gate predicate.
    #[error("gate failure in stage {stage}: {reason}")]
    GateFailure { stage: String, reason: String },

    /// Transport error, timeout, or dependency outage.
    #[error("infrastructure error: {message}")]
    Infrastructure { message: String },

    /// Retries exhausted; the Document transitions to Failed.
    #[error("fatal: {message}")]
    Fatal { message: String },

    /// A JSON serialization/deserialization error occurred.
    #[error("json error: {message}")]
    Json { message: String },
}

impl WorkflowError {
    /// Infrastructure errors are retried; everything else is not retried
    /// by the generic backoff loop (gate failures follow the rollback
    /// policy instead, see `engine::rollback_to`).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Infrastructure { .. })
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::GateFailure { .. } => "GATE_FAILURE",
            Self::Infrastructure { .. } => "INFRASTRUCTURE",
            Self::Fatal { .. } => "FATAL",
            Self::Json { .. } => "JSON_ERROR",
        }
    }
}

impl From<serde_json::Error> for WorkflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

impl serde::Serialize for WorkflowError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("code", self.code())?;
        map.serialize_entry("message", &self.to_string())?;
        map.end()
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
