use thiserror::Error;

/// Failures talking to a configured LLM provider.
///
/// There is deliberately no "not configured" variant: an absent API key is
/// not an error, it is a routing decision handled by falling back to the
/// mock provider before any request is attempted.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to LLM provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM provider returned an unexpected response shape: {0}")]
    UnexpectedResponse(String),

    #[error("failed to decode LLM provider response: {0}")]
    Json(#[from] serde_json::Error),
}
