use thiserror::Error;

/// Failures reaching the external bibliographic service. A DOI that the
/// service simply doesn't recognize is not an error here — callers see
/// that as `resolve` returning `Ok(None)`.
#[derive(Debug, Error)]
pub enum CitationError {
    #[error("bibliographic service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("bibliographic service returned an unexpected response shape: {0}")]
    UnexpectedResponse(String),
}
