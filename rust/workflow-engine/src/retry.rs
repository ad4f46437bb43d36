//! Exponential backoff for infrastructure-error retries (§7).
//!
//! Infrastructure failures (LLM transport errors, external API outages,
//! stage timeouts) are retried with a base delay of 1s, doubling each
//! attempt, capped at 30s, up to a per-stage infrastructure retry cap.
//! This is independent of a Node's `retry_count`, which only tracks
//! gate failures.

use rand::Rng;

use crate::error::WorkflowError;

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            backoff_factor: 2.0,
            max_delay_ms: 30_000,
            jitter: true,
        }
    }
}

/// Calculate the delay for a given retry attempt (1-based).
///
/// Formula: `initial_delay_ms * factor^(attempt - 1)`, capped at
/// `max_delay_ms`. With jitter enabled the delay is multiplied by a
/// random factor in `[0.5, 1.5)`.
#[must_use]
pub fn delay_for_attempt(attempt: u32, config: &BackoffConfig) -> std::time::Duration {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    let base = (config.initial_delay_ms as f64)
        * config
            .backoff_factor
            .powi(i32::saturating_sub(attempt as i32, 1));
    #[allow(clippy::cast_precision_loss)]
    let capped = base.min(config.max_delay_ms as f64);

    let final_ms = if config.jitter {
        let jitter_factor = rand::rng().random_range(0.5..1.5);
        capped * jitter_factor
    } else {
        capped
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    std::time::Duration::from_millis(final_ms.max(0.0) as u64)
}

/// Run `op` up to `max_attempts` times, sleeping with exponential
/// backoff between attempts whenever the error is an
/// `Infrastructure` error. Any other error, or exhaustion of
/// attempts, is returned as-is to the caller (exhaustion is reported
/// as `Fatal` by callers that need to mark the Document Failed).
pub async fn with_infra_retry<T, F, Fut>(
    max_attempts: u32,
    backoff: &BackoffConfig,
    mut op: F,
) -> Result<T, WorkflowError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, WorkflowError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = delay_for_attempt(attempt, backoff);
                tokio::time::sleep(delay).await;
                continue;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_and_caps() {
        let config = BackoffConfig {
            jitter: false,
            ..BackoffConfig::default()
        };
        assert_eq!(delay_for_attempt(1, &config).as_millis(), 1_000);
        assert_eq!(delay_for_attempt(2, &config).as_millis(), 2_000);
        assert_eq!(delay_for_attempt(3, &config).as_millis(), 4_000);
        assert_eq!(delay_for_attempt(10, &config).as_millis(), 30_000);
    }
}
