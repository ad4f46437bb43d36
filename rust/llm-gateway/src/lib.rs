//! A narrow, provider-agnostic interface onto the text-generation calls
//! the workflow stages need: outline drafting, full-content drafting, and
//! grammar checking, plus a raw `generate_text` escape hatch.
//!
//! [`HttpLlmGateway`] talks to an OpenAI-compatible chat-completion
//! endpoint when an API key is configured. Without one, every call
//! degrades to the static content in [`mock`] rather than erroring, so
//! downstream gates keep exercising real logic even with no provider
//! reachable.

mod error;
mod http;
mod mock;
mod types;

use async_trait::async_trait;

pub use error::GatewayError;
pub use http::HttpLlmGateway;
pub use types::{GenerationResult, GrammarCheckResult, WritingMode};

#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// A raw system/user prompt pair, for callers that don't fit the
    /// outline/content/grammar shapes below.
    async fn generate_text(&self, system_prompt: &str, user_prompt: &str) -> Result<GenerationResult, GatewayError>;

    async fn generate_outline(
        &self,
        prompt: &str,
        writing_mode: WritingMode,
    ) -> Result<GenerationResult, GatewayError>;

    async fn generate_content(
        &self,
        outline: &str,
        writing_mode: WritingMode,
        target_word_count: u32,
    ) -> Result<GenerationResult, GatewayError>;

    async fn check_grammar(&self, content: &str) -> Result<GrammarCheckResult, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_gateway_falls_back_to_mock_outline() {
        let gateway = HttpLlmGateway::new(None);
        assert!(!gateway.is_configured());

        let result = gateway
            .generate_outline("a history of tea", WritingMode::Academic)
            .await
            .expect("mock path never errors");
        assert!(result.content.contains("Outline"));
        assert_eq!(result.tokens_used, 0);
    }

    #[tokio::test]
    async fn unconfigured_gateway_reports_grammar_errors_by_length() {
        let gateway = HttpLlmGateway::new(None);
        let long_content = "word ".repeat(1200);
        let result = gateway.check_grammar(&long_content).await.expect("mock path never errors");
        assert!(result.errors > 0);
        assert_eq!(result.corrected_content, long_content);
    }
}
