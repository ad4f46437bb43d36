use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::GatewayError;
use crate::types::{GenerationResult, GrammarCheckResult, WritingMode};
use crate::{LlmGateway, mock};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4";

/// An OpenAI-compatible chat-completion client.
///
/// With no API key configured, every method falls back to the static
/// content in [`crate::mock`] instead of making a request: a missing key
/// degrades the gateway, it does not fail the caller.
pub struct HttpLlmGateway {
    api_key: Option<String>,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl HttpLlmGateway {
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<GenerationResult, GatewayError> {
        let Some(api_key) = &self.api_key else {
            return Ok(GenerationResult {
                content: String::new(),
                tokens_used: 0,
            });
        };

        let mut messages = Vec::new();
        if !system_prompt.is_empty() {
            messages.push(json!({"role": "system", "content": system_prompt}));
        }
        messages.push(json!({"role": "user", "content": user_prompt}));

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.model,
                "messages": messages,
            }))
            .send()
            .await?
            .error_for_status()?;

        let body: ChatCompletionResponse = response.json().await?;
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::UnexpectedResponse("no choices in response".to_string()))?;

        Ok(GenerationResult {
            content: choice.message.content,
            tokens_used: body.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

fn system_prompt(mode: WritingMode, task: &str) -> &'static str {
    match (mode, task) {
        (WritingMode::Academic, "outline") => {
            "You are an academic writing assistant. Produce a clearly structured, \
             rigorously organized outline with an introduction, several body sections, \
             a conclusion, and a references section."
        }
        (WritingMode::Academic, _) => {
            "You are an academic writing assistant. Write in a scholarly register, with \
             well-supported argumentation and appropriate citations."
        }
        (WritingMode::Blog, "outline") => {
            "You are a blog writing assistant. Produce an engaging, clearly sectioned \
             outline with a strong hook and a title suited to online readers."
        }
        (WritingMode::Blog, _) => {
            "You are a blog writing assistant. Write engaging, readable prose suited to \
             online publication."
        }
        (WritingMode::Social, "outline") => {
            "You are a social media content assistant. Produce a short, punchy outline \
             that leads with the key message."
        }
        (WritingMode::Social, _) => {
            "You are a social media content assistant. Write concise, shareable copy with \
             a clear point of view."
        }
    }
}

#[async_trait]
impl LlmGateway for HttpLlmGateway {
    async fn generate_text(&self, system_prompt: &str, user_prompt: &str) -> Result<GenerationResult, GatewayError> {
        if !self.is_configured() {
            tracing::debug!("no LLM provider configured, returning mock text");
            return Ok(GenerationResult {
                content: String::new(),
                tokens_used: 0,
            });
        }
        self.complete(system_prompt, user_prompt).await
    }

    async fn generate_outline(
        &self,
        prompt: &str,
        writing_mode: WritingMode,
    ) -> Result<GenerationResult, GatewayError> {
        if !self.is_configured() {
            tracing::debug!("no LLM provider configured, returning mock outline");
            return Ok(mock::outline(prompt, writing_mode));
        }
        self.complete(system_prompt(writing_mode, "outline"), prompt).await
    }

    async fn generate_content(
        &self,
        outline: &str,
        writing_mode: WritingMode,
        target_word_count: u32,
    ) -> Result<GenerationResult, GatewayError> {
        if !self.is_configured() {
            tracing::debug!("no LLM provider configured, returning mock content");
            return Ok(mock::content(outline, writing_mode, target_word_count));
        }

        let prompt = format!(
            "Based on the following outline, write a {writing_mode} article of roughly \
             {target_word_count} words. Include in-text citations in [1][2] style where a \
             claim would benefit from a source.\n\n{outline}",
            writing_mode = writing_mode.as_str(),
        );
        self.complete(system_prompt(writing_mode, "content"), &prompt).await
    }

    async fn check_grammar(&self, content: &str) -> Result<GrammarCheckResult, GatewayError> {
        if !self.is_configured() {
            tracing::debug!("no LLM provider configured, returning mock grammar check");
            return Ok(mock::check_grammar(content));
        }

        let system = "You are a professional grammar checker. Carefully check the text for \
                       grammar, spelling, and punctuation errors and propose corrections.\n\n\
                       Reply in exactly this format:\n\
                       Error count: <number>\n\
                       Corrected content: <the full corrected text>\n\
                       Suggestions: <comma-separated list of suggestions>";
        let prompt = format!("Check the following text for grammar errors:\n\n{content}");
        let result = self.complete(system, &prompt).await?;
        Ok(parse_grammar_response(content, &result.content, result.tokens_used))
    }
}

fn parse_grammar_response(original: &str, response: &str, tokens_used: u32) -> GrammarCheckResult {
    let mut errors = 0;
    let mut corrected_content = original.to_string();
    let mut suggestions = Vec::new();

    for line in response.lines() {
        if let Some(rest) = line.strip_prefix("Error count:") {
            errors = rest.trim().parse().unwrap_or(0);
        } else if let Some(rest) = line.strip_prefix("Corrected content:") {
            corrected_content = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Suggestions:") {
            suggestions = rest
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    GrammarCheckResult {
        errors,
        corrected_content,
        suggestions,
        tokens_used,
    }
}
