use serde::{Deserialize, Serialize};

/// The tone and structural conventions a generation request should follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritingMode {
    Academic,
    Blog,
    Social,
}

impl WritingMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Blog => "blog",
            Self::Social => "social",
        }
    }
}

/// The result of a free-form or structured text generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub content: String,
    pub tokens_used: u32,
}

/// The result of a grammar-check pass over a block of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarCheckResult {
    pub errors: u32,
    pub corrected_content: String,
    pub suggestions: Vec<String>,
    pub tokens_used: u32,
}
