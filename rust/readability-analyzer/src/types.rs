use serde::{Deserialize, Serialize};

/// Which branch of the Flesch formula a text was scored under (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Latin,
    Cjk,
}

/// UI-facing difficulty bucket. Never used for gating — the gate only
/// looks at `score` against `config.readability_threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    VeryEasy,
    Easy,
    Moderate,
    Standard,
    Harder,
    Difficult,
    VeryDifficult,
}

impl Level {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::VeryEasy
        } else if score >= 80.0 {
            Self::Easy
        } else if score >= 70.0 {
            Self::Moderate
        } else if score >= 60.0 {
            Self::Standard
        } else if score >= 50.0 {
            Self::Harder
        } else if score >= 30.0 {
            Self::Difficult
        } else {
            Self::VeryDifficult
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryEasy => "very easy",
            Self::Easy => "easy",
            Self::Moderate => "moderate",
            Self::Standard => "standard",
            Self::Harder => "harder",
            Self::Difficult => "difficult",
            Self::VeryDifficult => "very difficult",
        }
    }
}

/// The full result of one [`crate::ReadabilityAnalyzer::analyze`] call.
///
/// `syllables_or_chars` is the Latin syllable total for [`Language::Latin`]
/// text and the CJK character total for [`Language::Cjk`] text — the two
/// branches substitute one for the other in the same Flesch formula (§4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Flesch Reading Ease, clamped to `[0, 100]`. This is the only field
    /// the Readability gate evaluates.
    pub score: f64,
    /// Flesch-Kincaid grade level estimate, floored at 0.
    pub grade: f64,
    pub level: Level,
    pub language: Language,
    pub sentences: u32,
    pub words: u32,
    pub syllables_or_chars: u32,
    pub avg_sentence_length: f64,
    pub avg_syllables_per_word: f64,
    pub suggestions: Vec<String>,
}
