//! Language-aware readability scoring (§4.4): a single comparable 0–100
//! number (Flesch Reading Ease), plus the statistics and suggestions
//! that justify it.
//!
//! Text is routed to one of two branches by [`language::detect`]: Latin
//! prose counts syllables per word; CJK text substitutes a character
//! count for the syllable count in the same formula. Both branches
//! share the one scoring function in [`score`].

mod language;
mod score;
mod sentences;
mod suggestions;
mod syllables;
mod types;

use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

use scripta_cache::{Cache, Namespace};

pub use language::detect as detect_language;
pub use types::{Analysis, Language, Level};

/// Produces [`Analysis`] results, caching them by a hash of the input
/// text so repeated gate evaluations of the same draft don't redo the
/// tokenization work.
pub struct ReadabilityAnalyzer {
    cache: Cache,
}

impl ReadabilityAnalyzer {
    #[must_use]
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    fn cache_key(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Analyze `text`, returning score, statistics, and suggestions.
    pub async fn analyze(&self, text: &str) -> Analysis {
        let key = Self::cache_key(text);
        if let Some(cached) = self.cache.get::<Analysis>(Namespace::Readability, &key).await {
            return cached;
        }

        let analysis = score::analyze(text);
        self.cache.set(Namespace::Readability, &key, &analysis).await;
        analysis
    }

    /// `analyze(text).score >= threshold`.
    pub async fn meets_threshold(&self, text: &str, threshold: f64) -> bool {
        self.analyze(text).await.score >= threshold
    }
}

/// Tokenize `text` into words per Unicode word-boundary rules (UAX #29).
/// For CJK scripts this segments per ideograph, which is the simplest
/// word-segmenter approximation that needs no external dictionary.
#[must_use]
pub(crate) fn words(text: &str) -> Vec<&str> {
    text.unicode_words().collect()
}
