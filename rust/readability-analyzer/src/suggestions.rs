use crate::types::Language;

/// Thresholds beyond which a text earns a suggestion, per branch (§4.4).
/// CJK's complexity axis is substituted chars-per-word rather than
/// syllables-per-word, so it gets its own (higher) cutoff.
const SENTENCE_LENGTH_THRESHOLD: f64 = 20.0;
const LATIN_COMPLEXITY_THRESHOLD: f64 = 1.5;
const CJK_COMPLEXITY_THRESHOLD: f64 = 2.5;

#[must_use]
pub fn build(language: Language, avg_sentence_length: f64, avg_syllables_per_word: f64) -> Vec<String> {
    let mut suggestions = Vec::new();

    if avg_sentence_length > SENTENCE_LENGTH_THRESHOLD {
        suggestions.push("Sentences are long on average; consider splitting some into shorter ones.".to_string());
    }

    let complexity_threshold = match language {
        Language::Latin => LATIN_COMPLEXITY_THRESHOLD,
        Language::Cjk => CJK_COMPLEXITY_THRESHOLD,
    };
    if avg_syllables_per_word > complexity_threshold {
        let hint = match language {
            Language::Latin => "Word complexity is high; prefer shorter, more common words.",
            Language::Cjk => "Vocabulary density is high; consider simpler phrasing.",
        };
        suggestions.push(hint.to_string());
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_long_sentences() {
        let suggestions = build(Language::Latin, 25.0, 1.0);
        assert_eq!(suggestions.len(), 1);
    }

    #[test]
    fn flags_both_axes_independently() {
        let suggestions = build(Language::Latin, 25.0, 2.0);
        assert_eq!(suggestions.len(), 2);
    }

    #[test]
    fn within_thresholds_yields_no_suggestions() {
        assert!(build(Language::Latin, 10.0, 1.2).is_empty());
    }
}
