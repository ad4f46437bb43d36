use crate::language::{self, count_cjk_chars};
use crate::sentences;
use crate::suggestions;
use crate::syllables;
use crate::types::{Analysis, Language, Level};
use crate::words;

/// Flesch Reading Ease over both branches: Latin substitutes a real
/// syllable count, CJK substitutes a character count for the same
/// "syllables per word" term (§4.4).
#[must_use]
pub fn analyze(text: &str) -> Analysis {
    let language = language::detect(text);
    let sentence_count = u32::try_from(sentences::split(text, language).len()).unwrap_or(u32::MAX);
    let word_list = words(text);
    let word_count = u32::try_from(word_list.len()).unwrap_or(u32::MAX);

    let syllables_or_chars = match language {
        Language::Latin => word_list.iter().map(|w| syllables::count(w)).sum(),
        Language::Cjk => count_cjk_chars(text),
    };

    let sentence_denom = f64::from(sentence_count.max(1));
    let word_denom = f64::from(word_count.max(1));

    let avg_sentence_length = f64::from(word_count) / sentence_denom;
    let avg_syllables_per_word = f64::from(syllables_or_chars) / word_denom;

    let raw_score = 206.835 - 1.015 * avg_sentence_length - 84.6 * avg_syllables_per_word;
    let score = raw_score.clamp(0.0, 100.0);
    let grade = (0.39 * avg_sentence_length + 11.8 * avg_syllables_per_word - 15.59).max(0.0);

    Analysis {
        score,
        grade,
        level: Level::from_score(score),
        language,
        sentences: sentence_count,
        words: word_count,
        syllables_or_chars,
        avg_sentence_length,
        avg_syllables_per_word,
        suggestions: suggestions::build(language, avg_sentence_length, avg_syllables_per_word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_scores_without_panicking() {
        let analysis = analyze("");
        assert!((0.0..=100.0).contains(&analysis.score));
        assert_eq!(analysis.words, 0);
        assert_eq!(analysis.sentences, 0);
    }

    #[test]
    fn simple_short_sentences_score_highly() {
        let analysis = analyze("The cat sat. The dog ran. I am happy.");
        assert!(analysis.score > 80.0, "expected an easy score, got {}", analysis.score);
        assert!(matches!(analysis.level, Level::VeryEasy | Level::Easy));
    }

    #[test]
    fn dense_academic_prose_scores_lower_than_simple_prose() {
        let simple = analyze("The cat sat. The dog ran. I am happy.");
        let dense = analyze(
            "The heterogeneous epistemological ramifications precipitated by \
             interdisciplinary methodological considerations necessitate \
             comprehensive, multifaceted reconceptualizations of foundational \
             theoretical frameworks underpinning contemporary scholarship.",
        );
        assert!(dense.score < simple.score);
    }

    #[test]
    fn cjk_text_substitutes_char_count_for_syllables() {
        let analysis = analyze("你好世界。这是一个测试句子，用来验证字符替代音节计数的逻辑。");
        assert_eq!(analysis.language, Language::Cjk);
        assert!(analysis.syllables_or_chars > 0);
    }
}
