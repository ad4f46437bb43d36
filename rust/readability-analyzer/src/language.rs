use unicode_segmentation::UnicodeSegmentation;

use crate::types::Language;

/// CJK ranges covering the scripts this system expects to see in
/// mixed-language drafts: Han ideographs (and the extension-A block),
/// Hiragana/Katakana, and Hangul syllables.
fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        | 0x3040..=0x309F
        | 0x30A0..=0x30FF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
    )
}

/// Count of CJK characters in `text`, used as the CJK branch's
/// substitute for a syllable count.
#[must_use]
pub fn count_cjk_chars(text: &str) -> u32 {
    u32::try_from(text.chars().filter(|c| is_cjk(*c)).count()).unwrap_or(u32::MAX)
}

/// Pick the Latin or CJK branch by the ratio of CJK tokens to all word
/// tokens, crossing over at 0.3 (§4.4, boundary scenario 6).
///
/// Counted per word token rather than per raw character: Unicode word
/// segmentation has no dictionary for CJK scripts, so each ideograph
/// comes back as its own token while a run of Latin letters comes back
/// as one, which is what lets a handful of CJK words carry the same
/// weight as the Latin words around them instead of being diluted by
/// every letter in those words.
#[must_use]
pub fn detect(text: &str) -> Language {
    let words: Vec<&str> = text.unicode_words().collect();
    if words.is_empty() {
        return Language::Latin;
    }
    let cjk_words = words.iter().filter(|word| word.chars().any(is_cjk)).count();
    if (cjk_words as f64) / (words.len() as f64) > 0.3 {
        Language::Cjk
    } else {
        Language::Latin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_text_over_threshold_is_cjk() {
        assert_eq!(detect("你好 world 世界 hello"), Language::Cjk);
    }

    #[test]
    fn plain_latin_text_is_latin() {
        assert_eq!(detect("hello world"), Language::Latin);
    }

    #[test]
    fn empty_text_defaults_to_latin() {
        assert_eq!(detect("   "), Language::Latin);
    }
}
