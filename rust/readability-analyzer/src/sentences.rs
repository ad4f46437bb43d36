use std::sync::LazyLock;

use regex::Regex;

use crate::types::Language;

static CJK_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[。！？；\n]").expect("valid regex"));
static LATIN_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]").expect("valid regex"));

/// Split `text` into non-empty sentences on the language-appropriate
/// boundary characters (§4.4).
#[must_use]
pub fn split(text: &str, language: Language) -> Vec<&str> {
    let boundary = match language {
        Language::Cjk => &*CJK_BOUNDARY,
        Language::Latin => &*LATIN_BOUNDARY,
    };
    boundary
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_latin_on_terminal_punctuation() {
        let sentences = split("One. Two! Three?", Language::Latin);
        assert_eq!(sentences, vec!["One", "Two", "Three"]);
    }

    #[test]
    fn splits_cjk_on_fullwidth_punctuation() {
        let sentences = split("你好。今天天气怎么样？很好！", Language::Cjk);
        assert_eq!(sentences.len(), 3);
    }

    #[test]
    fn empty_text_has_no_sentences() {
        assert!(split("", Language::Latin).is_empty());
    }
}
