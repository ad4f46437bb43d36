/// Approximate English syllable count: vowel groups, minus one for a
/// trailing silent `e`, floored at one for any non-empty word (§4.4).
#[must_use]
pub fn count(word: &str) -> u32 {
    let lower: String = word.chars().filter(|c| c.is_alphabetic()).map(|c| c.to_ascii_lowercase()).collect();
    if lower.is_empty() {
        return 0;
    }

    let chars: Vec<char> = lower.chars().collect();
    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');

    let mut groups = 0u32;
    let mut prev_vowel = false;
    for &c in &chars {
        let vowel = is_vowel(c);
        if vowel && !prev_vowel {
            groups += 1;
        }
        prev_vowel = vowel;
    }

    if chars.len() > 1 && *chars.last().expect("non-empty") == 'e' {
        groups = groups.saturating_sub(1);
    }

    groups.max(1)
}
