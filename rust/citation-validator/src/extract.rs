use std::sync::LazyLock;

use regex::Regex;

use crate::types::ExtractedCitation;

static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("valid regex"));
static AUTHOR_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([A-Za-z][A-Za-z\s,.&]*),\s*(\d{4})\)").expect("valid regex"));

/// Extract both citation shapes from drafted text, ordered by position.
///
/// The two patterns never overlap in practice (one requires brackets, the
/// other parens), so citations are simply unique by span already.
#[must_use]
pub fn extract(text: &str) -> Vec<ExtractedCitation> {
    let mut citations: Vec<ExtractedCitation> = Vec::new();

    for captures in NUMBERED.captures_iter(text) {
        let whole = captures.get(0).expect("group 0 always matches");
        let Ok(number) = captures[1].parse() else {
            continue;
        };
        citations.push(ExtractedCitation::Numbered {
            number,
            span: (whole.start(), whole.end()),
        });
    }

    for captures in AUTHOR_YEAR.captures_iter(text) {
        let whole = captures.get(0).expect("group 0 always matches");
        let Ok(year) = captures[2].parse() else {
            continue;
        };
        citations.push(ExtractedCitation::AuthorYear {
            authors: captures[1].trim().to_string(),
            year,
            span: (whole.start(), whole.end()),
        });
    }

    citations.sort_by_key(|c| c.span().start);
    citations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_numbered_citations() {
        let citations = extract("This is known [1] and so is this [12].");
        assert_eq!(citations.len(), 2);
        assert!(matches!(citations[0], ExtractedCitation::Numbered { number: 1, .. }));
        assert!(matches!(citations[1], ExtractedCitation::Numbered { number: 12, .. }));
    }

    #[test]
    fn extracts_author_year_citations() {
        let citations = extract("As shown previously (Smith, 2021), the effect holds.");
        assert_eq!(citations.len(), 1);
        match &citations[0] {
            ExtractedCitation::AuthorYear { authors, year, .. } => {
                assert_eq!(authors, "Smith");
                assert_eq!(*year, 2021);
            }
            other => panic!("expected author-year citation, got {other:?}"),
        }
    }

    #[test]
    fn orders_mixed_citations_by_position() {
        let citations = extract("(Jones, 2019) then [1] then (Lee, 2020).");
        assert_eq!(citations.len(), 3);
        assert!(citations.windows(2).all(|w| w[0].span().start <= w[1].span().start));
    }

    #[test]
    fn ignores_text_with_no_citations() {
        assert!(extract("No citations here at all.").is_empty());
    }
}
