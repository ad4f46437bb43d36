use crate::types::{CitationRecord, Style};

/// Render `record` per `style`. Each style has its own author-list
/// elision rule; everything else (title, venue, DOI) is assembled the
/// same way.
///
/// Authors are stored `"Family, Given"` (CrossRef's own ordering); MLA
/// and Chicago need the non-lead authors in natural order, so those
/// branches invert back where the style calls for it.
#[must_use]
pub fn format(record: &CitationRecord, style: Style) -> String {
    match style {
        Style::Apa => format_apa(record),
        Style::Mla => format_mla(record),
        Style::Chicago => format_chicago(record),
    }
}

fn invert_to_natural(author: &str) -> String {
    match author.split_once(", ") {
        Some((family, given)) => format!("{given} {family}"),
        None => author.to_string(),
    }
}

fn apa_author_list(authors: &[String]) -> String {
    match authors.len() {
        0 => "Unknown Author".to_string(),
        1 => authors[0].clone(),
        2..=6 => {
            let (head, last) = authors.split_at(authors.len() - 1);
            format!("{}, & {}", head.join(", "), last[0])
        }
        _ => format!("{}, ... {}", authors[..6].join(", "), authors[authors.len() - 1]),
    }
}

fn format_apa(record: &CitationRecord) -> String {
    let authors = apa_author_list(&record.authors);
    let year = record.year.map(|y| y.to_string()).unwrap_or_else(|| "n.d.".to_string());
    let title = if record.title.is_empty() {
        "Unknown Title"
    } else {
        &record.title
    };

    let mut citation = format!("{authors} ({year}). {title}.");

    if !record.journal.is_empty() {
        citation.push_str(&format!(" {}", record.journal));
        if !record.volume.is_empty() {
            citation.push_str(&format!(", {}", record.volume));
        }
        if !record.pages.is_empty() {
            citation.push_str(&format!(", {}", record.pages));
        }
        citation.push('.');
    }

    if !record.doi.is_empty() {
        citation.push_str(&format!(" https://doi.org/{}", record.doi));
    }

    citation
}

fn mla_author_list(authors: &[String]) -> String {
    match authors.len() {
        0 => "Unknown Author".to_string(),
        1 => authors[0].clone(),
        2 => format!("{}, and {}", authors[0], invert_to_natural(&authors[1])),
        _ => format!("{}, et al.", authors[0]),
    }
}

fn format_mla(record: &CitationRecord) -> String {
    let authors = mla_author_list(&record.authors);
    let title = if record.title.is_empty() {
        "Unknown Title"
    } else {
        &record.title
    };

    let mut citation = format!("{authors}. \"{title}.\"");

    if !record.journal.is_empty() {
        citation.push_str(&format!(" {}", record.journal));
        if !record.volume.is_empty() {
            citation.push_str(&format!(", vol. {}", record.volume));
        }
        if let Some(year) = record.year {
            citation.push_str(&format!(", {year}"));
        }
        if !record.pages.is_empty() {
            citation.push_str(&format!(", pp. {}", record.pages));
        }
        citation.push('.');
    }

    citation
}

fn chicago_author_list(authors: &[String]) -> String {
    match authors.len() {
        0 => "Unknown Author".to_string(),
        1 => authors[0].clone(),
        2..=7 => {
            let (head, last) = authors.split_at(authors.len() - 1);
            let head_natural: Vec<String> = head[1..].iter().map(|a| invert_to_natural(a)).collect();
            let mut parts = vec![head[0].clone()];
            parts.extend(head_natural);
            format!("{}, and {}", parts.join(", "), invert_to_natural(&last[0]))
        }
        _ => format!("{}, et al.", authors[0]),
    }
}

fn format_chicago(record: &CitationRecord) -> String {
    let authors = chicago_author_list(&record.authors);
    let year = record.year.map(|y| y.to_string()).unwrap_or_else(|| "n.d.".to_string());
    let title = if record.title.is_empty() {
        "Unknown Title"
    } else {
        &record.title
    };

    let mut citation = format!("{authors}. {year}. \"{title}.\"");

    if !record.journal.is_empty() {
        citation.push_str(&format!(" {}", record.journal));
        if !record.volume.is_empty() {
            citation.push_str(&format!(" {}", record.volume));
        }
        if !record.pages.is_empty() {
            citation.push_str(&format!(": {}", record.pages));
        }
        citation.push('.');
    }

    citation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(authors: Vec<&str>) -> CitationRecord {
        CitationRecord {
            doi: "10.1000/abc".to_string(),
            pmid: None,
            title: "A Study of Things".to_string(),
            authors: authors.into_iter().map(str::to_string).collect(),
            year: Some(2022),
            journal: "Journal of Examples".to_string(),
            volume: "4".to_string(),
            pages: "1-10".to_string(),
            url: "https://doi.org/10.1000/abc".to_string(),
            abstract_text: None,
            is_valid: true,
            validation_date: "2022-01-01T00:00:00Z".to_string(),
            score: None,
        }
    }

    #[test]
    fn apa_uses_ampersand_before_last_author() {
        let record = sample(vec!["Smith, Jane", "Doe, John"]);
        let out = format(&record, Style::Apa);
        assert!(out.starts_with("Smith, Jane, & Doe, John (2022)."));
    }

    #[test]
    fn apa_elides_after_six_authors() {
        let record = sample(vec!["A, A", "B, B", "C, C", "D, D", "E, E", "F, F", "G, G"]);
        let out = format(&record, Style::Apa);
        assert!(out.contains("... G, G"));
    }

    #[test]
    fn mla_inverts_only_the_first_author() {
        let record = sample(vec!["Smith, Jane", "Doe, John"]);
        let out = format(&record, Style::Mla);
        assert!(out.starts_with("Smith, Jane, and John Doe."));
    }

    #[test]
    fn mla_uses_et_al_for_three_or_more() {
        let record = sample(vec!["Smith, Jane", "Doe, John", "Lee, Amy"]);
        let out = format(&record, Style::Mla);
        assert!(out.starts_with("Smith, Jane, et al."));
    }

    #[test]
    fn chicago_lists_year_after_authors() {
        let record = sample(vec!["Smith, Jane"]);
        let out = format(&record, Style::Chicago);
        assert!(out.starts_with("Smith, Jane. 2022."));
    }
}
