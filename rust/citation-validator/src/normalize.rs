/// Canonicalize a DOI: strip a leading resolver URL, lowercase, trim.
///
/// Idempotent — normalizing an already-canonical DOI is a no-op — which
/// is what lets [`CitationRecord`](crate::CitationRecord) be keyed
/// reliably by this value.
#[must_use]
pub fn normalize_doi(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_prefix("https://doi.org/")
        .or_else(|| trimmed.strip_prefix("http://dx.doi.org/"))
        .or_else(|| trimmed.strip_prefix("https://dx.doi.org/"))
        .or_else(|| trimmed.strip_prefix("http://doi.org/"))
        .unwrap_or(trimmed);
    stripped.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_known_resolver_prefixes() {
        assert_eq!(normalize_doi("https://doi.org/10.1000/ABC"), "10.1000/abc");
        assert_eq!(normalize_doi("http://dx.doi.org/10.1000/ABC"), "10.1000/abc");
        assert_eq!(normalize_doi("  10.1000/XYZ  "), "10.1000/xyz");
    }

    #[test]
    fn is_idempotent() {
        let once = normalize_doi("https://doi.org/10.1000/ABC");
        assert_eq!(normalize_doi(&once), once);
    }
}
