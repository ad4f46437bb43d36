//! Citation extraction, DOI resolution, and bibliography validation.
//!
//! Two citation shapes are recognized in drafted text: bracketed numeric
//! markers (`[3]`) and author-year parentheticals (`(Smith, 2021)`).
//! Numbered citations are trusted on format alone (there is nothing in
//! the text to resolve them against); author-year citations are checked
//! against a CrossRef search, through the shared [`scripta_cache::Cache`]
//! so repeated lookups within a record's TTL don't leave the process.

mod crossref;
mod error;
mod extract;
mod format;
mod normalize;
mod types;
mod validator;

pub use error::CitationError;
pub use normalize::normalize_doi;
pub use types::{CitationCheck, CitationRecord, CitationStatus, ExtractedCitation, Style, ValidationReport};
pub use validator::CitationValidator;

#[cfg(test)]
mod tests {
    use scripta_cache::Cache;

    use super::*;

    #[tokio::test]
    async fn bibliography_with_no_citations_has_validation_rate_one() {
        let validator = CitationValidator::new(Cache::in_memory("test"));
        let report = validator.validate_bibliography("No citations anywhere in this text.").await;
        assert_eq!(report.total_citations, 0);
        assert_eq!(report.validation_rate, 1.0);
    }

    #[tokio::test]
    async fn numbered_citations_pass_on_format_alone() {
        let validator = CitationValidator::new(Cache::in_memory("test"));
        let report = validator
            .validate_bibliography("This claim is supported [1] and so is this one [2].")
            .await;
        assert_eq!(report.total_citations, 2);
        assert_eq!(report.valid_citations, 2);
        assert_eq!(report.validation_rate, 1.0);
    }
}
