use std::ops::Range;

use serde::{Deserialize, Serialize};

/// One of the two citation shapes this system recognizes in drafted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractedCitation {
    /// A bracketed numeric marker, e.g. `[3]`.
    Numbered { number: u32, span: (usize, usize) },
    /// An author-year parenthetical, e.g. `(Smith, 2021)`.
    AuthorYear {
        authors: String,
        year: i32,
        span: (usize, usize),
    },
}

impl ExtractedCitation {
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        match self {
            Self::Numbered { span, .. } | Self::AuthorYear { span, .. } => span.0..span.1,
        }
    }
}

/// A resolved bibliographic record, keyed by canonical DOI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationRecord {
    pub doi: String,
    pub pmid: Option<String>,
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub journal: String,
    pub volume: String,
    pub pages: String,
    pub url: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub is_valid: bool,
    pub validation_date: String,
    /// Relevance score when this record came back from a search, in `[0, 100]`.
    pub score: Option<f64>,
}

/// Citation formatting styles supported by [`crate::format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Apa,
    Mla,
    Chicago,
}

/// The outcome of checking one extracted citation against the bibliographic service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationCheck {
    pub citation: ExtractedCitation,
    pub status: CitationStatus,
    pub message: String,
    pub record: Option<CitationRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationStatus {
    Valid,
    Unverified,
}

/// A full bibliography validation pass over a draft's text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_citations: u32,
    pub valid_citations: u32,
    pub invalid_citations: u32,
    pub per_citation: Vec<CitationCheck>,
    pub validation_rate: f64,
}
