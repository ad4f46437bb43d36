use std::time::Duration;

use chrono::Utc;
use scripta_cache::{Cache, Namespace};

use crate::crossref::{Work, WorkListResponse, WorkResponse};
use crate::error::CitationError;
use crate::extract;
use crate::format;
use crate::normalize::normalize_doi;
use crate::types::{CitationCheck, CitationRecord, CitationStatus, ExtractedCitation, Style, ValidationReport};

const DEFAULT_BASE_URL: &str = "https://api.crossref.org";
const USER_AGENT: &str = "scripta-writing-assistant/1.0 (mailto:support@example.com)";

/// Extracts citations, resolves them against CrossRef (through the
/// shared cache), and formats or validates the results.
pub struct CitationValidator {
    client: reqwest::Client,
    base_url: String,
    cache: Cache,
}

impl CitationValidator {
    #[must_use]
    pub fn new(cache: Cache) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client config is valid");
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            cache,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Pull numbered and author-year citations out of drafted text.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<ExtractedCitation> {
        extract::extract(text)
    }

    /// Render a resolved record in the requested citation style.
    #[must_use]
    pub fn format(&self, record: &CitationRecord, style: Style) -> String {
        format::format(record, style)
    }

    /// Resolve `doi` to a bibliographic record, preferring the cache.
    ///
    /// `Ok(None)` means the service does not recognize the DOI (a 404,
    /// or any other non-transport failure response) — that is a content
    /// fact, not an infrastructure error.
    pub async fn resolve(&self, doi: &str) -> Result<Option<CitationRecord>, CitationError> {
        let canonical = normalize_doi(doi);

        if let Some(record) = self.cache.get::<CitationRecord>(Namespace::Citation, &canonical).await {
            tracing::debug!(doi = %canonical, "citation cache hit");
            return Ok(Some(record));
        }

        let url = format!("{}/works/{}", self.base_url, canonical);
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::warn!(doi = %canonical, "DOI not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            tracing::error!(doi = %canonical, status = %response.status(), "CrossRef API error");
            return Ok(None);
        }

        let body: WorkResponse = response.json().await?;
        let record = work_to_record(&body.message, &canonical, None);

        self.cache.set(Namespace::Citation, &canonical, &record).await;
        Ok(Some(record))
    }

    /// Search CrossRef for works matching `query`, caching the page by
    /// `query:max_results` for an hour.
    pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<CitationRecord>, CitationError> {
        let cache_key = format!("{query}:{max_results}");

        if let Some(cached) = self.cache.get::<Vec<CitationRecord>>(Namespace::CrossrefSearch, &cache_key).await {
            tracing::debug!(%query, "crossref search cache hit");
            return Ok(cached);
        }

        let url = format!("{}/works", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", query),
                ("rows", &max_results.to_string()),
                ("sort", "relevance"),
                ("order", "desc"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::error!(%query, status = %response.status(), "CrossRef search error");
            return Ok(Vec::new());
        }

        let body: WorkListResponse = response.json().await?;
        let records: Vec<CitationRecord> = body
            .message
            .items
            .iter()
            .map(|work| {
                let doi = normalize_doi(&work.doi);
                work_to_record(work, &doi, Some(work.score))
            })
            .collect();

        self.cache.set(Namespace::CrossrefSearch, &cache_key, &records).await;
        Ok(records)
    }

    /// Validate every citation found in `text`: numbered citations pass
    /// on format alone, author-year citations must match a CrossRef
    /// search result scoring at least 80.
    pub async fn validate_bibliography(&self, text: &str) -> ValidationReport {
        let citations = self.extract(text);
        let total = citations.len() as u32;

        let mut valid = 0u32;
        let mut invalid = 0u32;
        let mut per_citation = Vec::with_capacity(citations.len());

        for citation in citations {
            let check = match &citation {
                ExtractedCitation::Numbered { .. } => {
                    valid += 1;
                    CitationCheck {
                        citation: citation.clone(),
                        status: CitationStatus::Valid,
                        message: "Numbered citation format detected".to_string(),
                        record: None,
                    }
                }
                ExtractedCitation::AuthorYear { authors, year, .. } => {
                    let query = format!("{authors} {year}");
                    let results = self.search(&query, 1).await.unwrap_or_default();
                    match results.first().filter(|r| r.score.unwrap_or(0.0) >= 80.0) {
                        Some(record) => {
                            valid += 1;
                            CitationCheck {
                                citation: citation.clone(),
                                status: CitationStatus::Valid,
                                message: "Citation verified via CrossRef".to_string(),
                                record: Some(record.clone()),
                            }
                        }
                        None => {
                            invalid += 1;
                            CitationCheck {
                                citation: citation.clone(),
                                status: CitationStatus::Unverified,
                                message: "Could not verify citation via CrossRef".to_string(),
                                record: None,
                            }
                        }
                    }
                }
            };
            per_citation.push(check);
        }

        let validation_rate = if total > 0 { f64::from(valid) / f64::from(total) } else { 1.0 };

        ValidationReport {
            total_citations: total,
            valid_citations: valid,
            invalid_citations: invalid,
            per_citation,
            validation_rate,
        }
    }
}

fn work_to_record(work: &Work, canonical_doi: &str, score: Option<f64>) -> CitationRecord {
    CitationRecord {
        doi: canonical_doi.to_string(),
        pmid: None,
        title: work.title(),
        authors: work.authors(),
        year: work.year(),
        journal: work.journal(),
        volume: work.volume.clone(),
        pages: work.pages.clone(),
        url: if canonical_doi.is_empty() {
            String::new()
        } else {
            format!("https://doi.org/{canonical_doi}")
        },
        abstract_text: None,
        is_valid: true,
        validation_date: Utc::now().to_rfc3339(),
        score,
    }
}
