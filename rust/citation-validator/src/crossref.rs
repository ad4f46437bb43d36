//! Deserialization of the subset of the CrossRef `works` response shape
//! this system needs. Modeled on the real API's `message.author`,
//! `message.title`, and `published-print`/`published-online` fields.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct WorkResponse {
    pub message: Work,
}

#[derive(Debug, Deserialize)]
pub struct WorkListResponse {
    pub message: WorkListMessage,
}

#[derive(Debug, Deserialize)]
pub struct WorkListMessage {
    pub items: Vec<Work>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Work {
    #[serde(default, rename = "DOI")]
    pub doi: String,
    #[serde(default)]
    pub title: Vec<String>,
    #[serde(default)]
    pub author: Vec<Author>,
    #[serde(rename = "published-print")]
    pub published_print: Option<DateParts>,
    #[serde(rename = "published-online")]
    pub published_online: Option<DateParts>,
    #[serde(default, rename = "container-title")]
    pub container_title: Vec<String>,
    #[serde(default)]
    pub volume: String,
    #[serde(default, rename = "page")]
    pub pages: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub given: String,
    #[serde(default)]
    pub family: String,
}

#[derive(Debug, Deserialize)]
pub struct DateParts {
    #[serde(rename = "date-parts")]
    pub date_parts: Vec<Vec<i32>>,
}

impl Work {
    pub fn authors(&self) -> Vec<String> {
        self.author
            .iter()
            .filter(|a| !a.family.is_empty())
            .map(|a| {
                if a.given.is_empty() {
                    a.family.clone()
                } else {
                    format!("{}, {}", a.family, a.given)
                }
            })
            .collect()
    }

    pub fn year(&self) -> Option<i32> {
        self.published_print
            .as_ref()
            .or(self.published_online.as_ref())
            .and_then(|d| d.date_parts.first())
            .and_then(|parts| parts.first())
            .copied()
    }

    pub fn title(&self) -> String {
        self.title.first().cloned().unwrap_or_default()
    }

    pub fn journal(&self) -> String {
        self.container_title.first().cloned().unwrap_or_default()
    }
}
