//! Core domain types for jobwatch.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// JobPosting
// ---------------------------------------------------------------------------

/// A single job posting scraped from the listing index.
///
/// `url` is the natural key: it identifies the posting in the store and is
/// the only field used when matching scraped postings to stored ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    /// Display title of the posting (non-empty).
    pub title: String,
    /// Absolute URL of the posting detail page.
    pub url: String,
    /// Employer display name.
    pub company: String,
    /// Publication date as `DD.MM.YYYY`.
    pub posted_at: String,
    /// Raw salary description from the detail page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_text: Option<String>,
    /// Monthly compensation estimate derived from `salary_text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_monthly: Option<f64>,
    /// Yearly figure derived from `normalized_monthly`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_yearly: Option<f64>,
}

impl JobPosting {
    /// Create a posting stub: listing fields only, no salary data.
    pub fn stub(
        title: impl Into<String>,
        url: impl Into<String>,
        company: impl Into<String>,
        posted_at: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            company: company.into(),
            posted_at: posted_at.into(),
            salary_text: None,
            normalized_monthly: None,
            normalized_yearly: None,
        }
    }

    /// Whether enrichment produced salary figures for this posting.
    pub fn has_salary(&self) -> bool {
        self.normalized_monthly.is_some()
    }
}
