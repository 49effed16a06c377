//! Listing index extraction.
//!
//! The index page is a table with one posting per `tbody` row. A row yields a
//! posting stub only if it has a title link, a company link and a `<time>`
//! element; anything else is treated as layout noise and skipped.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use jobwatch_shared::{JobPosting, JobwatchError, Result, SiteConfig};

/// Display format for `JobPosting::posted_at`.
const POSTED_AT_FORMAT: &str = "%d.%m.%Y";

static ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody > tr").expect("valid selector"));
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.name h3 a").expect("valid selector"));
static COMPANY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.company a").expect("valid selector"));
static TIME_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.last_msg time").expect("valid selector"));

/// Extract posting stubs from the listing index markup, in row order.
///
/// Salary fields are left empty. Malformed or empty markup yields an empty list.
pub fn extract_listings(markup: &str, site: &SiteConfig) -> Vec<JobPosting> {
    let doc = Html::parse_document(markup);
    let mut seen: HashSet<String> = HashSet::new();
    let mut postings = Vec::new();
    let mut rows = 0usize;

    for row in doc.select(&ROW_SEL) {
        rows += 1;

        let Some(fields) = RowFields::from_row(row) else {
            debug!(row = rows, "listing row missing title, company or time, skipping");
            continue;
        };

        match fields.into_posting(site) {
            Ok(posting) => {
                if seen.insert(posting.url.clone()) {
                    postings.push(posting);
                } else {
                    debug!(url = %posting.url, "duplicate listing row, keeping first");
                }
            }
            Err(e) => {
                warn!(row = rows, error = %e, "listing row failed validation, skipping");
            }
        }
    }

    debug!(rows, postings = postings.len(), "listing extracted");
    postings
}

/// The raw pieces of one listing row.
struct RowFields<'a> {
    title: ElementRef<'a>,
    company: ElementRef<'a>,
    time: ElementRef<'a>,
}

impl<'a> RowFields<'a> {
    fn from_row(row: ElementRef<'a>) -> Option<Self> {
        Some(Self {
            title: row.select(&TITLE_SEL).next()?,
            company: row.select(&COMPANY_SEL).next()?,
            time: row.select(&TIME_SEL).next()?,
        })
    }

    fn into_posting(self, site: &SiteConfig) -> Result<JobPosting> {
        let title = element_text(self.title);
        if title.is_empty() {
            return Err(JobwatchError::validation("empty posting title"));
        }

        let href = self
            .title
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| JobwatchError::validation(format!("'{title}' has no link")))?;

        let url = format!("{}{href}", site.origin);
        Url::parse(&url)
            .map_err(|e| JobwatchError::validation(format!("bad posting url '{url}': {e}")))?;

        let datetime = self
            .time
            .value()
            .attr("datetime")
            .ok_or_else(|| JobwatchError::parse(format!("'{title}' has no datetime")))?;
        let posted_at = normalize_posted_at(datetime)?;

        Ok(JobPosting::stub(
            title,
            url,
            element_text(self.company),
            posted_at,
        ))
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Render a machine-readable `datetime` attribute as `DD.MM.YYYY`.
///
/// Timestamps with an offset keep the calendar date of that offset.
pub fn normalize_posted_at(raw: &str) -> Result<String> {
    let raw = raw.trim();

    let date = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        dt.date_naive()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        dt.date()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        dt.date()
    } else if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        d
    } else {
        return Err(JobwatchError::parse(format!("unrecognized datetime '{raw}'")));
    };

    Ok(date.format(POSTED_AT_FORMAT).to_string())
}
