//! Salary enrichment for newly listed postings.
//!
//! Each posting's detail page is fetched on its own task. A failed or timed
//! out fetch leaves that one posting without salary data; siblings carry on.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use jobwatch_crawler::{PageFetcher, extract_salary_text};
use jobwatch_salary::SalaryNormalizer;
use jobwatch_shared::{FetchConfig, JobPosting, JobwatchError, Result};

use crate::pipeline::ProgressReporter;

/// Enriched postings plus the number that could not be enriched.
#[derive(Debug, Default)]
pub struct EnrichmentOutcome {
    /// Input postings in input order, salary fields filled where possible.
    pub postings: Vec<JobPosting>,
    /// Postings whose detail fetch failed or timed out.
    pub failures: usize,
}

/// Fetch detail pages for `postings` concurrently and derive salary fields.
#[instrument(skip_all, fields(postings = postings.len()))]
pub async fn enrich_postings<F>(
    fetcher: Arc<F>,
    postings: Vec<JobPosting>,
    salary_label: &str,
    normalizer: &SalaryNormalizer,
    fetch: &FetchConfig,
    progress: &dyn ProgressReporter,
) -> EnrichmentOutcome
where
    F: PageFetcher + 'static,
{
    let semaphore = Arc::new(Semaphore::new(fetch.max_concurrent_details));
    let label: Arc<str> = Arc::from(salary_label);
    let total = postings.len();

    let mut handles = Vec::with_capacity(total);
    for posting in &postings {
        let fetcher = fetcher.clone();
        let sem = semaphore.clone();
        let label = label.clone();
        let url = posting.url.clone();
        let timeout = fetch.detail_timeout;

        handles.push(tokio::spawn(async move {
            let _permit = sem
                .acquire()
                .await
                .map_err(|e| JobwatchError::transport(&url, e.to_string()))?;
            fetch_salary_text(fetcher.as_ref(), &url, &label, timeout).await
        }));
    }

    let mut outcome = EnrichmentOutcome {
        postings: Vec::with_capacity(total),
        failures: 0,
    };

    for (i, (mut posting, handle)) in postings.into_iter().zip(handles).enumerate() {
        let salary_text = match handle.await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(url = %posting.url, error = %e, "detail fetch failed, no salary data");
                outcome.failures += 1;
                None
            }
            Err(e) => {
                warn!(url = %posting.url, error = %e, "detail task aborted, no salary data");
                outcome.failures += 1;
                None
            }
        };
        progress.detail_fetched(&posting.url, i + 1, total);

        let estimate = normalizer.estimate(salary_text.as_deref());
        posting.salary_text = salary_text;
        posting.normalized_monthly = estimate.monthly;
        posting.normalized_yearly = estimate.yearly;
        outcome.postings.push(posting);
    }

    debug!(
        enriched = outcome.postings.iter().filter(|p| p.has_salary()).count(),
        failures = outcome.failures,
        "enrichment finished"
    );

    outcome
}

/// Fetch one detail page within `timeout` and pull out its salary text.
async fn fetch_salary_text<F: PageFetcher>(
    fetcher: &F,
    url: &str,
    label: &str,
    timeout: Duration,
) -> Result<Option<String>> {
    let markup = tokio::time::timeout(timeout, fetcher.fetch(url))
        .await
        .map_err(|_| {
            JobwatchError::transport(url, format!("timed out after {}ms", timeout.as_millis()))
        })??;

    Ok(extract_salary_text(&markup, label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::pipeline::SilentProgress;

    /// Serves a fixed salary page and tracks how many fetches overlap.
    #[derive(Default)]
    struct CountingFetcher {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl PageFetcher for CountingFetcher {
        async fn fetch(&self, _url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(10)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok("<dl><dt>Plačilo:</dt><dd>2500 EUR</dd></dl>".into())
        }
    }

    fn postings(n: u32) -> Vec<JobPosting> {
        (0..n)
            .map(|i| {
                JobPosting::stub(
                    format!("Posting {i}"),
                    format!("https://slo-tech.com/delo/{i}"),
                    "Acme",
                    "01.03.2024",
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn in_flight_fetches_capped_but_all_issued() {
        let fetcher = Arc::new(CountingFetcher::default());
        let fetch = FetchConfig {
            max_concurrent_details: 3,
            ..FetchConfig::default()
        };

        let outcome = enrich_postings(
            fetcher.clone(),
            postings(20),
            "Plačilo:",
            &SalaryNormalizer::default(),
            &fetch,
            &SilentProgress,
        )
        .await;

        let peak = fetcher.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak in flight was {peak}");
        assert!(peak >= 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 20);

        assert_eq!(outcome.failures, 0);
        assert_eq!(outcome.postings.len(), 20);
        assert!(outcome.postings.iter().all(|p| p.normalized_monthly == Some(2500.0)));

        let urls: Vec<&str> = outcome.postings.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls[0], "https://slo-tech.com/delo/0");
        assert_eq!(urls[19], "https://slo-tech.com/delo/19");
    }
}
