//! End-to-end scrape run: fetch index → extract → reconcile → enrich new → persist.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, instrument, warn};

use jobwatch_crawler::{PageFetcher, extract_listings};
use jobwatch_salary::SalaryNormalizer;
use jobwatch_shared::{AppConfig, FetchConfig, JobPosting, Result, SiteConfig};
use jobwatch_storage::JobStore;

use crate::enrichment::enrich_postings;
use crate::reconcile;

/// Validated, immutable settings for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Target site layout.
    pub site: SiteConfig,
    /// Salary normalizer built from `[salary]`.
    pub normalizer: SalaryNormalizer,
    /// Fetch limits.
    pub fetch: FetchConfig,
}

impl PipelineConfig {
    /// Resolve the runtime settings from the loaded config file.
    pub fn from_app(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            site: SiteConfig::from_section(&config.site)?,
            normalizer: SalaryNormalizer::new(config.salary.clone())?,
            fetch: FetchConfig::from(&config.fetch),
        })
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// The full stored set after the run.
    pub postings: Vec<JobPosting>,
    /// Postings extracted from the index page.
    pub scraped: usize,
    /// Rows inserted into the store.
    pub inserted: u64,
    /// Rows deleted from the store.
    pub deleted: u64,
    /// New postings whose detail page could not be fetched.
    pub enrichment_failures: usize,
    /// Wall-clock duration of the run.
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each detail page settles.
    fn detail_fetched(&self, url: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn detail_fetched(&self, _url: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &RunReport) {}
}

/// The scrape-enrich-reconcile pipeline over a fetcher and a store.
///
/// Holds no state between runs; overlapping runs rely on the store's
/// idempotent insert and delete.
pub struct Pipeline<F, S> {
    fetcher: Arc<F>,
    store: Arc<S>,
    config: PipelineConfig,
}

impl<F, S> Pipeline<F, S>
where
    F: PageFetcher + 'static,
    S: JobStore,
{
    pub fn new(fetcher: Arc<F>, store: Arc<S>, config: PipelineConfig) -> Self {
        Self {
            fetcher,
            store,
            config,
        }
    }

    /// The store this pipeline writes to.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline once.
    ///
    /// 1. Fetch the listing index (failure aborts before any write)
    /// 2. Extract posting stubs
    /// 3. Diff against the stored set and delete postings no longer listed
    /// 4. Enrich only the new postings with salary data
    /// 5. Insert them and return the full stored set
    #[instrument(skip_all, fields(listing = %self.config.site.listing_url))]
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<RunReport> {
        let start = Instant::now();
        let site = &self.config.site;

        // --- Phase 1: Index ---
        progress.phase("Fetching listing index");
        let markup = self.fetcher.fetch(&site.listing_url).await?;

        // --- Phase 2: Extract ---
        progress.phase("Extracting postings");
        let scraped = extract_listings(&markup, site);

        // --- Phase 3: Reconcile ---
        progress.phase("Reconciling with stored postings");
        let stored = self.store.get_all().await?;
        if scraped.is_empty() && !stored.is_empty() {
            warn!(
                stored = stored.len(),
                "listing index yielded no postings; every stored posting will be removed"
            );
        }

        let plan = reconcile::diff(&stored, &scraped);
        info!(
            scraped = scraped.len(),
            new = plan.to_insert.len(),
            removed = plan.to_delete.len(),
            unchanged = plan.unchanged,
            "reconciliation computed"
        );

        let deleted = self.store.delete_by_urls(&plan.delete_urls()).await?;

        let mut report = RunReport {
            postings: Vec::new(),
            scraped: scraped.len(),
            inserted: 0,
            deleted,
            enrichment_failures: 0,
            elapsed: Duration::ZERO,
        };

        // --- Phase 4: Enrich & persist ---
        if !plan.to_insert.is_empty() {
            progress.phase("Fetching salary details");
            let outcome = enrich_postings(
                self.fetcher.clone(),
                plan.to_insert,
                &site.salary_label,
                &self.config.normalizer,
                &self.config.fetch,
                progress,
            )
            .await;
            report.enrichment_failures = outcome.failures;

            progress.phase("Saving new postings");
            report.inserted = self.store.insert_many(&outcome.postings).await?;
        }

        report.postings = self.store.get_all().await?;
        report.elapsed = start.elapsed();

        progress.done(&report);

        info!(
            total = report.postings.len(),
            inserted = report.inserted,
            deleted = report.deleted,
            enrichment_failures = report.enrichment_failures,
            elapsed_ms = report.elapsed.as_millis(),
            "pipeline run complete"
        );

        Ok(report)
    }
}
