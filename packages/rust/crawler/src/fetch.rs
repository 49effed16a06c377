//! Page fetching.
//!
//! [`PageFetcher`] is the seam between the pipeline and the network: it turns
//! a URL into raw markup or a transport error. [`HttpFetcher`] is the
//! `reqwest`-backed implementation used in production.

use std::future::Future;

use reqwest::Client;
use tracing::debug;

use jobwatch_shared::{FetchConfig, JobwatchError, Result};

/// User-Agent string for all requests.
const USER_AGENT: &str = concat!("jobwatch/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Fetches raw page markup.
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its body as text.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// HTTP page fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher with the configured client-level timeout.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.timeout)
            .build()
            .map_err(client_build_error)?;

        Ok(Self { client })
    }
}

/// A client that cannot be built is a setup problem, not a failed request.
fn client_build_error(err: impl std::fmt::Display) -> JobwatchError {
    JobwatchError::config(format!("failed to build HTTP client: {err}"))
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| JobwatchError::transport(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JobwatchError::transport(url, format!("HTTP {status}")));
        }

        // Decodes using the charset from Content-Type, defaulting to UTF-8.
        response
            .text()
            .await
            .map_err(|e| JobwatchError::transport(url, format!("body read failed: {e}")))
    }
}
