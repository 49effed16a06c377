//! The keyed record store the reconciler works against.

use std::future::Future;

use jobwatch_shared::{JobPosting, Result};

/// A set of persisted postings keyed by `url`.
///
/// Both write operations are idempotent so that overlapping pipeline runs
/// stay safe without locking: deleting an absent key and inserting an
/// existing key are silent no-ops.
pub trait JobStore: Send + Sync {
    /// All persisted postings.
    fn get_all(&self) -> impl Future<Output = Result<Vec<JobPosting>>> + Send;

    /// Delete postings by url. Returns how many rows were removed.
    fn delete_by_urls(&self, urls: &[String]) -> impl Future<Output = Result<u64>> + Send;

    /// Insert postings, skipping any whose url is already stored.
    /// Returns how many rows were actually inserted.
    fn insert_many(&self, postings: &[JobPosting]) -> impl Future<Output = Result<u64>> + Send;
}
