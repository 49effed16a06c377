//! Reconciliation of stored postings against a fresh scrape.
//!
//! Postings are matched by `url` only. A stored posting whose url is still
//! listed is left alone even if its title, company or date changed upstream.

use std::collections::HashSet;

use jobwatch_shared::JobPosting;

/// Insert and delete sets for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Stored postings no longer listed.
    pub to_delete: Vec<JobPosting>,
    /// Scraped postings not yet stored, in scrape order.
    pub to_insert: Vec<JobPosting>,
    /// Postings present on both sides.
    pub unchanged: usize,
}

impl Reconciliation {
    /// Urls of `to_delete`, for the store.
    pub fn delete_urls(&self) -> Vec<String> {
        self.to_delete.iter().map(|p| p.url.clone()).collect()
    }

    /// Whether the store needs no changes.
    pub fn is_noop(&self) -> bool {
        self.to_delete.is_empty() && self.to_insert.is_empty()
    }
}

/// Compute what to delete from and insert into the store.
pub fn diff(stored: &[JobPosting], scraped: &[JobPosting]) -> Reconciliation {
    let stored_urls: HashSet<&str> = stored.iter().map(|p| p.url.as_str()).collect();
    let scraped_urls: HashSet<&str> = scraped.iter().map(|p| p.url.as_str()).collect();

    let mut result = Reconciliation::default();

    let mut seen: HashSet<&str> = HashSet::new();
    for posting in scraped {
        if !seen.insert(posting.url.as_str()) {
            continue;
        }
        if stored_urls.contains(posting.url.as_str()) {
            result.unchanged += 1;
        } else {
            result.to_insert.push(posting.clone());
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for posting in stored {
        if seen.insert(posting.url.as_str()) && !scraped_urls.contains(posting.url.as_str()) {
            result.to_delete.push(posting.clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn posting(n: u32) -> JobPosting {
        JobPosting::stub(
            format!("Posting {n}"),
            format!("https://slo-tech.com/delo/{n}"),
            "Acme",
            "01.03.2024",
        )
    }

    fn subset(mask: u32) -> Vec<JobPosting> {
        (0..6).filter(|i| mask & (1 << i) != 0).map(posting).collect()
    }

    fn urls(postings: &[JobPosting]) -> BTreeSet<String> {
        postings.iter().map(|p| p.url.clone()).collect()
    }

    #[test]
    fn new_and_removed_postings() {
        let stored = vec![posting(1), posting(2)];
        let scraped = vec![posting(3), posting(2)];
        let r = diff(&stored, &scraped);

        assert_eq!(r.to_insert, vec![posting(3)]);
        assert_eq!(r.to_delete, vec![posting(1)]);
        assert_eq!(r.unchanged, 1);
        assert_eq!(r.delete_urls(), vec!["https://slo-tech.com/delo/1".to_string()]);
    }

    #[test]
    fn changed_fields_on_same_url_are_not_updates() {
        let stored = vec![posting(1)];
        let scraped = vec![JobPosting {
            title: "Renamed".into(),
            company: "Other".into(),
            ..posting(1)
        }];
        let r = diff(&stored, &scraped);
        assert!(r.is_noop());
        assert_eq!(r.unchanged, 1);
    }

    #[test]
    fn duplicate_scraped_urls_inserted_once() {
        let r = diff(&[], &[posting(1), posting(1)]);
        assert_eq!(r.to_insert.len(), 1);
    }

    #[test]
    fn empty_scrape_deletes_everything() {
        let r = diff(&[posting(1), posting(2)], &[]);
        assert_eq!(r.to_delete.len(), 2);
        assert!(r.to_insert.is_empty());
    }

    #[test]
    fn diff_properties_hold_for_all_subsets() {
        for s in 0..64u32 {
            for t in 0..64u32 {
                let stored = subset(s);
                let scraped = subset(t);
                let r = diff(&stored, &scraped);

                let insert = urls(&r.to_insert);
                let delete = urls(&r.to_delete);
                assert!(insert.is_disjoint(&delete), "s={s} t={t}");

                let mut result = urls(&stored);
                result.retain(|u| !delete.contains(u));
                result.extend(insert);
                assert_eq!(result, urls(&scraped), "s={s} t={t}");
            }
        }
    }
}
