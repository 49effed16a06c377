//! libSQL storage layer for persisted job postings.
//!
//! The [`Storage`] struct wraps a local libSQL database and implements
//! [`JobStore`], the get-all / delete-by-urls / insert-many contract the
//! pipeline reconciles against.

mod migrations;
mod store;

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use jobwatch_shared::{JobPosting, JobwatchError, Result};
use libsql::{Connection, Database, params};

pub use store::JobStore;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| JobwatchError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| JobwatchError::Persistence(e.to_string()))?;

        Self::from_database(db).await
    }

    /// Open a fresh in-memory database (tests and dry runs).
    pub async fn open_in_memory() -> Result<Self> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| JobwatchError::Persistence(e.to_string()))?;

        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| JobwatchError::Persistence(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        JobwatchError::Persistence(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
                self.conn
                    .execute(
                        "INSERT OR IGNORE INTO schema_migrations (version) VALUES (?1)",
                        params![migration.version],
                    )
                    .await
                    .map_err(|e| JobwatchError::Persistence(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Check that the database answers queries.
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .query("SELECT 1", params![])
            .await
            .map_err(|e| JobwatchError::Persistence(e.to_string()))?;
        Ok(())
    }
}

impl JobStore for Storage {
    /// Newest batch first; within a batch, listing order.
    async fn get_all(&self) -> Result<Vec<JobPosting>> {
        let mut rows = self
            .conn
            .query(
                "SELECT title, url, company, posted_at, salary_text, normalized_monthly, normalized_yearly
                 FROM job_postings ORDER BY first_seen_at DESC, id ASC",
                params![],
            )
            .await
            .map_err(|e| JobwatchError::Persistence(e.to_string()))?;

        let mut results = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => results.push(row_to_posting(&row)?),
                Ok(None) => break,
                Err(e) => return Err(JobwatchError::Persistence(e.to_string())),
            }
        }
        Ok(results)
    }

    async fn delete_by_urls(&self, urls: &[String]) -> Result<u64> {
        let mut deleted = 0;
        for url in urls {
            deleted += self
                .conn
                .execute("DELETE FROM job_postings WHERE url = ?1", params![url.as_str()])
                .await
                .map_err(|e| JobwatchError::Persistence(e.to_string()))?;
        }
        Ok(deleted)
    }

    async fn insert_many(&self, postings: &[JobPosting]) -> Result<u64> {
        let first_seen_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let mut inserted = 0;
        for posting in postings {
            inserted += self
                .conn
                .execute(
                    "INSERT INTO job_postings
                       (url, title, company, posted_at, salary_text, normalized_monthly, normalized_yearly, first_seen_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(url) DO NOTHING",
                    params![
                        posting.url.as_str(),
                        posting.title.as_str(),
                        posting.company.as_str(),
                        posting.posted_at.as_str(),
                        posting.salary_text.as_deref(),
                        posting.normalized_monthly,
                        posting.normalized_yearly,
                        first_seen_at.as_str(),
                    ],
                )
                .await
                .map_err(|e| JobwatchError::Persistence(e.to_string()))?;
        }
        Ok(inserted)
    }
}

/// Convert a database row to a [`JobPosting`].
fn row_to_posting(row: &libsql::Row) -> Result<JobPosting> {
    Ok(JobPosting {
        title: row
            .get::<String>(0)
            .map_err(|e| JobwatchError::Persistence(e.to_string()))?,
        url: row
            .get::<String>(1)
            .map_err(|e| JobwatchError::Persistence(e.to_string()))?,
        company: row
            .get::<String>(2)
            .map_err(|e| JobwatchError::Persistence(e.to_string()))?,
        posted_at: row
            .get::<String>(3)
            .map_err(|e| JobwatchError::Persistence(e.to_string()))?,
        salary_text: row.get::<String>(4).ok(),
        normalized_monthly: row.get::<f64>(5).ok(),
        normalized_yearly: row.get::<f64>(6).ok(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(n: u32) -> JobPosting {
        JobPosting::stub(
            format!("Posting {n}"),
            format!("https://slo-tech.com/delo/{n}"),
            "Acme",
            "01.03.2024",
        )
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = Storage::open_in_memory().await.expect("open");
        assert_eq!(storage.get_schema_version().await, 1);
        storage.ping().await.expect("ping");
    }

    #[tokio::test]
    async fn idempotent_migration_on_reopen() {
        let tmp = std::env::temp_dir().join(format!(
            "jobwatch_test_{}_{}.db",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let s1 = Storage::open(&tmp).await.expect("first open");
        s1.insert_many(&[posting(1)]).await.unwrap();
        drop(s1);

        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
        assert_eq!(s2.get_all().await.unwrap().len(), 1);

        let _ = std::fs::remove_file(&tmp);
    }

    #[tokio::test]
    async fn insert_and_get_all_roundtrip_salary_fields() {
        let storage = Storage::open_in_memory().await.unwrap();
        let enriched = JobPosting {
            salary_text: Some("2000-3000".into()),
            normalized_monthly: Some(2500.0),
            normalized_yearly: Some(30000.0),
            ..posting(1)
        };

        let inserted = storage
            .insert_many(&[enriched.clone(), posting(2)])
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        let all = storage.get_all().await.unwrap();
        assert_eq!(all, vec![enriched, posting(2)]);
        assert!(all[1].salary_text.is_none());
        assert!(all[1].normalized_yearly.is_none());
    }

    #[tokio::test]
    async fn duplicate_insert_is_noop_not_overwrite() {
        let storage = Storage::open_in_memory().await.unwrap();
        storage.insert_many(&[posting(1)]).await.unwrap();

        let changed = JobPosting {
            title: "Renamed".into(),
            ..posting(1)
        };
        let inserted = storage.insert_many(&[changed]).await.unwrap();
        assert_eq!(inserted, 0);

        let all = storage.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Posting 1");
    }

    #[tokio::test]
    async fn delete_by_urls_ignores_unknown_and_empty() {
        let storage = Storage::open_in_memory().await.unwrap();
        storage.insert_many(&[posting(1), posting(2)]).await.unwrap();

        assert_eq!(storage.delete_by_urls(&[]).await.unwrap(), 0);

        let deleted = storage
            .delete_by_urls(&[
                "https://slo-tech.com/delo/1".to_string(),
                "https://slo-tech.com/delo/404".to_string(),
            ])
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        let again = storage
            .delete_by_urls(&["https://slo-tech.com/delo/1".to_string()])
            .await
            .unwrap();
        assert_eq!(again, 0);

        let all = storage.get_all().await.unwrap();
        assert_eq!(all, vec![posting(2)]);
    }

    #[tokio::test]
    async fn newer_batches_listed_first() {
        let storage = Storage::open_in_memory().await.unwrap();
        storage.insert_many(&[posting(1), posting(2)]).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        storage.insert_many(&[posting(3), posting(4)]).await.unwrap();

        let urls: Vec<String> = storage
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.url)
            .collect();
        assert_eq!(
            urls,
            [
                "https://slo-tech.com/delo/3",
                "https://slo-tech.com/delo/4",
                "https://slo-tech.com/delo/1",
                "https://slo-tech.com/delo/2",
            ]
        );
    }
}
