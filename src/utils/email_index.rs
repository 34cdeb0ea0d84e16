use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use moka::future::Cache;
use sqlx::SqlitePool;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use crate::utils::validation::normalize_email;

/// Expected capacity and false-positive rate.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// In-memory pre-check for "is this email already registered".
///
/// The cuckoo filter answers "definitely free" without touching the
/// database; the cache answers "definitely taken" for recently seen emails.
/// Anything else falls through to the database, whose unique index stays the
/// final authority.
pub struct EmailIndex {
    filter: RwLock<CuckooFilter<String>>,
    taken: Cache<String, bool>,
}

impl Default for EmailIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailIndex {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            taken: Cache::builder()
                .max_capacity(500_000)
                .time_to_live(Duration::from_secs(86400)) // 24h TTL
                .build(),
        }
    }

    /// False positives possible, false negatives not.
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize_email(email);
        self.filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&email)
    }

    pub async fn mark_taken(&self, email: &str) {
        let email = normalize_email(email);
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&email);
        self.taken.insert(email, true).await;
    }

    /// Called when an employee moves to a different email.
    pub async fn release(&self, email: &str) {
        let email = normalize_email(email);
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&email);
        self.taken.invalidate(&email).await;
    }

    pub async fn is_available(&self, pool: &SqlitePool, email: &str) -> Result<bool, sqlx::Error> {
        let email = normalize_email(email);

        if !self.might_exist(&email) {
            return Ok(true);
        }

        if self.taken.get(&email).await.unwrap_or(false) {
            return Ok(false);
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE email = ? COLLATE NOCASE)",
        )
        .bind(&email)
        .fetch_one(pool)
        .await?;

        if exists {
            self.taken.insert(email, true).await;
        }

        Ok(!exists)
    }

    /// Streams every registered email into the filter and cache in batches.
    pub async fn warmup(&self, pool: &SqlitePool, batch_size: usize) -> Result<usize> {
        let mut stream = sqlx::query_scalar::<_, String>("SELECT email FROM employees").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let email = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
            batch.push(normalize_email(&email));
            total += 1;

            if batch.len() >= batch_size {
                self.insert_batch(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch).await;
        }

        tracing::info!(total, "Email index warmup complete");
        Ok(total)
    }

    async fn insert_batch(&self, emails: &[String]) {
        {
            let mut filter = self.filter.write().unwrap_or_else(PoisonError::into_inner);
            for email in emails {
                filter.add(email);
            }
        }

        let inserts: Vec<_> = emails
            .iter()
            .map(|e| self.taken.insert(e.clone(), true))
            .collect();
        futures::future::join_all(inserts).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::test_utils::{create_test_employee, setup_test_db};

    #[actix_web::test]
    async fn unknown_email_is_available_without_db_hit() {
        let index = EmailIndex::new();
        assert!(!index.might_exist("new@x.io"));
        let pool = setup_test_db().await;
        assert!(index.is_available(&pool, "new@x.io").await.unwrap());
    }

    #[actix_web::test]
    async fn warmup_marks_existing_emails_taken() {
        let pool = setup_test_db().await;
        create_test_employee(&pool, "Taken@X.io", 100.0, Role::Employee).await;
        let index = EmailIndex::new();

        assert_eq!(index.warmup(&pool, 10).await.unwrap(), 1);
        assert!(index.might_exist("taken@x.io"));
        assert!(!index.is_available(&pool, "TAKEN@x.io").await.unwrap());
    }

    #[actix_web::test]
    async fn release_frees_a_cached_email() {
        let pool = setup_test_db().await;
        let index = EmailIndex::new();
        index.mark_taken("old@x.io").await;
        index.release("old@x.io").await;

        assert!(index.is_available(&pool, "old@x.io").await.unwrap());
    }

    #[actix_web::test]
    async fn stale_filter_entry_falls_back_to_database() {
        let pool = setup_test_db().await;
        let index = EmailIndex::new();
        index.mark_taken("ghost@x.io").await;
        index.taken.invalidate("ghost@x.io").await;

        assert!(index.is_available(&pool, "ghost@x.io").await.unwrap());
    }
}
