//! SQLite-backed [`SearchCache`]: one row per fingerprint, results stored as
//! a JSON array, `fetched_at` as Unix epoch milliseconds.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use shelfscan_core::{CacheEntry, CacheError, Fingerprint, ProductSummary, SearchCache};
use sqlx::SqlitePool;

use crate::{connect_pool, run_migrations, DbError, PoolConfig};

/// A row from the `search_cache` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct CacheRow {
    results: String,
    fetched_at: i64,
}

impl CacheRow {
    fn into_entry(self) -> Result<CacheEntry, DbError> {
        let fetched_at = DateTime::<Utc>::from_timestamp_millis(self.fetched_at).ok_or_else(|| {
            DbError::InvalidRow(format!("fetched_at {} out of range", self.fetched_at))
        })?;
        let results = serde_json::from_str::<Vec<ProductSummary>>(&self.results)
            .map_err(|e| DbError::InvalidRow(e.to_string()))?;
        Ok(CacheEntry {
            results,
            fetched_at,
        })
    }
}

impl From<DbError> for CacheError {
    fn from(err: DbError) -> Self {
        CacheError::Storage(err.to_string())
    }
}

fn storage(err: sqlx::Error) -> CacheError {
    CacheError::Storage(err.to_string())
}

pub struct SqliteSearchCache {
    pool: SqlitePool,
    expiry: Duration,
}

impl SqliteSearchCache {
    #[must_use]
    pub fn new(pool: SqlitePool, expiry: Duration) -> Self {
        Self { pool, expiry }
    }

    /// Opens the database at `database_url` and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or a migration fails.
    pub async fn connect(database_url: &str, expiry: Duration) -> Result<Self, DbError> {
        let pool = connect_pool(database_url, PoolConfig::for_url(database_url)).await?;
        let applied = run_migrations(&pool).await?;
        if applied > 0 {
            tracing::info!(applied, "applied cache migrations");
        }
        Ok(Self::new(pool, expiry))
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Writes an entry as-is, keeping its `fetched_at`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on serialization or storage failure.
    pub async fn insert_entry(
        &self,
        fingerprint: &Fingerprint,
        entry: &CacheEntry,
    ) -> Result<(), CacheError> {
        let results = serde_json::to_string(&entry.results)?;
        sqlx::query(
            "INSERT INTO search_cache (fingerprint, results, fetched_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT (fingerprint) DO UPDATE SET \
               results = excluded.results, \
               fetched_at = excluded.fetched_at",
        )
        .bind(fingerprint.as_str())
        .bind(results)
        .bind(entry.fetched_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    /// Entries fetched before this instant are stale.
    fn cutoff_millis(&self, now: DateTime<Utc>) -> i64 {
        (now - self.expiry).timestamp_millis()
    }

    async fn delete_stale(&self, now: DateTime<Utc>) -> Result<u64, CacheError> {
        let result = sqlx::query("DELETE FROM search_cache WHERE fetched_at < ?1")
            .bind(self.cutoff_millis(now))
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SearchCache for SqliteSearchCache {
    async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError> {
        let row = sqlx::query_as::<_, CacheRow>(
            "SELECT results, fetched_at FROM search_cache \
             WHERE fingerprint = ?1 AND fetched_at >= ?2",
        )
        .bind(fingerprint.as_str())
        .bind(self.cutoff_millis(Utc::now()))
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        match row {
            Some(row) => Ok(Some(row.into_entry()?)),
            None => Ok(None),
        }
    }

    async fn store(
        &self,
        fingerprint: &Fingerprint,
        results: &[ProductSummary],
    ) -> Result<(), CacheError> {
        let now = Utc::now();
        let purged = self.delete_stale(now).await?;
        if purged > 0 {
            tracing::debug!(purged, "removed stale cache rows");
        }
        self.insert_entry(
            fingerprint,
            &CacheEntry {
                results: results.to_vec(),
                fetched_at: now,
            },
        )
        .await
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let purged = self.delete_stale(Utc::now()).await?;
        Ok(usize::try_from(purged).unwrap_or(usize::MAX))
    }
}
