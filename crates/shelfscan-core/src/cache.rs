//! Freshness cache contract and the two in-process implementations.
//!
//! Entries are keyed by a [`Fingerprint`] of the result-affecting query
//! parameters and hold the full deduplicated result set of a search, so one
//! entry can serve any `max_results`. An entry is fresh while
//! `now - fetched_at <= expiry`; stale entries read as a miss and are removed
//! by `purge_expired`, never during a read.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::products::ProductSummary;
use crate::query::ResolvedQuery;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache storage error: {0}")]
    Storage(String),

    #[error("cached results could not be (de)serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Deterministic cache key for a resolved query.
///
/// Covers text, `max_price`, category and the cheapest flag. `max_results`
/// is deliberately absent because truncation happens after retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    #[must_use]
    pub fn of(query: &ResolvedQuery) -> Self {
        let mut params: BTreeMap<&str, String> = BTreeMap::new();
        params.insert("text", query.text.to_lowercase());
        params.insert("cheapest", query.cheapest.to_string());
        if let Some(max_price) = query.max_price {
            params.insert("max_price", max_price.normalize().to_string());
        }
        if let Some(category) = &query.category {
            params.insert("category", category.clone());
        }
        Self::from_params(&params)
    }

    /// Hashes an already-canonical parameter map. Key order never matters
    /// because `BTreeMap` iterates sorted.
    #[must_use]
    pub fn from_params(params: &BTreeMap<&str, String>) -> Self {
        let canonical = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n");
        Self(format!("{:x}", Sha256::digest(canonical.as_bytes())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cached result set and the time it was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub results: Vec<ProductSummary>,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>, expiry: Duration) -> bool {
        now - self.fetched_at <= expiry
    }
}

/// Keyed store of previously computed result sets.
///
/// Implementations must allow concurrent readers and must replace an entry
/// atomically on `store`, so a reader sees either the old or the new set.
#[async_trait]
pub trait SearchCache: Send + Sync {
    /// `false` for pass-through configurations; the search engine then skips
    /// both lookup and store.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Returns the entry for `fingerprint` if it exists and is still fresh.
    async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError>;

    /// Replaces whatever is stored under `fingerprint`.
    async fn store(
        &self,
        fingerprint: &Fingerprint,
        results: &[ProductSummary],
    ) -> Result<(), CacheError>;

    /// Removes every stale entry and returns how many were removed.
    async fn purge_expired(&self) -> Result<usize, CacheError>;
}

/// Process-local cache. Writes purge stale entries opportunistically.
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<Fingerprint, Arc<CacheEntry>>>,
    expiry: Duration,
}

impl MemoryCache {
    #[must_use]
    pub fn new(expiry: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            expiry,
        }
    }

    /// Inserts a pre-built entry, keeping its `fetched_at`.
    pub fn insert_entry(&self, fingerprint: Fingerprint, entry: CacheEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(fingerprint, Arc::new(entry));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_locked(
        entries: &mut HashMap<Fingerprint, Arc<CacheEntry>>,
        now: DateTime<Utc>,
        expiry: Duration,
    ) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh_at(now, expiry));
        before - entries.len()
    }
}

#[async_trait]
impl SearchCache for MemoryCache {
    async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError> {
        let entry = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(fingerprint)
            .cloned();

        Ok(entry
            .filter(|e| e.is_fresh_at(Utc::now(), self.expiry))
            .map(|e| CacheEntry::clone(&e)))
    }

    async fn store(
        &self,
        fingerprint: &Fingerprint,
        results: &[ProductSummary],
    ) -> Result<(), CacheError> {
        let now = Utc::now();
        let entry = Arc::new(CacheEntry {
            results: results.to_vec(),
            fetched_at: now,
        });
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Self::purge_locked(&mut entries, now, self.expiry);
        entries.insert(fingerprint.clone(), entry);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Self::purge_locked(&mut entries, Utc::now(), self.expiry))
    }
}

/// Pass-through configuration: every lookup misses and nothing is stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCache;

#[async_trait]
impl SearchCache for DisabledCache {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn lookup(&self, _fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError> {
        Ok(None)
    }

    async fn store(
        &self,
        _fingerprint: &Fingerprint,
        _results: &[ProductSummary],
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        Ok(0)
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
