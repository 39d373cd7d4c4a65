//! TTL-bounded cache of per-collection document listings.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use indexmap::{IndexMap, IndexSet};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::record::DocumentMeta;

/// How long a listing stays valid.
pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

/// One cached collection listing.
#[derive(Debug, Clone)]
struct CachedListing {
    entries: IndexMap<String, DocumentMeta>,
    cached_at: Instant,
}

impl CachedListing {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Number of collections currently cached.
    pub entries: usize,
    /// Entries dropped because they outlived the TTL.
    pub expirations: u64,
    pub invalidations: u64,
}

/// Per-collection identifier sets keyed by `database/collection`.
///
/// Stale entries are removed lazily by the lookup that finds them.
pub struct DirectoryCache {
    ttl: Duration,
    enabled: bool,
    entries: RwLock<HashMap<String, CachedListing>>,
    stats: RwLock<CacheStats>,
}

fn cache_key(database: &str, collection: &str) -> String {
    format!("{}/{}", database, collection)
}

impl DirectoryCache {
    pub fn new(ttl: Duration) -> Self {
        DirectoryCache {
            ttl,
            enabled: true,
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        DirectoryCache {
            enabled: false,
            ..DirectoryCache::new(DEFAULT_TTL)
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run `read` against the fresh listing of a collection.
    ///
    /// Fresh lookups hold only the read lock and see the listing in place. An
    /// expired listing is evicted under the write lock.
    async fn with_fresh<R>(
        &self,
        database: &str,
        collection: &str,
        read: impl FnOnce(&IndexMap<String, DocumentMeta>) -> R,
    ) -> Option<R> {
        if !self.enabled {
            return None;
        }

        let key = cache_key(database, collection);
        let (result, stale) = {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(listing) if !listing.is_expired(self.ttl) => (Some(read(&listing.entries)), false),
                Some(_) => (None, true),
                None => (None, false),
            }
        };

        if stale {
            self.evict_if_expired(&key).await;
        }

        let mut stats = self.stats.write().await;
        if result.is_some() {
            stats.hits += 1;
            trace!(key = %key, "directory cache hit");
        } else {
            stats.misses += 1;
            trace!(key = %key, "directory cache miss");
        }

        result
    }

    async fn evict_if_expired(&self, key: &str) {
        let mut entries = self.entries.write().await;
        // a listing may have been stored since the read lock was released
        if entries.get(key).is_some_and(|listing| listing.is_expired(self.ttl)) {
            entries.remove(key);
            debug!(key = %key, "directory cache entry expired");
            let mut stats = self.stats.write().await;
            stats.expirations += 1;
            stats.entries = entries.len();
        }
    }

    /// Identifiers cached for a collection, or `None` on a miss.
    pub async fn get(&self, database: &str, collection: &str) -> Option<IndexSet<String>> {
        self.with_fresh(database, collection, |entries| entries.keys().cloned().collect())
            .await
    }

    /// `Some(true)` if the identifier is cached as present, `Some(false)` if the
    /// collection is cached without it, `None` on a miss.
    pub async fn contains(&self, database: &str, collection: &str, identifier: &str) -> Option<bool> {
        self.with_fresh(database, collection, |entries| entries.contains_key(identifier))
            .await
    }

    /// Store the identifier set of a collection with no metadata.
    pub async fn set<I>(&self, database: &str, collection: &str, identifiers: I)
    where
        I: IntoIterator<Item = String>,
    {
        let listing = identifiers
            .into_iter()
            .map(|identifier| DocumentMeta {
                identifier,
                category: None,
                dismissed: false,
            })
            .collect();
        self.set_listing(database, collection, listing).await;
    }

    /// Store a collection listing together with each document's category and
    /// dismissed flag. Overwrites any previous entry.
    pub async fn set_listing(&self, database: &str, collection: &str, listing: Vec<DocumentMeta>) {
        if !self.enabled {
            return;
        }

        let key = cache_key(database, collection);
        let entries: IndexMap<String, DocumentMeta> = listing
            .into_iter()
            .map(|meta| (meta.identifier.clone(), meta))
            .collect();

        debug!(key = %key, documents = entries.len(), "caching collection listing");

        let mut map = self.entries.write().await;
        map.insert(
            key,
            CachedListing {
                entries,
                cached_at: Instant::now(),
            },
        );
        self.stats.write().await.entries = map.len();
    }

    /// Drop cached listings.
    ///
    /// Both arguments: that one collection. Database only: every collection of
    /// that database. Neither: everything.
    pub async fn invalidate(&self, database: Option<&str>, collection: Option<&str>) {
        let mut entries = self.entries.write().await;
        let before = entries.len();

        match (database, collection) {
            (Some(db), Some(coll)) => {
                entries.remove(&cache_key(db, coll));
            }
            (Some(db), None) => {
                let prefix = format!("{}/", db);
                entries.retain(|key, _| !key.starts_with(&prefix));
            }
            (None, _) => entries.clear(),
        }

        let removed = before - entries.len();
        debug!(
            database = database.unwrap_or("*"),
            collection = collection.unwrap_or("*"),
            removed,
            "directory cache invalidated"
        );

        let mut stats = self.stats.write().await;
        stats.invalidations += removed as u64;
        stats.entries = entries.len();
    }

    /// Remove everything.
    pub async fn clear(&self) {
        self.invalidate(None, None).await;
    }

    /// Cached metadata for a collection.
    pub async fn metadata(&self, database: &str, collection: &str) -> Option<Vec<DocumentMeta>> {
        self.with_fresh(database, collection, |entries| entries.values().cloned().collect())
            .await
    }

    /// Identifiers of cached documents that carry a category.
    pub async fn categorized(&self, database: &str, collection: &str) -> Option<HashSet<String>> {
        self.with_fresh(database, collection, |entries| {
            entries
                .values()
                .filter(|meta| meta.category.is_some())
                .map(|meta| meta.identifier.clone())
                .collect()
        })
        .await
    }

    /// Identifiers of cached documents flagged as dismissed.
    pub async fn dismissed(&self, database: &str, collection: &str) -> Option<HashSet<String>> {
        self.with_fresh(database, collection, |entries| {
            entries
                .values()
                .filter(|meta| meta.dismissed)
                .map(|meta| meta.identifier.clone())
                .collect()
        })
        .await
    }

    /// Cached category of one document, if the collection is cached and the
    /// document has one.
    pub async fn category_of(&self, database: &str, collection: &str, identifier: &str) -> Option<String> {
        self.with_fresh(database, collection, |entries| {
            entries.get(identifier).and_then(|meta| meta.category.clone())
        })
        .await
        .flatten()
    }

    pub async fn stats(&self) -> CacheStats {
        let mut stats = self.stats.read().await.clone();
        stats.entries = self.entries.read().await.len();
        stats
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for DirectoryCache {
    fn default() -> Self {
        DirectoryCache::new(DEFAULT_TTL)
    }
}
