use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for filesystem operations.
#[derive(Debug, Default)]
pub struct FsMetrics {
    /// Entry Resolver calls.
    pub resolves: AtomicU64,
    /// Document lookups answered from the directory cache.
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub listings: AtomicU64,
    pub reads: AtomicU64,
    pub writes: AtomicU64,
    pub deletes: AtomicU64,
    pub patches: AtomicU64,
    pub errors: AtomicU64,
}

impl FsMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_resolve(&self) {
        self.resolves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_listing(&self) {
        self.listings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_patch(&self) {
        self.patches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            resolves: self.resolves.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            listings: self.listings.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            patches: self.patches.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.resolves,
            &self.cache_hits,
            &self.cache_misses,
            &self.listings,
            &self.reads,
            &self.writes,
            &self.deletes,
            &self.patches,
            &self.errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Serializable snapshot of [`FsMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub resolves: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub listings: u64,
    pub reads: u64,
    pub writes: u64,
    pub deletes: u64,
    pub patches: u64,
    pub errors: u64,
}

impl MetricsSnapshot {
    /// Cache hit rate as a percentage of document lookups.
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            (self.cache_hits as f64 / total as f64) * 100.0
        }
    }
}
