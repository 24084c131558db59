use lsifkit_ingest::RuntimeMetrics;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Run-wide counters. Every method is callable concurrently from workers.
#[derive(Debug, Default)]
pub struct IndexStats {
    vertices: AtomicU64,
    edges: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    cache_evictions: AtomicU64,
    units: AtomicU64,
    documents: AtomicU64,
    skipped_occurrences: AtomicU64,
    inconsistencies: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub vertices: u64,
    pub edges: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_evictions: u64,
    pub units: u64,
    pub documents: u64,
    pub skipped_occurrences: u64,
    pub inconsistencies: u64,
}

impl StatsSnapshot {
    pub fn records(&self) -> u64 {
        self.vertices + self.edges
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / lookups as f64
    }
}

impl IndexStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_vertex(&self) {
        self.vertices.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_edge(&self) {
        self.edges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_eviction(&self) {
        self.cache_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_document(&self) {
        self.documents.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_occurrence(&self) {
        self.skipped_occurrences.fetch_add(1, Ordering::Relaxed);
    }

    /// Duplicate definitions, conflicting ranges and moniker collisions.
    pub fn record_inconsistency(&self) {
        self.inconsistencies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            vertices: self.vertices.load(Ordering::Relaxed),
            edges: self.edges.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_evictions: self.cache_evictions.load(Ordering::Relaxed),
            units: self.units.load(Ordering::Relaxed),
            documents: self.documents.load(Ordering::Relaxed),
            skipped_occurrences: self.skipped_occurrences.load(Ordering::Relaxed),
            inconsistencies: self.inconsistencies.load(Ordering::Relaxed),
        }
    }
}

impl RuntimeMetrics for IndexStats {
    fn observe_queue_depth(&self, stage: &'static str, depth: usize) {
        trace!(stage, depth, "queue depth");
    }

    fn observe_throughput(&self, stage: &'static str, count: usize) {
        if stage == "execute" {
            self.units.fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    fn observe_latency_ms(&self, stage: &'static str, millis: u64) {
        trace!(stage, millis, "stage latency");
    }
}
