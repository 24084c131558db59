//! Per-symbol package data, computed at most once while retained.
//!
//! Entries are keyed by [`SymbolId`] and reference counted by the documents
//! that are still being built. Concurrent first lookups of one symbol share a
//! single computation; with eviction enabled, an entry is dropped once the
//! last document releases it.

use crate::moniker::MonikerResolver;
use crate::stats::IndexStats;
use crate::typestring::{self, TypeDisplay};
use dashmap::DashMap;
use lsifkit_api::{DependencyGraph, FactsProvider, Moniker, Symbol, SymbolId};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Everything the graph needs to know about one symbol beyond its occurrences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageData {
    /// Type as reported by the facts provider; empty when it had none.
    pub declared_type: String,
    pub display: TypeDisplay,
    pub moniker: Option<Moniker>,
    pub exported: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub live_entries: usize,
    pub computations: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct Slot {
    refs: AtomicUsize,
    data: OnceLock<Arc<PackageData>>,
}

pub struct PackageDataCache {
    provider: Arc<dyn FactsProvider>,
    resolver: MonikerResolver,
    dependencies: Arc<DependencyGraph>,
    stats: Arc<IndexStats>,
    evict_released: bool,
    entries: DashMap<SymbolId, Arc<Slot>>,
    computations: AtomicU64,
}

impl PackageDataCache {
    pub fn new(
        provider: Arc<dyn FactsProvider>,
        resolver: MonikerResolver,
        dependencies: Arc<DependencyGraph>,
        stats: Arc<IndexStats>,
        evict_released: bool,
    ) -> Self {
        Self {
            provider,
            resolver,
            dependencies,
            stats,
            evict_released,
            entries: DashMap::new(),
            computations: AtomicU64::new(0),
        }
    }

    /// Returns the entry for `symbol`, computing it on first use.
    pub fn get(&self, symbol: &Symbol) -> Arc<PackageData> {
        let slot = Arc::clone(&*self.entries.entry(symbol.id).or_default());
        self.resolve(&slot, symbol)
    }

    /// [`get`](Self::get) plus one hold by an in-flight document.
    pub fn acquire(&self, symbol: &Symbol) -> Arc<PackageData> {
        // held before lookup so a concurrent release cannot evict the slot
        self.entries
            .entry(symbol.id)
            .or_default()
            .refs
            .fetch_add(1, Ordering::AcqRel);
        self.get(symbol)
    }

    /// Takes one hold on `id` without computing anything.
    ///
    /// For symbols whose data the caller already consumed. The lookup counts
    /// as a hit whether or not the entry is still live; returns `false` and
    /// takes no hold when it was already evicted.
    pub fn retain(&self, id: SymbolId) -> bool {
        self.stats.record_cache_hit();
        match self.entries.get(&id) {
            Some(slot) => {
                slot.refs.fetch_add(1, Ordering::AcqRel);
                true
            }
            None => false,
        }
    }

    /// Drops one document's hold on `id`. Releasing an entry that is not
    /// held is a no-op.
    pub fn release(&self, id: SymbolId) {
        let evict_released = self.evict_released;
        let removed = self.entries.remove_if(&id, |_, slot| {
            let remaining = slot
                .refs
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                .map(|previous| previous - 1)
                .unwrap_or(0);
            evict_released && remaining == 0
        });
        if removed.is_some() {
            self.stats.record_cache_eviction();
        }
    }

    /// Current hold count for `id`; zero when it has no entry.
    pub fn ref_count(&self, id: SymbolId) -> usize {
        self.entries
            .get(&id)
            .map(|slot| slot.refs.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    pub fn stats(&self) -> CacheStats {
        let counters = self.stats.snapshot();
        CacheStats {
            live_entries: self.entries.len(),
            computations: self.computations.load(Ordering::Relaxed),
            hits: counters.cache_hits,
            misses: counters.cache_misses,
            evictions: counters.cache_evictions,
        }
    }

    fn resolve(&self, slot: &Slot, symbol: &Symbol) -> Arc<PackageData> {
        let mut computed = false;
        let data = slot.data.get_or_init(|| {
            computed = true;
            Arc::new(self.compute(symbol))
        });
        if computed {
            self.stats.record_cache_miss();
        } else {
            self.stats.record_cache_hit();
        }
        Arc::clone(data)
    }

    fn compute(&self, symbol: &Symbol) -> PackageData {
        self.computations.fetch_add(1, Ordering::Relaxed);
        let declared = self
            .provider
            .declared_type(symbol)
            .filter(|ty| !ty.trim().is_empty());
        if declared.is_none() {
            debug!("no type for {} {} ({})", symbol.kind, symbol.qualified_name, symbol.id);
        }
        let display = typestring::describe(symbol, declared.as_deref());
        let moniker = self.resolver.resolve(symbol, &self.dependencies);

        PackageData {
            declared_type: declared.unwrap_or_default(),
            display,
            moniker,
            exported: symbol.exported,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsifkit_api::{FactsResult, Occurrence, PackageIdentity, SymbolKind, Unit};
    use std::collections::HashMap;
    use std::sync::Barrier;

    #[derive(Default)]
    struct CountingProvider {
        types: HashMap<SymbolId, String>,
        calls: AtomicUsize,
    }

    impl FactsProvider for CountingProvider {
        fn list_units(&self) -> FactsResult<Vec<Unit>> {
            Ok(Vec::new())
        }

        fn occurrences_of(&self, _unit: &Unit) -> FactsResult<Vec<Occurrence>> {
            Ok(Vec::new())
        }

        fn declared_type(&self, symbol: &Symbol) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(2));
            self.types.get(&symbol.id).cloned()
        }

        fn dependency_graph(&self) -> FactsResult<DependencyGraph> {
            Ok(DependencyGraph::new())
        }
    }

    fn symbol(id: u64, name: &str) -> Symbol {
        Symbol {
            id: SymbolId(id),
            name: name.to_string(),
            qualified_name: name.to_string(),
            kind: SymbolKind::Type,
            package: "example.com/app".to_string(),
            exported: true,
            documentation: None,
        }
    }

    fn cache(provider: Arc<CountingProvider>, evict: bool) -> (PackageDataCache, Arc<IndexStats>) {
        let stats = Arc::new(IndexStats::new());
        let resolver = MonikerResolver::new(
            "gomod",
            PackageIdentity::new("example.com/app", "v1.0.0"),
            Vec::new(),
        );
        let cache = PackageDataCache::new(
            provider,
            resolver,
            Arc::new(DependencyGraph::new()),
            stats.clone(),
            evict,
        );
        (cache, stats)
    }

    #[test]
    fn concurrent_first_lookups_compute_once() {
        let mut provider = CountingProvider::default();
        provider
            .types
            .insert(SymbolId(1), "struct{X int}".to_string());
        let provider = Arc::new(provider);
        let (cache, stats) = cache(provider.clone(), true);
        let sym = symbol(1, "Point");
        let barrier = Barrier::new(8);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    barrier.wait();
                    let data = cache.acquire(&sym);
                    assert_eq!(data.display.signature, "type Point struct");
                    assert_eq!(cache.get(&sym), data);
                });
            }
        });

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.ref_count(sym.id), 8);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.cache_hits, 15);
    }

    #[test]
    fn missing_type_yields_empty_declared_type() {
        let provider = Arc::new(CountingProvider::default());
        let (cache, _) = cache(provider, true);
        let data = cache.acquire(&symbol(2, "Opaque"));
        assert!(data.declared_type.is_empty());
        assert_eq!(data.display.signature, "type Opaque");
    }

    #[test]
    fn release_evicts_at_zero_when_enabled() {
        let provider = Arc::new(CountingProvider::default());
        let (cache, stats) = cache(provider.clone(), true);
        let sym = symbol(3, "Shared");

        cache.acquire(&sym);
        cache.acquire(&sym);
        assert_eq!(cache.ref_count(sym.id), 2);

        cache.release(sym.id);
        assert_eq!(cache.stats().live_entries, 1);
        cache.release(sym.id);
        assert_eq!(cache.stats().live_entries, 0);
        assert_eq!(stats.snapshot().cache_evictions, 1);

        // evicted entries are recomputed on the next acquire
        cache.acquire(&sym);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        cache.release(sym.id);

        // unheld release is ignored
        cache.release(sym.id);
        assert_eq!(cache.ref_count(sym.id), 0);
    }

    #[test]
    fn retain_holds_live_entries_without_computing() {
        let provider = Arc::new(CountingProvider::default());
        let (cache, stats) = cache(provider.clone(), true);
        let sym = symbol(5, "Reused");

        assert!(!cache.retain(sym.id));
        assert_eq!(cache.stats().live_entries, 0);

        cache.acquire(&sym);
        assert!(cache.retain(sym.id));
        assert_eq!(cache.ref_count(sym.id), 2);
        cache.release(sym.id);
        cache.release(sym.id);

        // evicted: no hold and still no recompute
        assert!(!cache.retain(sym.id));
        assert_eq!(cache.ref_count(sym.id), 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.cache_hits, 3);
        assert_eq!(snapshot.cache_evictions, 1);
    }

    #[test]
    fn released_entries_stay_without_eviction() {
        let provider = Arc::new(CountingProvider::default());
        let (cache, _) = cache(provider.clone(), false);
        let sym = symbol(4, "Kept");

        cache.acquire(&sym);
        cache.release(sym.id);
        cache.acquire(&sym);

        assert_eq!(cache.stats().live_entries, 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
