use crate::error::FactsResult;
use crate::models::{DependencyGraph, Occurrence, Symbol, Unit};

/// Source of semantic facts for one analysis target.
///
/// Every method may be expensive (re-derived from on-disk analysis). The
/// indexer calls `occurrences_of` once per unit and `declared_type` at most
/// once per symbol while that symbol's cache entry is alive.
pub trait FactsProvider: Send + Sync {
    fn list_units(&self) -> FactsResult<Vec<Unit>>;

    fn occurrences_of(&self, unit: &Unit) -> FactsResult<Vec<Occurrence>>;

    /// Declared type as the front-end stringifies it, e.g. `func(x int) error`
    /// or `struct{X int; Y string}`. `None` for synthetic entities.
    fn declared_type(&self, symbol: &Symbol) -> Option<String>;

    fn dependency_graph(&self) -> FactsResult<DependencyGraph>;
}
