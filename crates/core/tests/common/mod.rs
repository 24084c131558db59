#![allow(dead_code)]

use lsifkit_api::{
    DependencyGraph, FactsProvider, FactsResult, Occurrence, OccurrenceRole, PackageIdentity,
    Span, Symbol, SymbolId, SymbolKind, Unit,
};
use lsifkit_core::{IndexReport, Indexer, IndexerConfig, RecordSink};
use serde_json::Value;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const MODULE: &str = "example.com/app";

/// In-memory facts provider that counts `declared_type` calls per symbol.
#[derive(Default)]
pub struct MemoryFacts {
    pub units: Vec<Unit>,
    pub occurrences: HashMap<String, Vec<Occurrence>>,
    pub types: HashMap<SymbolId, String>,
    pub dependencies: DependencyGraph,
    pub type_calls: Mutex<HashMap<SymbolId, usize>>,
    pub occurrence_calls: AtomicUsize,
}

impl MemoryFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(&mut self, id: &str, path: &str, occurrences: Vec<Occurrence>) -> &mut Self {
        self.units.push(Unit {
            id: id.to_string(),
            path: PathBuf::from(path),
            package: MODULE.to_string(),
        });
        self.occurrences.insert(id.to_string(), occurrences);
        self
    }

    pub fn typed(&mut self, symbol: &Symbol, ty: &str) -> &mut Self {
        self.types.insert(symbol.id, ty.to_string());
        self
    }

    pub fn dependency(&mut self, module: &str, version: &str) -> &mut Self {
        self.dependencies
            .insert(module, PackageIdentity::new(module, version));
        self
    }

    pub fn type_calls(&self, id: SymbolId) -> usize {
        self.type_calls
            .lock()
            .unwrap()
            .get(&id)
            .copied()
            .unwrap_or(0)
    }
}

impl FactsProvider for MemoryFacts {
    fn list_units(&self) -> FactsResult<Vec<Unit>> {
        Ok(self.units.clone())
    }

    fn occurrences_of(&self, unit: &Unit) -> FactsResult<Vec<Occurrence>> {
        self.occurrence_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.occurrences.get(&unit.id).cloned().unwrap_or_default())
    }

    fn declared_type(&self, symbol: &Symbol) -> Option<String> {
        *self.type_calls.lock().unwrap().entry(symbol.id).or_default() += 1;
        self.types.get(&symbol.id).cloned()
    }

    fn dependency_graph(&self) -> FactsResult<DependencyGraph> {
        Ok(self.dependencies.clone())
    }
}

pub fn symbol(id: u64, qualified: &str, kind: SymbolKind, package: &str) -> Arc<Symbol> {
    let name = qualified.rsplit('.').next().unwrap_or(qualified);
    Arc::new(Symbol {
        id: SymbolId(id),
        name: name.to_string(),
        qualified_name: qualified.to_string(),
        kind,
        package: package.to_string(),
        exported: name.chars().next().is_some_and(char::is_uppercase),
        documentation: None,
    })
}

pub fn def(symbol: &Arc<Symbol>, path: &str, line: u32, col: u32) -> Occurrence {
    occurrence(symbol, path, line, col, OccurrenceRole::Definition)
}

pub fn reference(symbol: &Arc<Symbol>, path: &str, line: u32, col: u32) -> Occurrence {
    occurrence(symbol, path, line, col, OccurrenceRole::Reference)
}

fn occurrence(
    symbol: &Arc<Symbol>,
    path: &str,
    line: u32,
    col: u32,
    role: OccurrenceRole,
) -> Occurrence {
    let width = symbol.name.len() as u32;
    Occurrence {
        symbol: Arc::clone(symbol),
        path: PathBuf::from(path),
        span: Span::new(line, col, line, col + width),
        role,
    }
}

/// Keeps every record as parsed JSON.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub records: Arc<Mutex<Vec<Value>>>,
}

impl RecordSink for RecordingSink {
    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        let value: Value = serde_json::from_slice(record).map_err(io::Error::other)?;
        self.records.lock().unwrap().push(value);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn config(workers: usize) -> IndexerConfig {
    IndexerConfig {
        module_name: MODULE.to_string(),
        module_version: "v1.4.0".to_string(),
        workers,
        ..IndexerConfig::new("/repo")
    }
}

pub async fn run(facts: MemoryFacts, config: IndexerConfig) -> (IndexReport, Graph) {
    let sink = RecordingSink::default();
    let records = sink.records.clone();
    let indexer = Indexer::new(config, Arc::new(facts), Box::new(sink));
    let report = indexer.index().await.expect("index should succeed");
    let records = records.lock().unwrap().clone();
    (report, Graph::new(records))
}

/// Read-side view over emitted records.
pub struct Graph {
    pub records: Vec<Value>,
}

impl Graph {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }

    pub fn vertices(&self, label: &str) -> Vec<&Value> {
        self.with("vertex", label)
    }

    pub fn edges(&self, label: &str) -> Vec<&Value> {
        self.with("edge", label)
    }

    fn with(&self, kind: &str, label: &str) -> Vec<&Value> {
        self.records
            .iter()
            .filter(|r| r["type"] == kind && r["label"] == label)
            .collect()
    }

    pub fn record(&self, id: u64) -> &Value {
        self.records
            .iter()
            .find(|r| r["id"] == id)
            .unwrap_or_else(|| panic!("no record {id}"))
    }

    /// Targets of the `label` edges leaving `from`.
    pub fn out(&self, from: u64, label: &str) -> Vec<u64> {
        self.edges(label)
            .into_iter()
            .filter(|e| e["outV"] == from)
            .flat_map(targets)
            .collect()
    }

    pub fn document_id(&self, uri_suffix: &str) -> u64 {
        self.vertices("document")
            .into_iter()
            .find(|d| d["uri"].as_str().is_some_and(|u| u.ends_with(uri_suffix)))
            .and_then(|d| d["id"].as_u64())
            .unwrap_or_else(|| panic!("no document {uri_suffix}"))
    }
}

pub fn id(record: &Value) -> u64 {
    record["id"].as_u64().expect("record id")
}

/// `inV` or every entry of `inVs`.
pub fn targets(edge: &Value) -> Vec<u64> {
    if let Some(target) = edge["inV"].as_u64() {
        return vec![target];
    }
    edge["inVs"]
        .as_array()
        .map(|ids| ids.iter().filter_map(Value::as_u64).collect())
        .unwrap_or_default()
}
