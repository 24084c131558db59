//! Turns per-unit occurrences into LSIF vertices and edges.
//!
//! State shared by all workers lives here: one result set per symbol, the
//! first definition seen for each symbol, reference results, moniker and
//! package information dedup, and the document paths already claimed.
//! Per-document state lives in `document.rs`.

mod document;

pub use document::DocumentSummary;

use crate::cache::{PackageData, PackageDataCache};
use crate::config::IndexerConfig;
use crate::error::{IndexError, Result};
use crate::stats::IndexStats;
use crate::typestring;
use crate::writer::GraphEmitter;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use lsifkit_api::{
    Edge, Moniker, Occurrence, PackageIdentity, Span, Symbol, SymbolId, Unit, Vertex,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct BuilderOptions {
    pub project_root: PathBuf,
    pub language_id: String,
    /// Package manager named on packageInformation vertices.
    pub package_manager: String,
}

impl From<&IndexerConfig> for BuilderOptions {
    fn from(config: &IndexerConfig) -> Self {
        Self {
            project_root: config.project_root.clone(),
            language_id: config.language_id.clone(),
            package_manager: config.moniker_scheme.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DefinitionSite {
    range: u64,
    path: PathBuf,
    span: Span,
}

/// Graph ids owned by one symbol.
struct SymbolNode {
    result_set: u64,
    definition: Mutex<Option<DefinitionSite>>,
    reference_result: Mutex<Option<u64>>,
}

type Lazy<T> = Arc<Mutex<Option<T>>>;

pub struct GraphBuilder {
    options: BuilderOptions,
    cache: Arc<PackageDataCache>,
    emitter: Arc<GraphEmitter>,
    stats: Arc<IndexStats>,
    symbols: DashMap<SymbolId, Lazy<Arc<SymbolNode>>>,
    monikers: DashMap<(String, String), SymbolId>,
    packages: DashMap<PackageIdentity, Lazy<u64>>,
    /// Claimed document paths and the unit that claimed each.
    documents: DashMap<PathBuf, String>,
}

impl GraphBuilder {
    pub fn new(
        options: BuilderOptions,
        cache: Arc<PackageDataCache>,
        emitter: Arc<GraphEmitter>,
        stats: Arc<IndexStats>,
    ) -> Self {
        Self {
            options,
            cache,
            emitter,
            stats,
            symbols: DashMap::new(),
            monikers: DashMap::new(),
            packages: DashMap::new(),
            documents: DashMap::new(),
        }
    }

    /// Builds the document for `unit` from its occurrences.
    ///
    /// Returns `None` when another unit already claimed the same path, which
    /// is skipped with a warning, or when no occurrence was accepted. The
    /// document vertex is emitted with the first accepted occurrence.
    pub fn visit(
        &self,
        unit: &Unit,
        occurrences: Vec<Occurrence>,
    ) -> Result<Option<DocumentSummary>> {
        if !self.claim_document(unit) {
            return Ok(None);
        }
        let mut builder = document::DocumentBuilder::new(self, unit);
        for occurrence in sort_occurrences(occurrences) {
            builder.add(occurrence)?;
        }
        builder.close()
    }

    fn claim_document(&self, unit: &Unit) -> bool {
        match self.documents.entry(unit.path.clone()) {
            Entry::Occupied(existing) => {
                warn!(
                    "document {} already claimed by unit {}; skipping unit {}",
                    unit.path.display(),
                    existing.get(),
                    unit.id
                );
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(unit.id.clone());
                true
            }
        }
    }

    fn emit_document(&self, unit: &Unit) -> Result<u64> {
        let uri = self.document_uri(&unit.path)?;
        self.emitter.emit_vertex(&Vertex::Document {
            uri,
            language_id: self.options.language_id.clone(),
        })
    }

    fn document_uri(&self, path: &Path) -> Result<String> {
        let absolute = self.options.project_root.join(path);
        Url::from_file_path(&absolute)
            .map(String::from)
            .map_err(|_| IndexError::InvalidPath(absolute.display().to_string()))
    }

    /// Result set for `symbol`, created with its hover and moniker on first use.
    ///
    /// Package data is computed only while the node does not exist yet. Any
    /// cache hold taken for the calling document is pushed onto `held`.
    fn symbol_node(
        &self,
        symbol: &Symbol,
        held: &mut Vec<SymbolId>,
    ) -> Result<Arc<SymbolNode>> {
        let slot = Arc::clone(&*self.symbols.entry(symbol.id).or_default());
        let mut guard = slot.lock().map_err(|_| IndexError::poisoned("symbol"))?;
        if let Some(node) = guard.as_ref() {
            if self.cache.retain(symbol.id) {
                held.push(symbol.id);
            }
            return Ok(Arc::clone(node));
        }

        let data = self.cache.acquire(symbol);
        held.push(symbol.id);
        let result_set = self.emitter.emit_vertex(&Vertex::ResultSet)?;
        self.attach_hover(symbol, &data, result_set)?;
        if let Some(moniker) = &data.moniker {
            self.attach_moniker(symbol, moniker, result_set)?;
        }

        let node = Arc::new(SymbolNode {
            result_set,
            definition: Mutex::new(None),
            reference_result: Mutex::new(None),
        });
        *guard = Some(Arc::clone(&node));
        Ok(node)
    }

    fn attach_hover(&self, symbol: &Symbol, data: &PackageData, result_set: u64) -> Result<()> {
        let contents = typestring::hover_contents(
            &self.options.language_id,
            &data.display,
            symbol.documentation.as_deref(),
        );
        let hover = self
            .emitter
            .emit_vertex(&Vertex::HoverResult { result: contents })?;
        self.emitter.emit_edge(&Edge::Hover {
            out_v: result_set,
            in_v: hover,
        })?;
        Ok(())
    }

    fn attach_moniker(&self, symbol: &Symbol, moniker: &Moniker, result_set: u64) -> Result<()> {
        match self.monikers.entry(moniker.key()) {
            Entry::Occupied(owner) => {
                warn!(
                    "moniker {}:{} already names symbol {}; not attaching it to {}",
                    moniker.scheme,
                    moniker.identifier,
                    owner.get(),
                    symbol.id
                );
                self.stats.record_inconsistency();
                return Ok(());
            }
            Entry::Vacant(slot) => {
                slot.insert(symbol.id);
            }
        }

        let moniker_id = self.emitter.emit_vertex(&Vertex::Moniker {
            kind: moniker.kind,
            scheme: moniker.scheme.clone(),
            identifier: moniker.identifier.clone(),
        })?;
        self.emitter.emit_edge(&Edge::Moniker {
            out_v: result_set,
            in_v: moniker_id,
        })?;

        if let Some(package) = &moniker.package {
            let package_id = self.package_information(package)?;
            self.emitter.emit_edge(&Edge::PackageInformation {
                out_v: moniker_id,
                in_v: package_id,
            })?;
        }
        Ok(())
    }

    fn package_information(&self, package: &PackageIdentity) -> Result<u64> {
        let slot = Arc::clone(&*self.packages.entry(package.clone()).or_default());
        let mut guard = slot.lock().map_err(|_| IndexError::poisoned("package"))?;
        if let Some(id) = *guard {
            return Ok(id);
        }
        let id = self.emitter.emit_vertex(&Vertex::package_information(
            package,
            &self.options.package_manager,
        ))?;
        *guard = Some(id);
        Ok(id)
    }

    /// Links the first definition of a symbol and returns whether this call
    /// linked it. Later, different definitions are reported and ignored.
    fn record_definition(
        &self,
        node: &SymbolNode,
        occurrence: &Occurrence,
        document: u64,
        range: u64,
    ) -> Result<bool> {
        let mut definition = node
            .definition
            .lock()
            .map_err(|_| IndexError::poisoned("definition"))?;
        if let Some(existing) = definition.as_ref() {
            if existing.range != range {
                warn!(
                    "symbol {} ({}) defined again at {}:{:?}; keeping {}:{:?}",
                    occurrence.symbol.qualified_name,
                    occurrence.symbol.id,
                    occurrence.path.display(),
                    occurrence.span,
                    existing.path.display(),
                    existing.span
                );
                self.stats.record_inconsistency();
            }
            return Ok(false);
        }

        let result = self.emitter.emit_vertex(&Vertex::DefinitionResult)?;
        self.emitter.emit_edge(&Edge::Definition {
            out_v: node.result_set,
            in_v: result,
        })?;
        self.emitter.emit_edge(&Edge::Item {
            out_v: result,
            in_vs: vec![range],
            document,
            property: None,
        })?;
        *definition = Some(DefinitionSite {
            range,
            path: occurrence.path.clone(),
            span: occurrence.span,
        });
        debug!(
            "defined {} at {}:{:?}",
            occurrence.symbol.qualified_name,
            occurrence.path.display(),
            occurrence.span
        );
        Ok(true)
    }

    /// The symbol's reference result, created on first use.
    fn reference_result(&self, node: &SymbolNode) -> Result<u64> {
        let mut guard = node
            .reference_result
            .lock()
            .map_err(|_| IndexError::poisoned("reference result"))?;
        if let Some(id) = *guard {
            return Ok(id);
        }
        let id = self.emitter.emit_vertex(&Vertex::ReferenceResult)?;
        self.emitter.emit_edge(&Edge::References {
            out_v: node.result_set,
            in_v: id,
        })?;
        *guard = Some(id);
        Ok(id)
    }
}

/// Orders occurrences by span, definitions before references at one span.
fn sort_occurrences(mut occurrences: Vec<Occurrence>) -> Vec<Occurrence> {
    occurrences.sort_by(|a, b| {
        (a.span, a.role, a.symbol.id).cmp(&(b.span, b.role, b.symbol.id))
    });
    occurrences
}
