use super::{GraphBuilder, SymbolNode};
use crate::error::Result;
use lsifkit_api::{Edge, ItemProperty, Occurrence, OccurrenceRole, Span, SymbolId, Unit, Vertex};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// What one unit contributed to the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub unit: String,
    pub path: PathBuf,
    pub document: u64,
    pub ranges: usize,
    pub definitions: usize,
    pub references: usize,
    pub skipped: usize,
}

struct RangeEntry {
    id: u64,
    symbol: SymbolId,
}

/// Per-document state, alive while one worker builds one document.
pub(super) struct DocumentBuilder<'a> {
    graph: &'a GraphBuilder,
    unit: &'a Unit,
    /// Emitted with the first accepted occurrence.
    document: Option<u64>,
    ranges: HashMap<Span, RangeEntry>,
    range_order: Vec<u64>,
    nodes: HashMap<SymbolId, Arc<SymbolNode>>,
    references: BTreeMap<SymbolId, BTreeSet<u64>>,
    held: Vec<SymbolId>,
    definitions: usize,
    skipped: usize,
}

impl<'a> DocumentBuilder<'a> {
    pub(super) fn new(graph: &'a GraphBuilder, unit: &'a Unit) -> Self {
        Self {
            graph,
            unit,
            document: None,
            ranges: HashMap::new(),
            range_order: Vec::new(),
            nodes: HashMap::new(),
            references: BTreeMap::new(),
            held: Vec::new(),
            definitions: 0,
            skipped: 0,
        }
    }

    pub(super) fn add(&mut self, occurrence: Occurrence) -> Result<()> {
        if occurrence.path != self.unit.path {
            warn!(
                "occurrence of {} at {}:{:?} lies outside document {}; skipping",
                occurrence.symbol.qualified_name,
                occurrence.path.display(),
                occurrence.span,
                self.unit.path.display()
            );
            self.graph.stats.record_skipped_occurrence();
            self.skipped += 1;
            return Ok(());
        }

        let symbol_id = occurrence.symbol.id;
        if let Some(entry) = self.ranges.get(&occurrence.span)
            && entry.symbol != symbol_id
        {
            warn!(
                "span {:?} in {} already belongs to symbol {}; dropping occurrence of {}",
                occurrence.span,
                self.unit.path.display(),
                entry.symbol,
                symbol_id
            );
            self.graph.stats.record_inconsistency();
            self.skipped += 1;
            return Ok(());
        }

        let document = self.document()?;
        let node = match self.nodes.get(&symbol_id) {
            Some(node) => Arc::clone(node),
            None => {
                // holds land in `held` before any error, so drop releases them
                let node = self
                    .graph
                    .symbol_node(&occurrence.symbol, &mut self.held)?;
                self.nodes.insert(symbol_id, Arc::clone(&node));
                node
            }
        };
        let range = self.range_for(&occurrence, &node)?;

        match occurrence.role {
            OccurrenceRole::Definition => {
                if self
                    .graph
                    .record_definition(&node, &occurrence, document, range)?
                {
                    self.definitions += 1;
                }
            }
            OccurrenceRole::Reference => {
                self.references.entry(symbol_id).or_default().insert(range);
            }
        }
        Ok(())
    }

    fn document(&mut self) -> Result<u64> {
        if let Some(id) = self.document {
            return Ok(id);
        }
        let id = self.graph.emit_document(self.unit)?;
        self.document = Some(id);
        Ok(id)
    }

    fn range_for(&mut self, occurrence: &Occurrence, node: &SymbolNode) -> Result<u64> {
        if let Some(entry) = self.ranges.get(&occurrence.span) {
            return Ok(entry.id);
        }
        let emitter = &self.graph.emitter;
        let id = emitter.emit_vertex(&Vertex::range(&occurrence.span))?;
        emitter.emit_edge(&Edge::Next {
            out_v: id,
            in_v: node.result_set,
        })?;
        self.ranges.insert(
            occurrence.span,
            RangeEntry {
                id,
                symbol: occurrence.symbol.id,
            },
        );
        self.range_order.push(id);
        Ok(id)
    }

    /// Emits containment and reference items, then releases cache holds.
    /// `None` when no occurrence made it into the document.
    pub(super) fn close(mut self) -> Result<Option<DocumentSummary>> {
        let Some(document) = self.document else {
            self.release_all();
            debug!(
                "unit {} produced no document for {}",
                self.unit.id,
                self.unit.path.display()
            );
            return Ok(None);
        };
        let emitter = &self.graph.emitter;
        if !self.range_order.is_empty() {
            emitter.emit_edge(&Edge::Contains {
                out_v: document,
                in_vs: self.range_order.clone(),
            })?;
        }

        let mut references = 0;
        for (symbol, ranges) in &self.references {
            let Some(node) = self.nodes.get(symbol) else {
                continue;
            };
            let result = self.graph.reference_result(node)?;
            references += ranges.len();
            emitter.emit_edge(&Edge::Item {
                out_v: result,
                in_vs: ranges.iter().copied().collect(),
                document,
                property: Some(ItemProperty::References),
            })?;
        }

        self.release_all();
        self.graph.stats.record_document();

        let summary = DocumentSummary {
            unit: self.unit.id.clone(),
            path: self.unit.path.clone(),
            document,
            ranges: self.range_order.len(),
            definitions: self.definitions,
            references,
            skipped: self.skipped,
        };
        debug!(
            "built {} with {} ranges, {} references",
            summary.path.display(),
            summary.ranges,
            summary.references
        );
        Ok(Some(summary))
    }
}

impl DocumentBuilder<'_> {
    fn release_all(&mut self) {
        for id in self.held.drain(..) {
            self.graph.cache.release(id);
        }
    }
}

impl Drop for DocumentBuilder<'_> {
    fn drop(&mut self) {
        self.release_all();
    }
}
