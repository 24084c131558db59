//! A [`FactsProvider`] backed by a JSON dump produced by a language front-end.

use lsifkit_api::{
    DependencyGraph, FactsError, FactsProvider, FactsResult, Occurrence, OccurrenceRole, Span,
    Symbol, SymbolId, Unit,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// On-disk shape of a facts dump.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FactsDump {
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub symbols: Vec<SymbolFacts>,
    /// Unit id -> occurrences inside that unit.
    #[serde(default)]
    pub occurrences: BTreeMap<String, Vec<OccurrenceFacts>>,
    #[serde(default)]
    pub dependencies: DependencyGraph,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SymbolFacts {
    #[serde(flatten)]
    pub symbol: Symbol,
    /// Declared type as the front-end prints it.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OccurrenceFacts {
    pub symbol: SymbolId,
    /// Defaults to the owning unit's path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub span: Span,
    pub role: OccurrenceRole,
}

pub struct JsonFactsProvider {
    units: Vec<Unit>,
    symbols: HashMap<SymbolId, Arc<Symbol>>,
    types: HashMap<SymbolId, String>,
    occurrences: HashMap<String, Vec<OccurrenceFacts>>,
    dependencies: DependencyGraph,
}

impl JsonFactsProvider {
    pub fn from_dump(dump: FactsDump) -> Self {
        let mut symbols = HashMap::with_capacity(dump.symbols.len());
        let mut types = HashMap::new();
        for facts in dump.symbols {
            let id = facts.symbol.id;
            if let Some(ty) = facts.declared_type {
                types.insert(id, ty);
            }
            if symbols.insert(id, Arc::new(facts.symbol)).is_some() {
                debug!("symbol {id} declared twice in facts dump; keeping the last");
            }
        }

        Self {
            units: dump.units,
            symbols,
            types,
            occurrences: dump.occurrences.into_iter().collect(),
            dependencies: dump.dependencies,
        }
    }

    pub fn from_reader(reader: impl Read) -> FactsResult<Self> {
        let dump: FactsDump = serde_json::from_reader(reader)?;
        Ok(Self::from_dump(dump))
    }

    pub fn from_path(path: &Path) -> FactsResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }
}

impl FactsProvider for JsonFactsProvider {
    fn list_units(&self) -> FactsResult<Vec<Unit>> {
        Ok(self.units.clone())
    }

    fn occurrences_of(&self, unit: &Unit) -> FactsResult<Vec<Occurrence>> {
        if !self.units.iter().any(|known| known.id == unit.id) {
            return Err(FactsError::UnknownUnit(unit.id.clone()));
        }
        let Some(facts) = self.occurrences.get(&unit.id) else {
            return Ok(Vec::new());
        };

        facts
            .iter()
            .map(|facts| {
                let symbol = self.symbols.get(&facts.symbol).ok_or_else(|| {
                    FactsError::UnknownSymbol {
                        unit: unit.id.clone(),
                        symbol: facts.symbol.0,
                    }
                })?;
                Ok(Occurrence {
                    symbol: Arc::clone(symbol),
                    path: facts.path.clone().unwrap_or_else(|| unit.path.clone()),
                    span: facts.span,
                    role: facts.role,
                })
            })
            .collect()
    }

    fn declared_type(&self, symbol: &Symbol) -> Option<String> {
        self.types.get(&symbol.id).cloned()
    }

    fn dependency_graph(&self) -> FactsResult<DependencyGraph> {
        Ok(self.dependencies.clone())
    }
}
