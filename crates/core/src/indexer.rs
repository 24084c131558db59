//! One indexing run, from metadata to the final project containment edge.

use crate::builder::{BuilderOptions, DocumentSummary, GraphBuilder};
use crate::cache::{CacheStats, PackageDataCache};
use crate::config::IndexerConfig;
use crate::error::{IndexError, Result};
use crate::moniker::MonikerResolver;
use crate::stats::{IndexStats, StatsSnapshot};
use crate::writer::{GraphEmitter, RecordSink};
use lsifkit_api::{Edge, FactsProvider, POSITION_ENCODING, PROTOCOL_VERSION, Unit, Vertex};
use lsifkit_ingest::{
    CommitSink, ExecutionResult, Executor, IngestRuntime, Message, RuntimeComponents,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    pub stats: StatsSnapshot,
    pub cache: CacheStats,
    pub documents: usize,
    pub elapsed: Duration,
}

pub struct Indexer {
    config: IndexerConfig,
    provider: Arc<dyn FactsProvider>,
    emitter: Arc<GraphEmitter>,
    stats: Arc<IndexStats>,
    cancel: CancellationToken,
}

impl Indexer {
    pub fn new(
        config: IndexerConfig,
        provider: Arc<dyn FactsProvider>,
        sink: Box<dyn RecordSink>,
    ) -> Self {
        let stats = Arc::new(IndexStats::new());
        Self {
            emitter: Arc::new(GraphEmitter::new(sink, stats.clone())),
            config,
            provider,
            stats,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancelling stops workers at their next unit and fails the run with
    /// [`IndexError::Cancelled`].
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn index(self) -> Result<IndexReport> {
        let started = Instant::now();
        self.config.validate()?;

        let project = self.emit_preamble()?;

        let units = self.provider.list_units()?;
        let dependencies = Arc::new(self.provider.dependency_graph()?);
        info!(
            "indexing {} units of {} with {} dependencies",
            units.len(),
            self.config.project_root.display(),
            dependencies.len()
        );

        let resolver =
            MonikerResolver::from_config(&self.config, units.iter().map(|u| u.package.clone()));
        let cache = Arc::new(PackageDataCache::new(
            self.provider.clone(),
            resolver,
            dependencies,
            self.stats.clone(),
            self.config.evict_released,
        ));
        let builder = Arc::new(GraphBuilder::new(
            BuilderOptions::from(&self.config),
            cache.clone(),
            self.emitter.clone(),
            self.stats.clone(),
        ));
        let commit = Arc::new(ProjectCommitSink::default());

        let runtime: IngestRuntime<Unit, Option<DocumentSummary>, IndexError> =
            IngestRuntime::with_cancellation(
                self.config.runtime_config(),
                RuntimeComponents::with_tokio_bus(
                    Arc::new(UnitExecutor {
                        provider: self.provider.clone(),
                        builder,
                    }),
                    commit.clone(),
                    self.stats.clone(),
                ),
                self.cancel.clone(),
            );
        debug!(
            "ingest runtime: {} workers, batch {}",
            runtime.flow.workers(),
            runtime.flow.batch_size()
        );

        let intake = runtime.intake_handle();
        let feeder = tokio::spawn(async move {
            for unit in units {
                let msg_id = unit.path.display().to_string();
                if intake.submit(Message::new(msg_id, unit)).await.is_err() {
                    break;
                }
            }
        });

        let outcome = runtime.run().await;
        feeder
            .await
            .map_err(|e| IndexError::Internal(format!("unit feeder join failure: {e}")))?;
        let run = outcome.map_err(IndexError::from)?;

        let documents = commit.documents()?;
        if !documents.is_empty() {
            self.emitter.emit_edge(&Edge::Contains {
                out_v: project,
                in_vs: documents.clone(),
            })?;
        }
        self.emitter.flush()?;

        let report = IndexReport {
            stats: self.stats.snapshot(),
            cache: cache.stats(),
            documents: documents.len(),
            elapsed: started.elapsed(),
        };
        if report.stats.inconsistencies > 0 || report.stats.skipped_occurrences > 0 {
            warn!(
                "index finished with {} inconsistencies and {} skipped occurrences",
                report.stats.inconsistencies, report.stats.skipped_occurrences
            );
        }
        info!(
            "indexed {} units into {} records in {:?}",
            run.executed_messages,
            report.stats.records(),
            report.elapsed
        );
        Ok(report)
    }

    /// Writes `metaData` and `project`, returning the project vertex id.
    fn emit_preamble(&self) -> Result<u64> {
        let root = &self.config.project_root;
        let project_root = Url::from_directory_path(root)
            .map_err(|_| IndexError::InvalidPath(root.display().to_string()))?;
        self.emitter.emit_vertex(&Vertex::MetaData {
            version: PROTOCOL_VERSION.to_string(),
            project_root: project_root.to_string(),
            position_encoding: POSITION_ENCODING.to_string(),
            tool_info: self.config.tool_info.clone(),
        })?;
        self.emitter.emit_vertex(&Vertex::Project {
            kind: self.config.language_id.clone(),
        })
    }
}

struct UnitExecutor {
    provider: Arc<dyn FactsProvider>,
    builder: Arc<GraphBuilder>,
}

impl Executor<Unit, Option<DocumentSummary>> for UnitExecutor {
    type Error = IndexError;

    fn execute(
        &self,
        message: Message<Unit>,
    ) -> Result<ExecutionResult<Option<DocumentSummary>>> {
        let unit = message.payload;
        let occurrences = self.provider.occurrences_of(&unit)?;
        let summary = self.builder.visit(&unit, occurrences)?;
        Ok(ExecutionResult {
            msg_id: message.msg_id,
            output: summary,
        })
    }
}

/// Collects closed documents for the project containment edge.
#[derive(Default)]
struct ProjectCommitSink {
    documents: Mutex<Vec<(PathBuf, u64)>>,
}

impl ProjectCommitSink {
    /// Document ids ordered by path.
    fn documents(&self) -> Result<Vec<u64>> {
        let mut documents = self
            .documents
            .lock()
            .map_err(|_| IndexError::poisoned("project documents"))?
            .clone();
        documents.sort();
        Ok(documents.into_iter().map(|(_, id)| id).collect())
    }
}

impl CommitSink<Option<DocumentSummary>> for ProjectCommitSink {
    type Error = IndexError;

    fn commit_batch(
        &self,
        results: Vec<ExecutionResult<Option<DocumentSummary>>>,
    ) -> Result<usize> {
        let mut documents = self
            .documents
            .lock()
            .map_err(|_| IndexError::poisoned("project documents"))?;
        let before = documents.len();
        documents.extend(
            results
                .into_iter()
                .filter_map(|result| result.output)
                .map(|summary| (summary.path, summary.document)),
        );
        Ok(documents.len() - before)
    }
}
