mod common;

use common::*;
use lsifkit_api::{
    DependencyGraph, FactsError, FactsProvider, FactsResult, Occurrence, Symbol, SymbolKind, Unit,
    Vertex,
};
use lsifkit_core::{GraphEmitter, IndexError, IndexStats, Indexer, RecordSink};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

/// Accepts `limit` records, then fails every write.
struct BrokenSink {
    limit: usize,
    written: usize,
}

impl RecordSink for BrokenSink {
    fn write_record(&mut self, _record: &[u8]) -> io::Result<()> {
        if self.written == self.limit {
            return Err(io::Error::other("disk full"));
        }
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Blocks each write until the test hands out a permit.
struct GatedSink {
    permits: mpsc::Receiver<()>,
    written: Arc<AtomicUsize>,
}

impl RecordSink for GatedSink {
    fn write_record(&mut self, _record: &[u8]) -> io::Result<()> {
        self.permits
            .recv()
            .map_err(|_| io::Error::other("gate closed"))?;
        self.written.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Fails analysis of one unit path.
struct FlakyFacts {
    inner: MemoryFacts,
    broken: &'static str,
}

impl FactsProvider for FlakyFacts {
    fn list_units(&self) -> FactsResult<Vec<Unit>> {
        self.inner.list_units()
    }

    fn occurrences_of(&self, unit: &Unit) -> FactsResult<Vec<Occurrence>> {
        if unit.path.to_str() == Some(self.broken) {
            return Err(FactsError::Analysis {
                unit: unit.id.clone(),
                reason: "type check failed".to_string(),
            });
        }
        self.inner.occurrences_of(unit)
    }

    fn declared_type(&self, symbol: &Symbol) -> Option<String> {
        self.inner.declared_type(symbol)
    }

    fn dependency_graph(&self) -> FactsResult<DependencyGraph> {
        self.inner.dependency_graph()
    }
}

fn single_unit() -> MemoryFacts {
    let f = symbol(1, "F", SymbolKind::Function, MODULE);
    let mut facts = MemoryFacts::new();
    facts.unit("a", "a.go", vec![def(&f, "a.go", 1, 5)]);
    facts
}

#[tokio::test]
async fn sink_failure_aborts_with_unit_context() {
    let sink = BrokenSink {
        limit: 4,
        written: 0,
    };
    let err = Indexer::new(config(1), Arc::new(single_unit()), Box::new(sink))
        .index()
        .await
        .expect_err("sink failure is fatal");

    match &err {
        IndexError::Unit { unit, .. } => assert_eq!(unit, "a.go"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(err.root(), IndexError::Sink(_)));
    assert!(err.to_string().contains("disk full"));
}

#[tokio::test]
async fn sink_failure_before_units_is_reported_directly() {
    let sink = BrokenSink {
        limit: 0,
        written: 0,
    };
    let err = Indexer::new(config(1), Arc::new(single_unit()), Box::new(sink))
        .index()
        .await
        .expect_err("sink failure is fatal");
    assert!(matches!(err, IndexError::Sink(_)));
}

#[tokio::test]
async fn provider_failure_cancels_the_run() {
    let mut inner = single_unit();
    let g = symbol(2, "G", SymbolKind::Function, MODULE);
    inner.unit("b", "b.go", vec![def(&g, "b.go", 1, 5)]);
    let facts = FlakyFacts {
        inner,
        broken: "b.go",
    };

    let err = Indexer::new(config(1), Arc::new(facts), Box::new(RecordingSink::default()))
        .index()
        .await
        .expect_err("analysis failure is fatal");

    assert!(err.to_string().starts_with("unit b.go:"));
    assert!(matches!(
        err.root(),
        IndexError::Facts(FactsError::Analysis { .. })
    ));
}

#[tokio::test]
async fn cancelled_run_stops_before_units() {
    let facts = Arc::new(single_unit());
    let indexer = Indexer::new(config(2), facts.clone(), Box::new(RecordingSink::default()));
    indexer.cancel_token().cancel();

    let err = indexer.index().await.expect_err("run is cancelled");
    assert!(matches!(err, IndexError::Cancelled));
    assert_eq!(facts.occurrence_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn relative_project_root_is_rejected() {
    let config = lsifkit_core::IndexerConfig {
        project_root: "repo".into(),
        ..config(1)
    };
    let err = Indexer::new(config, Arc::new(single_unit()), Box::new(RecordingSink::default()))
        .index()
        .await
        .expect_err("config is invalid");
    assert!(matches!(err, IndexError::Config(_)));
}

#[test]
fn slow_sink_blocks_the_emitter() {
    let (permits, gate) = mpsc::channel();
    let written = Arc::new(AtomicUsize::new(0));
    let emitter = Arc::new(GraphEmitter::new(
        Box::new(GatedSink {
            permits: gate,
            written: written.clone(),
        }),
        Arc::new(IndexStats::new()),
    ));
    let returned = Arc::new(Mutex::new(Vec::new()));

    let producer = {
        let emitter = emitter.clone();
        let returned = returned.clone();
        std::thread::spawn(move || {
            for _ in 0..3 {
                let id = emitter.emit_vertex(&Vertex::ResultSet).unwrap();
                returned.lock().unwrap().push(id);
            }
        })
    };

    std::thread::sleep(Duration::from_millis(50));
    assert!(!producer.is_finished());
    assert_eq!(written.load(Ordering::SeqCst), 0);
    assert!(returned.lock().unwrap().is_empty());

    permits.send(()).unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert!(!producer.is_finished());
    assert_eq!(written.load(Ordering::SeqCst), 1);
    assert_eq!(*returned.lock().unwrap(), vec![1]);

    permits.send(()).unwrap();
    permits.send(()).unwrap();
    producer.join().unwrap();
    assert_eq!(written.load(Ordering::SeqCst), 3);
    assert_eq!(*returned.lock().unwrap(), vec![1, 2, 3]);
}
