//! Serializes LSIF records to a sink as they are produced.
//!
//! There is no queue between producers and the sink: a record is written
//! while the emitter lock is held, so a slow sink blocks the workers.

use crate::error::{IndexError, Result};
use crate::stats::IndexStats;
use lsifkit_api::{Edge, Record, Vertex};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Destination for serialized records, one call per record.
pub trait RecordSink: Send {
    fn write_record(&mut self, record: &[u8]) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Writes each record followed by a newline.
pub struct JsonLinesSink<W: Write + Send> {
    inner: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        self.inner.write_all(record)?;
        self.inner.write_all(b"\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct EmitterState {
    next_id: u64,
    sink: Box<dyn RecordSink>,
    buf: Vec<u8>,
}

/// Assigns record ids and writes records in id order.
///
/// Vertices and edges share one id sequence starting at 1. An id is consumed
/// only when its record reaches the sink, so written ids have no gaps.
pub struct GraphEmitter {
    state: Mutex<EmitterState>,
    stats: Arc<IndexStats>,
}

impl GraphEmitter {
    pub fn new(sink: Box<dyn RecordSink>, stats: Arc<IndexStats>) -> Self {
        Self {
            state: Mutex::new(EmitterState {
                next_id: 1,
                sink,
                buf: Vec::with_capacity(256),
            }),
            stats,
        }
    }

    pub fn emit_vertex(&self, vertex: &Vertex) -> Result<u64> {
        let mut state = self.lock()?;
        let id = write(&mut state, "vertex", vertex)?;
        self.stats.record_vertex();
        Ok(id)
    }

    /// Fails with [`IndexError::DanglingEdge`] if the edge names an id that
    /// has not been written yet.
    pub fn emit_edge(&self, edge: &Edge) -> Result<u64> {
        let mut state = self.lock()?;
        if let Some(id) = edge
            .endpoints()
            .into_iter()
            .find(|id| *id == 0 || *id >= state.next_id)
        {
            return Err(IndexError::DanglingEdge {
                label: edge.label(),
                id,
            });
        }
        let id = write(&mut state, "edge", edge)?;
        self.stats.record_edge();
        Ok(id)
    }

    pub fn flush(&self) -> Result<()> {
        self.lock()?.sink.flush().map_err(IndexError::Sink)
    }

    /// Number of records written so far.
    pub fn emitted(&self) -> Result<u64> {
        Ok(self.lock()?.next_id - 1)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, EmitterState>> {
        self.state.lock().map_err(|_| IndexError::poisoned("emitter"))
    }
}

fn write<T: Serialize>(state: &mut EmitterState, kind: &'static str, element: &T) -> Result<u64> {
    let id = state.next_id;
    state.buf.clear();
    serde_json::to_writer(&mut state.buf, &Record { id, kind, element })?;
    state
        .sink
        .write_record(&state.buf)
        .map_err(IndexError::Sink)?;
    state.next_id += 1;
    Ok(id)
}
