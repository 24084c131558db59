use crate::types::{ExecutionResult, Message};

pub trait Executor<P, Out>: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn execute(&self, message: Message<P>) -> Result<ExecutionResult<Out>, Self::Error>;
}

pub trait CommitSink<Out>: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Receives one executed batch, returns how many results it kept.
    fn commit_batch(&self, results: Vec<ExecutionResult<Out>>) -> Result<usize, Self::Error>;
}

pub trait RuntimeMetrics: Send + Sync {
    fn observe_queue_depth(&self, queue: &'static str, depth: usize);
    fn observe_throughput(&self, stage: &'static str, count: usize);
    fn observe_latency_ms(&self, stage: &'static str, millis: u64);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRuntimeMetrics;

impl RuntimeMetrics for NoopRuntimeMetrics {
    fn observe_queue_depth(&self, _queue: &'static str, _depth: usize) {}
    fn observe_throughput(&self, _stage: &'static str, _count: usize) {}
    fn observe_latency_ms(&self, _stage: &'static str, _millis: u64) {}
}
