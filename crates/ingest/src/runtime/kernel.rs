use std::sync::Arc;
use std::time::Instant;

use rayon::ThreadPool;
use rayon::prelude::*;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::flow_control::FlowController;
use crate::error::IngestError;
use crate::traits::{CommitSink, Executor, RuntimeMetrics};
use crate::types::{ExecutionResult, Message, MessageId};

pub struct BusChannels<P>
where
    P: Send + 'static,
{
    pub intake_tx: mpsc::Sender<Message<P>>,
    pub intake_rx: mpsc::Receiver<Message<P>>,
}

pub trait PipelineBus<P>: Send + Sync
where
    P: Send + 'static,
{
    fn open_channels(&self, capacity: usize) -> BusChannels<P>;
}

#[derive(Default)]
pub struct TokioPipelineBus;

impl<P> PipelineBus<P> for TokioPipelineBus
where
    P: Send + 'static,
{
    fn open_channels(&self, capacity: usize) -> BusChannels<P> {
        let (intake_tx, intake_rx) = mpsc::channel::<Message<P>>(capacity.max(1));
        BusChannels {
            intake_tx,
            intake_rx,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KernelRunStats {
    pub executed_messages: usize,
    pub skipped_messages: usize,
    pub committed_batches: usize,
}

enum Outcome<Out, E> {
    Done(ExecutionResult<Out>),
    Skipped,
    Failed(MessageId, E),
}

/// Drains the intake channel until every sender is gone, executing messages
/// in parallel batches and committing each batch before reading the next.
///
/// The first executor failure cancels `cancel`: messages that have not started
/// yet are skipped and the failure is returned. An external cancellation ends
/// the run with [`IngestError::Cancelled`].
pub async fn run_pipeline<P, Out, E, EX, C, RM>(
    channels: BusChannels<P>,
    executor: Arc<EX>,
    commit_sink: Arc<C>,
    metrics: Arc<RM>,
    flow: &FlowController,
    cancel: CancellationToken,
) -> Result<KernelRunStats, IngestError<E>>
where
    P: Send + 'static,
    Out: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
    EX: Executor<P, Out, Error = E> + Send + Sync + 'static + ?Sized,
    C: CommitSink<Out, Error = E> + Send + Sync + 'static + ?Sized,
    RM: RuntimeMetrics + Send + Sync + 'static + ?Sized,
{
    let BusChannels {
        intake_tx,
        mut intake_rx,
    } = channels;
    drop(intake_tx);

    let pool = flow.build_pool().map_err(IngestError::Runtime)?;
    let batch_size = flow.batch_size();
    let mut stats = KernelRunStats::default();

    loop {
        let first = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            msg = intake_rx.recv() => msg,
        };
        let Some(first) = first else {
            break;
        };

        let mut batch = Vec::with_capacity(batch_size);
        batch.push(first);
        while batch.len() < batch_size {
            match intake_rx.try_recv() {
                Ok(msg) => batch.push(msg),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        metrics.observe_queue_depth("kernel_batch", batch.len());

        execute_batch(
            batch,
            &executor,
            &commit_sink,
            metrics.as_ref(),
            &pool,
            &cancel,
            &mut stats,
        )
        .await?;
    }

    if cancel.is_cancelled() {
        debug!(
            "pipeline cancelled after {} executed messages",
            stats.executed_messages
        );
        return Err(IngestError::Cancelled);
    }

    metrics.observe_queue_depth("kernel_executed_total", stats.executed_messages);
    Ok(stats)
}

async fn execute_batch<P, Out, E, EX, C, RM>(
    batch: Vec<Message<P>>,
    executor: &Arc<EX>,
    commit_sink: &Arc<C>,
    metrics: &RM,
    pool: &Arc<ThreadPool>,
    cancel: &CancellationToken,
    stats: &mut KernelRunStats,
) -> Result<(), IngestError<E>>
where
    P: Send + 'static,
    Out: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
    EX: Executor<P, Out, Error = E> + Send + Sync + 'static + ?Sized,
    C: CommitSink<Out, Error = E> + Send + Sync + 'static + ?Sized,
    RM: RuntimeMetrics + ?Sized,
{
    let started = Instant::now();
    let executor_cloned = Arc::clone(executor);
    let pool_cloned = Arc::clone(pool);
    let token = cancel.clone();

    let outcomes = tokio::task::spawn_blocking(move || {
        pool_cloned.install(|| {
            batch
                .into_par_iter()
                .map(|msg| {
                    if token.is_cancelled() {
                        return Outcome::Skipped;
                    }
                    let msg_id = msg.msg_id.clone();
                    match executor_cloned.execute(msg) {
                        Ok(result) => Outcome::Done(result),
                        Err(error) => {
                            token.cancel();
                            Outcome::Failed(msg_id, error)
                        }
                    }
                })
                .collect::<Vec<_>>()
        })
    })
    .await
    .map_err(|e| IngestError::Runtime(format!("execute join failure: {e}")))?;

    let mut results = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Outcome::Done(result) => results.push(result),
            Outcome::Skipped => stats.skipped_messages += 1,
            Outcome::Failed(msg_id, error) => {
                warn!("fatal execute failure for {msg_id}: {error}");
                return Err(IngestError::Unit { msg_id, error });
            }
        }
    }

    stats.executed_messages += results.len();
    metrics.observe_throughput("execute", results.len());
    metrics.observe_latency_ms("execute", started.elapsed().as_millis() as u64);

    if results.is_empty() {
        return Ok(());
    }

    let sink = Arc::clone(commit_sink);
    let committed = tokio::task::spawn_blocking(move || sink.commit_batch(results))
        .await
        .map_err(|e| IngestError::Runtime(format!("commit join failure: {e}")))?
        .map_err(IngestError::Commit)?;
    stats.committed_batches += usize::from(committed > 0);

    Ok(())
}
