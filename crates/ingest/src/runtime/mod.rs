use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{IngestError, IntakeClosed};
use crate::traits::{CommitSink, Executor, RuntimeMetrics};
use crate::types::{Message, RuntimeConfig};

pub mod flow_control;
pub mod kernel;

pub use flow_control::{FlowControlConfig, FlowController};
pub use kernel::{KernelRunStats, PipelineBus, TokioPipelineBus};

pub type DynExecutor<P, Out, E> = Arc<dyn Executor<P, Out, Error = E> + Send + Sync>;
pub type DynCommitSink<Out, E> = Arc<dyn CommitSink<Out, Error = E> + Send + Sync>;
pub type DynPipelineBus<P> = Arc<dyn PipelineBus<P> + Send + Sync>;
pub type DynRuntimeMetrics = Arc<dyn RuntimeMetrics + Send + Sync>;

pub struct RuntimeComponents<P, Out, E>
where
    P: Send + 'static,
    Out: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    pub executor: DynExecutor<P, Out, E>,
    pub commit_sink: DynCommitSink<Out, E>,
    pub bus: DynPipelineBus<P>,
    pub metrics: DynRuntimeMetrics,
}

impl<P, Out, E> RuntimeComponents<P, Out, E>
where
    P: Send + 'static,
    Out: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    pub fn with_tokio_bus(
        executor: DynExecutor<P, Out, E>,
        commit_sink: DynCommitSink<Out, E>,
        metrics: DynRuntimeMetrics,
    ) -> Self {
        Self {
            executor,
            commit_sink,
            bus: Arc::new(TokioPipelineBus),
            metrics,
        }
    }
}

/// Producer side of the intake channel. Submitting blocks while the channel
/// is full and fails once the run is cancelled or finished.
#[derive(Clone)]
pub struct IntakeHandle<P> {
    tx: mpsc::Sender<Message<P>>,
    cancel: CancellationToken,
}

impl<P> IntakeHandle<P>
where
    P: Send + 'static,
{
    pub async fn submit(&self, message: Message<P>) -> Result<(), IntakeClosed> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(IntakeClosed),
            sent = self.tx.send(message) => sent.map_err(|_| IntakeClosed),
        }
    }
}

pub struct IngestRuntime<P, Out, E>
where
    P: Send + 'static,
    Out: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    pub executor: DynExecutor<P, Out, E>,
    pub commit_sink: DynCommitSink<Out, E>,
    pub metrics: DynRuntimeMetrics,
    pub flow: FlowController,
    cancel: CancellationToken,
    channels: kernel::BusChannels<P>,
}

impl<P, Out, E> IngestRuntime<P, Out, E>
where
    P: Send + 'static,
    Out: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    pub fn new(config: RuntimeConfig, components: RuntimeComponents<P, Out, E>) -> Self {
        Self::with_cancellation(config, components, CancellationToken::new())
    }

    pub fn with_cancellation(
        config: RuntimeConfig,
        components: RuntimeComponents<P, Out, E>,
        cancel: CancellationToken,
    ) -> Self {
        let flow = FlowController::new(&FlowControlConfig::from(&config));
        let channels = components.bus.open_channels(flow.channel_capacity());

        Self {
            executor: components.executor,
            commit_sink: components.commit_sink,
            metrics: components.metrics,
            flow,
            cancel,
            channels,
        }
    }

    pub fn intake_handle(&self) -> IntakeHandle<P> {
        IntakeHandle {
            tx: self.channels.intake_tx.clone(),
            cancel: self.cancel.clone(),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs until every [`IntakeHandle`] is dropped and the channel drains.
    pub async fn run(self) -> Result<KernelRunStats, IngestError<E>> {
        let Self {
            executor,
            commit_sink,
            metrics,
            flow,
            cancel,
            channels,
        } = self;

        let kernel_task = tokio::spawn(async move {
            kernel::run_pipeline(channels, executor, commit_sink, metrics, &flow, cancel).await
        });

        kernel_task
            .await
            .map_err(|e| IngestError::Runtime(format!("kernel task join failure: {e}")))?
    }
}
