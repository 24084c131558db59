pub mod error;
pub mod runtime;
pub mod traits;
pub mod types;

pub use error::{IngestError, IntakeClosed};
pub use runtime::{
    DynCommitSink, DynExecutor, DynPipelineBus, DynRuntimeMetrics, FlowControlConfig,
    FlowController, IngestRuntime, IntakeHandle, KernelRunStats, PipelineBus, RuntimeComponents,
    TokioPipelineBus,
};
pub use traits::{CommitSink, Executor, NoopRuntimeMetrics, RuntimeMetrics};
pub use types::{ExecutionResult, Message, MessageId, RuntimeConfig};
