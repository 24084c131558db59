use std::num::NonZeroUsize;
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::types::RuntimeConfig;

#[derive(Debug, Clone)]
pub struct FlowControlConfig {
    pub channel_capacity: usize,
    pub workers: usize,
    pub execute_batch_size: usize,
}

impl Default for FlowControlConfig {
    fn default() -> Self {
        Self::from(&RuntimeConfig::default())
    }
}

impl From<&RuntimeConfig> for FlowControlConfig {
    fn from(value: &RuntimeConfig) -> Self {
        Self {
            channel_capacity: value.kernel_channel_capacity,
            workers: value.workers,
            execute_batch_size: value.execute_batch_size,
        }
    }
}

/// Resolved limits for one pipeline run.
#[derive(Debug, Clone)]
pub struct FlowController {
    channel_capacity: usize,
    workers: usize,
    batch_size: usize,
}

impl FlowController {
    pub fn new(config: &FlowControlConfig) -> Self {
        let workers = if config.workers == 0 {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        } else {
            config.workers
        };
        let batch_size = if config.execute_batch_size == 0 {
            workers
        } else {
            config.execute_batch_size
        };

        Self {
            channel_capacity: config.channel_capacity.max(1),
            workers,
            batch_size: batch_size.max(1),
        }
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn build_pool(&self) -> Result<Arc<ThreadPool>, String> {
        ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("ingest-worker-{i}"))
            .build()
            .map(Arc::new)
            .map_err(|e| format!("failed to build worker pool: {e}"))
    }
}
