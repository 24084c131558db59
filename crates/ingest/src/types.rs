pub type MessageId = String;

#[derive(Debug, Clone)]
pub struct Message<P> {
    pub msg_id: MessageId,
    pub payload: P,
}

impl<P> Message<P> {
    pub fn new(msg_id: impl Into<MessageId>, payload: P) -> Self {
        Self {
            msg_id: msg_id.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionResult<Out> {
    pub msg_id: MessageId,
    pub output: Out,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub kernel_channel_capacity: usize,
    /// Worker threads; `0` means available parallelism.
    pub workers: usize,
    /// Messages handed to the pool at once; `0` means one per worker.
    pub execute_batch_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            kernel_channel_capacity: 256,
            workers: 0,
            execute_batch_size: 0,
        }
    }
}
