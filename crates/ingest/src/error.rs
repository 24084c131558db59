use thiserror::Error;

use crate::types::MessageId;

#[derive(Debug, Error)]
pub enum IngestError<E> {
    #[error("{msg_id}: {error}")]
    Unit { msg_id: MessageId, error: E },
    #[error("commit failed: {0}")]
    Commit(E),
    #[error("ingest cancelled")]
    Cancelled,
    #[error("runtime failure: {0}")]
    Runtime(String),
}

#[derive(Debug, Error)]
#[error("ingest intake handle closed")]
pub struct IntakeClosed;
