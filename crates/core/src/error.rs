use lsifkit_api::FactsError;
use lsifkit_ingest::IngestError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("facts provider error: {0}")]
    Facts(#[from] FactsError),
    /// The record sink rejected a write or flush. The sink's own message is kept.
    #[error("sink error: {0}")]
    Sink(#[source] std::io::Error),
    #[error("{label} edge names unassigned vertex id {id}")]
    DanglingEdge { label: &'static str, id: u64 },
    #[error("cannot build a file URI for {0}")]
    InvalidPath(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("unit {unit}: {source}")]
    Unit {
        unit: String,
        #[source]
        source: Box<IndexError>,
    },
    #[error("indexing cancelled")]
    Cancelled,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IndexError {
    pub fn poisoned(what: &str) -> Self {
        IndexError::Internal(format!("{what} lock poisoned"))
    }

    /// The innermost error, with unit context stripped.
    pub fn root(&self) -> &IndexError {
        match self {
            IndexError::Unit { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<IngestError<IndexError>> for IndexError {
    fn from(err: IngestError<IndexError>) -> Self {
        match err {
            IngestError::Unit { msg_id, error } => IndexError::Unit {
                unit: msg_id,
                source: Box::new(error),
            },
            IngestError::Commit(error) => error,
            IngestError::Cancelled => IndexError::Cancelled,
            IngestError::Runtime(message) => IndexError::Internal(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
