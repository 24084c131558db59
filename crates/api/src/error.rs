#[derive(Debug, thiserror::Error)]
pub enum FactsError {
    #[error("cannot analyze unit {unit}: {reason}")]
    Analysis { unit: String, reason: String },
    #[error("unknown unit: {0}")]
    UnknownUnit(String),
    #[error("unknown symbol {symbol} referenced from {unit}")]
    UnknownSymbol { unit: String, symbol: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed facts: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type FactsResult<T> = std::result::Result<T, FactsError>;
