pub mod error;
pub mod facts;
pub mod models;
pub mod protocol;

// Re-export commonly used types
pub use error::{FactsError, FactsResult};
pub use facts::FactsProvider;
pub use models::*;
pub use protocol::{
    Edge, HoverContents, ItemProperty, MarkedString, POSITION_ENCODING, PROTOCOL_VERSION,
    Position, Record, ToolInfo, Vertex,
};
