pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod facts;
pub mod indexer;
pub mod logging;
pub mod moniker;
pub mod stats;
pub mod typestring;
pub mod writer;

pub use builder::{BuilderOptions, DocumentSummary, GraphBuilder};
pub use cache::{CacheStats, PackageData, PackageDataCache};
pub use config::IndexerConfig;
pub use error::{IndexError, Result};
pub use facts::{FactsDump, JsonFactsProvider};
pub use indexer::{IndexReport, Indexer};
pub use moniker::MonikerResolver;
pub use stats::{IndexStats, StatsSnapshot};
pub use writer::{GraphEmitter, JsonLinesSink, RecordSink};
