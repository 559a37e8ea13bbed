pub mod collector;
pub mod error;
pub mod format;
pub mod ranking;
pub mod source;
pub mod types;

pub use collector::{collect, Collector, CollectorConfig, SourceFactory};
pub use types::Snapshot;
