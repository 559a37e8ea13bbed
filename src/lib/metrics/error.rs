use std::path::PathBuf;

use tracing::*;

pub type Result<T> = std::result::Result<T, CollectionError>;

#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("CPU sample failed: {0}")]
    Cpu(String),

    #[error("Memory query failed: {0}")]
    Memory(String),

    #[error("No disk mounted at {0:?}")]
    DiskNotFound(PathBuf),

    #[error("Network query failed: {0}")]
    Network(String),

    #[error("Uptime unavailable: {0}")]
    Uptime(String),

    #[error("Process table unavailable: {0}")]
    Processes(String),

    #[error("Metrics source panicked: {0}")]
    Panicked(String),
}

/// Turns a failed sub-query into its placeholder value, so one bad reading
/// never takes the whole snapshot down.
pub trait Degrade<T> {
    fn or_degrade(self, what: &str) -> T
    where
        T: Default;

    fn or_degrade_to(self, what: &str, fallback: T) -> T;
}

impl<T> Degrade<T> for Result<T> {
    fn or_degrade(self, what: &str) -> T
    where
        T: Default,
    {
        self.or_degrade_to(what, T::default())
    }

    fn or_degrade_to(self, what: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(error) => {
                warn!("Failed to read {what}, using placeholder. Reason: {error}");
                fallback
            }
        }
    }
}
