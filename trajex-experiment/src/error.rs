use crate::config::ConfigError;
use crate::output::OutputError;
use trajex_core::{EventError, HostError, UsageError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),

    #[error("host error: {0}")]
    Host(#[from] HostError),

    #[error("usage error: {0}")]
    Usage(#[from] UsageError),

    #[error("event error: {0}")]
    Event(#[from] EventError),
}
