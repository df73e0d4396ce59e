//! Error types for the rebalancer.

use std::path::PathBuf;

use hanna_broker::BrokerError;

/// All errors that can occur during rebalancer operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("allocation file error: {0}")]
    Allocation(String),

    #[error("failed to read allocation file {path}: {source}")]
    AllocationRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse allocation JSON: {0}")]
    AllocationParse(#[from] serde_json::Error),

    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("portfolio error: {0}")]
    Portfolio(#[from] hanna::Error),

    #[error("invalid deposit amount: {0}")]
    Amount(String),

    #[error("order limit exceeded: {0}")]
    OrderLimit(String),

    #[error("execution aborted: {0}")]
    Aborted(String),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
