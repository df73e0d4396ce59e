//! Broker error types.

/// Errors that can occur during broker operations.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("order error: {0}")]
    Order(String),

    #[error("not connected")]
    NotConnected,

    #[error("unknown security: {0}")]
    UnknownSecurity(String),

    #[error("unknown order: {0}")]
    UnknownOrder(u64),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("{0}")]
    Other(String),
}
