//! Broker trait and implementations for hanna.
//!
//! Provides a generic `Broker` trait that abstracts over where holdings come
//! from and where orders go. Implementations:
//!
//! - **Mock** ([`mock::MockBroker`]): configurable responses for tests
//! - **Snapshot** (feature `snapshot`): paper trading against a JSON file

pub mod error;
pub mod mock;
pub mod types;

#[cfg(feature = "snapshot")]
pub mod snapshot;

pub use error::BrokerError;
pub use types::*;

use hanna::SecurityId;

/// A broker connection that can fetch holdings, submit orders, and get quotes.
pub trait Broker {
    /// Connect to the broker.
    fn connect(&mut self) -> Result<(), BrokerError>;

    /// Disconnect gracefully.
    fn disconnect(&mut self) -> Result<(), BrokerError>;

    /// Get all current holdings.
    fn holdings(&self) -> Result<Vec<Holding>, BrokerError>;

    /// Get account summary (cash available for deposits).
    fn account(&self) -> Result<Account, BrokerError>;

    /// Submit an order. Returns order ID.
    fn submit_order(&self, order: &BrokerOrder) -> Result<OrderId, BrokerError>;

    /// Get status of a submitted order.
    fn order_status(&self, id: OrderId) -> Result<BrokerOrderStatus, BrokerError>;

    /// Get current quote for a security.
    fn quote(&self, security: &SecurityId) -> Result<Quote, BrokerError>;
}
