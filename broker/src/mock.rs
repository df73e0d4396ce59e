//! Mock broker for testing: implements the `Broker` trait with configurable behavior.
//!
//! Use this in integration tests to simulate broker responses without a
//! brokerage account.
//!
//! ```ignore
//! use hanna_broker::mock::{MockBroker, FillMode};
//! use hanna::SecurityId;
//!
//! let broker = MockBroker::builder()
//!     .fill_mode(FillMode::ImmediateFull)
//!     .with_holding(SecurityId::new("VTI"), 4, 250_00)
//!     .with_cash(500_00)
//!     .build();
//! ```

use std::sync::Mutex;

use hanna::SecurityId;
use rustc_hash::FxHashMap;

use crate::Broker;
use crate::error::BrokerError;
use crate::types::*;

/// How the mock broker handles submitted orders.
#[derive(Clone, Debug)]
pub enum FillMode {
    /// Orders are immediately fully filled at the last price.
    ImmediateFull,
    /// Orders are partially filled (the given fraction, e.g., 0.5 = 50%).
    ImmediatePartial(f64),
    /// All orders are rejected.
    Reject,
}

/// A recorded order submission for assertion in tests.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedOrder {
    pub id: OrderId,
    pub security: SecurityId,
    pub quantity: u64,
    pub order_type: BrokerOrderType,
}

/// Builder for `MockBroker`.
pub struct MockBrokerBuilder {
    fill_mode: FillMode,
    holdings: Vec<Holding>,
    quotes: FxHashMap<SecurityId, Quote>,
    cash_cents: i64,
}

impl MockBrokerBuilder {
    pub fn fill_mode(mut self, mode: FillMode) -> Self {
        self.fill_mode = mode;
        self
    }

    /// Add a holding and a matching quote at `price_cents`.
    pub fn with_holding(self, security: SecurityId, quantity: u64, price_cents: i64) -> Self {
        let name = security.as_str().to_string();
        self.with_named_holding(security, name, quantity, price_cents)
    }

    pub fn with_named_holding(
        mut self,
        security: SecurityId,
        name: impl Into<String>,
        quantity: u64,
        price_cents: i64,
    ) -> Self {
        self.holdings.push(Holding {
            security: security.clone(),
            name: name.into(),
            quantity,
            price_cents,
            equity_cents: quantity as i64 * price_cents,
        });
        self.quotes
            .entry(security.clone())
            .or_insert_with(|| Quote {
                security,
                bid_cents: price_cents,
                ask_cents: price_cents,
                last_cents: price_cents,
            });
        self
    }

    pub fn with_quote(mut self, security: SecurityId, bid: i64, ask: i64) -> Self {
        self.quotes.insert(
            security.clone(),
            Quote {
                security,
                bid_cents: bid,
                ask_cents: ask,
                last_cents: (bid + ask) / 2,
            },
        );
        self
    }

    pub fn with_cash(mut self, cash_cents: i64) -> Self {
        self.cash_cents = cash_cents;
        self
    }

    pub fn build(self) -> MockBroker {
        MockBroker {
            connected: false,
            fill_mode: self.fill_mode,
            holdings: self.holdings,
            quotes: self.quotes,
            cash_cents: self.cash_cents,
            submitted_orders: Mutex::new(Vec::new()),
        }
    }
}

/// A mock broker that records submitted orders and returns configurable responses.
pub struct MockBroker {
    connected: bool,
    fill_mode: FillMode,
    holdings: Vec<Holding>,
    quotes: FxHashMap<SecurityId, Quote>,
    cash_cents: i64,
    submitted_orders: Mutex<Vec<RecordedOrder>>,
}

impl MockBroker {
    pub fn builder() -> MockBrokerBuilder {
        MockBrokerBuilder {
            fill_mode: FillMode::ImmediateFull,
            holdings: Vec::new(),
            quotes: FxHashMap::default(),
            cash_cents: 0,
        }
    }

    /// Get all orders that were submitted (for assertion in tests).
    pub fn submitted_orders(&self) -> Vec<RecordedOrder> {
        self.submitted_orders
            .lock()
            .map(|orders| orders.clone())
            .unwrap_or_default()
    }

    fn ensure_connected(&self) -> Result<(), BrokerError> {
        if self.connected {
            Ok(())
        } else {
            Err(BrokerError::NotConnected)
        }
    }
}

impl Broker for MockBroker {
    fn connect(&mut self) -> Result<(), BrokerError> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), BrokerError> {
        self.connected = false;
        Ok(())
    }

    fn holdings(&self) -> Result<Vec<Holding>, BrokerError> {
        self.ensure_connected()?;
        Ok(self.holdings.clone())
    }

    fn account(&self) -> Result<Account, BrokerError> {
        self.ensure_connected()?;
        let gross: i64 = self.holdings.iter().map(|h| h.equity_cents).sum();
        Ok(Account {
            equity_cents: gross + self.cash_cents,
            cash_cents: self.cash_cents,
            gross_position_value_cents: gross,
        })
    }

    fn submit_order(&self, order: &BrokerOrder) -> Result<OrderId, BrokerError> {
        self.ensure_connected()?;

        let mut orders = self
            .submitted_orders
            .lock()
            .map_err(|_| BrokerError::Other("mock: order log poisoned".into()))?;
        let id = OrderId(orders.len() as u64 + 1);
        orders.push(RecordedOrder {
            id,
            security: order.security.clone(),
            quantity: order.quantity,
            order_type: order.order_type,
        });

        match &self.fill_mode {
            FillMode::Reject => Err(BrokerError::Order("mock: order rejected".into())),
            _ => Ok(id),
        }
    }

    fn order_status(&self, id: OrderId) -> Result<BrokerOrderStatus, BrokerError> {
        self.ensure_connected()?;

        let recorded = self
            .submitted_orders()
            .into_iter()
            .find(|o| o.id == id)
            .ok_or(BrokerError::UnknownOrder(id.0))?;
        let price = self
            .quotes
            .get(&recorded.security)
            .map(|q| q.last_cents)
            .unwrap_or(0);
        let quantity = recorded.quantity;

        let (status, filled) = match &self.fill_mode {
            FillMode::ImmediateFull => (OrderState::Filled, quantity),
            FillMode::ImmediatePartial(frac) => {
                let filled = (quantity as f64 * frac) as u64;
                (OrderState::PartiallyFilled, filled)
            }
            FillMode::Reject => (OrderState::Rejected, 0),
        };

        Ok(BrokerOrderStatus {
            id,
            status,
            filled_quantity: filled,
            remaining_quantity: quantity - filled,
            avg_fill_price_cents: if filled > 0 { price } else { 0 },
        })
    }

    fn quote(&self, security: &SecurityId) -> Result<Quote, BrokerError> {
        self.ensure_connected()?;
        self.quotes
            .get(security)
            .cloned()
            .ok_or_else(|| BrokerError::UnknownSecurity(security.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::inconsistent_digit_grouping)]
mod tests {
    use super::*;

    fn vti() -> SecurityId {
        SecurityId::new("VTI")
    }

    #[test]
    fn builder_basic() {
        let mut broker = MockBroker::builder()
            .with_holding(vti(), 4, 250_00)
            .with_cash(500_00)
            .with_quote(vti(), 249_50, 250_50)
            .build();

        broker.connect().unwrap();

        let holdings = broker.holdings().unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].security, vti());
        assert_eq!(holdings[0].quantity, 4);
        assert_eq!(holdings[0].equity_cents, 1000_00);

        let account = broker.account().unwrap();
        assert_eq!(account.cash_cents, 500_00);
        assert_eq!(account.equity_cents, 1500_00);

        let quote = broker.quote(&vti()).unwrap();
        assert_eq!(quote.bid_cents, 249_50);
        assert_eq!(quote.ask_cents, 250_50);
    }

    #[test]
    fn holding_implies_quote() {
        let mut broker = MockBroker::builder().with_holding(vti(), 1, 250_00).build();
        broker.connect().unwrap();
        assert_eq!(broker.quote(&vti()).unwrap().last_cents, 250_00);
        assert!(matches!(
            broker.quote(&SecurityId::new("BND")),
            Err(BrokerError::UnknownSecurity(_))
        ));
    }

    #[test]
    fn not_connected_errors() {
        let broker = MockBroker::builder().build();
        assert!(matches!(broker.holdings(), Err(BrokerError::NotConnected)));
        assert!(broker.account().is_err());
    }

    #[test]
    fn submit_records_orders() {
        let mut broker = MockBroker::builder().build();
        broker.connect().unwrap();

        let first = broker
            .submit_order(&BrokerOrder::market_buy(vti(), 3))
            .unwrap();
        let second = broker
            .submit_order(&BrokerOrder::market_buy(SecurityId::new("BND"), 6))
            .unwrap();
        assert_eq!(first, OrderId(1));
        assert_eq!(second, OrderId(2));

        let recorded = broker.submitted_orders();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].security, vti());
        assert_eq!(recorded[0].quantity, 3);
        assert_eq!(recorded[1].order_type, BrokerOrderType::Market);
    }

    #[test]
    fn reject_mode() {
        let mut broker = MockBroker::builder()
            .fill_mode(FillMode::Reject)
            .build();
        broker.connect().unwrap();

        assert!(broker
            .submit_order(&BrokerOrder::market_buy(vti(), 1))
            .is_err());
        // still recorded
        assert_eq!(broker.submitted_orders().len(), 1);
    }

    #[test]
    fn full_fill_status() {
        let mut broker = MockBroker::builder().with_holding(vti(), 0, 250_00).build();
        broker.connect().unwrap();

        let id = broker.submit_order(&BrokerOrder::market_buy(vti(), 4)).unwrap();
        let status = broker.order_status(id).unwrap();
        assert_eq!(status.status, OrderState::Filled);
        assert_eq!(status.filled_quantity, 4);
        assert_eq!(status.remaining_quantity, 0);
        assert_eq!(status.avg_fill_price_cents, 250_00);
    }

    #[test]
    fn partial_fill_status() {
        let mut broker = MockBroker::builder()
            .fill_mode(FillMode::ImmediatePartial(0.5))
            .build();
        broker.connect().unwrap();

        let id = broker.submit_order(&BrokerOrder::market_buy(vti(), 10)).unwrap();
        let status = broker.order_status(id).unwrap();
        assert_eq!(status.status, OrderState::PartiallyFilled);
        assert_eq!(status.filled_quantity, 5);
        assert_eq!(status.remaining_quantity, 5);
    }

    #[test]
    fn unknown_order_status() {
        let mut broker = MockBroker::builder().build();
        broker.connect().unwrap();
        assert!(matches!(
            broker.order_status(OrderId(9)),
            Err(BrokerError::UnknownOrder(9))
        ));
    }
}
