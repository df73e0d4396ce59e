//! Shared broker types: holdings, accounts, orders, quotes.

use hanna::{Cents, HoldingSnapshot, SecurityId};

/// Broker-level holding (the real-world counterpart of `hanna::Holding`).
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub security: SecurityId,
    /// Display name reported by the broker.
    pub name: String,
    pub quantity: u64,
    pub price_cents: i64,
    pub equity_cents: i64,
}

impl Holding {
    /// Dollar-denominated view used to refresh a `hanna::Portfolio`.
    pub fn to_snapshot(&self) -> HoldingSnapshot {
        HoldingSnapshot {
            id: self.security.clone(),
            name: self.name.clone(),
            price: Cents(self.price_cents).to_dollars(),
            quantity: self.quantity,
            equity: Cents(self.equity_cents).to_dollars(),
        }
    }
}

/// Account summary from the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub equity_cents: i64,
    pub cash_cents: i64,
    pub gross_position_value_cents: i64,
}

/// Order to submit to a broker.
///
/// Deposits only ever buy, so there is no side: every order is a buy of
/// whole shares.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerOrder {
    pub security: SecurityId,
    pub quantity: u64,
    pub order_type: BrokerOrderType,
}

impl BrokerOrder {
    /// Market buy of `quantity` whole shares.
    pub fn market_buy(security: SecurityId, quantity: u64) -> Self {
        Self {
            security,
            quantity,
            order_type: BrokerOrderType::Market,
        }
    }
}

/// Market or limit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerOrderType {
    Market,
    Limit(Cents),
}

/// Live quote from the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub security: SecurityId,
    pub bid_cents: i64,
    pub ask_cents: i64,
    pub last_cents: i64,
}

/// Opaque order ID returned by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderId(pub u64);

/// Status of a submitted order.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerOrderStatus {
    pub id: OrderId,
    pub status: OrderState,
    pub filled_quantity: u64,
    pub remaining_quantity: u64,
    pub avg_fill_price_cents: i64,
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Pending,
    Submitted,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

#[cfg(test)]
#[allow(clippy::inconsistent_digit_grouping)]
mod tests {
    use super::*;

    #[test]
    fn holding_snapshot_is_in_dollars() {
        let h = Holding {
            security: SecurityId::new("VTI"),
            name: "Vanguard Total Stock Market".into(),
            quantity: 4,
            price_cents: 250_25,
            equity_cents: 1001_00,
        };
        let snap = h.to_snapshot();
        assert_eq!(snap.id, SecurityId::new("VTI"));
        assert_eq!(snap.price, 250.25);
        assert_eq!(snap.equity, 1001.0);
        assert_eq!(snap.quantity, 4);
    }

    #[test]
    fn market_buy() {
        let o = BrokerOrder::market_buy(SecurityId::new("BND"), 6);
        assert_eq!(o.order_type, BrokerOrderType::Market);
        assert_eq!(o.quantity, 6);
    }
}
