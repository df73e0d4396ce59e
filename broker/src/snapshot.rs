//! Paper-trading broker backed by a JSON account snapshot.
//!
//! The snapshot lists cash, held positions and quotes for securities that are
//! not held yet:
//!
//! ```json
//! {
//!   "cash": 500.0,
//!   "holdings": [
//!     { "id": "VTI", "name": "Vanguard Total Stock Market ETF", "price": 250.0, "quantity": 4 }
//!   ],
//!   "quotes": { "BND": 72.0 }
//! }
//! ```
//!
//! Market buys fill immediately at the quoted price and debit cash. Call
//! [`SnapshotBroker::save`] to write the resulting account back to disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use hanna::{Cents, SecurityId};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::Broker;
use crate::error::BrokerError;
use crate::types::*;

/// On-disk layout of a snapshot file. Amounts are dollars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub cash: f64,
    #[serde(default)]
    pub holdings: Vec<SnapshotHolding>,
    /// Last prices for securities without a position.
    #[serde(default)]
    pub quotes: BTreeMap<SecurityId, f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotHolding {
    pub id: SecurityId,
    #[serde(default)]
    pub name: Option<String>,
    pub price: f64,
    pub quantity: u64,
    /// Market value; defaults to `price * quantity`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equity: Option<f64>,
}

impl SnapshotFile {
    pub fn load(path: &Path) -> Result<Self, BrokerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BrokerError::Snapshot(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, BrokerError> {
        let file: SnapshotFile = serde_json::from_str(content)
            .map_err(|e| BrokerError::Snapshot(format!("failed to parse snapshot: {e}")))?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<(), BrokerError> {
        if !self.cash.is_finite() || self.cash < 0.0 {
            return Err(BrokerError::Snapshot(format!(
                "cash must be non-negative, got {}",
                self.cash
            )));
        }
        let mut seen = std::collections::BTreeSet::new();
        for h in &self.holdings {
            if !seen.insert(&h.id) {
                return Err(BrokerError::Snapshot(format!("duplicate holding '{}'", h.id)));
            }
            if !h.price.is_finite() || h.price < 0.0 {
                return Err(BrokerError::Snapshot(format!(
                    "holding '{}' has invalid price {}",
                    h.id, h.price
                )));
            }
        }
        for (id, price) in &self.quotes {
            if !price.is_finite() || *price < 0.0 {
                return Err(BrokerError::Snapshot(format!(
                    "quote '{id}' has invalid price {price}"
                )));
            }
        }
        Ok(())
    }
}

/// Mutable account state in cents.
#[derive(Debug, Default)]
struct Ledger {
    cash_cents: i64,
    /// Held positions in snapshot order.
    holdings: Vec<Holding>,
    quotes: BTreeMap<SecurityId, i64>,
    fills: Vec<BrokerOrderStatus>,
}

impl Ledger {
    fn from_file(file: SnapshotFile) -> Self {
        let mut quotes: BTreeMap<SecurityId, i64> = file
            .quotes
            .into_iter()
            .map(|(id, price)| (id, Cents::from_dollars(price).0))
            .collect();

        let holdings = file
            .holdings
            .into_iter()
            .map(|h| {
                let price_cents = Cents::from_dollars(h.price).0;
                quotes.insert(h.id.clone(), price_cents);
                let equity_cents = match h.equity {
                    Some(equity) => Cents::from_dollars(equity).0,
                    None => price_cents * h.quantity as i64,
                };
                Holding {
                    name: h.name.unwrap_or_else(|| h.id.to_string()),
                    security: h.id,
                    quantity: h.quantity,
                    price_cents,
                    equity_cents,
                }
            })
            .collect();

        Self {
            cash_cents: Cents::from_dollars(file.cash).0,
            holdings,
            quotes,
            fills: Vec::new(),
        }
    }

    fn to_file(&self) -> SnapshotFile {
        let held: Vec<&SecurityId> = self.holdings.iter().map(|h| &h.security).collect();
        SnapshotFile {
            cash: Cents(self.cash_cents).to_dollars(),
            holdings: self
                .holdings
                .iter()
                .map(|h| SnapshotHolding {
                    id: h.security.clone(),
                    name: Some(h.name.clone()),
                    price: Cents(h.price_cents).to_dollars(),
                    quantity: h.quantity,
                    equity: Some(Cents(h.equity_cents).to_dollars()),
                })
                .collect(),
            quotes: self
                .quotes
                .iter()
                .filter(|(id, _)| !held.contains(id))
                .map(|(id, &cents)| (id.clone(), Cents(cents).to_dollars()))
                .collect(),
        }
    }

    fn fill(&mut self, order: &BrokerOrder) -> Result<OrderId, BrokerError> {
        let price = match order.order_type {
            BrokerOrderType::Market => *self
                .quotes
                .get(&order.security)
                .ok_or_else(|| BrokerError::UnknownSecurity(order.security.to_string()))?,
            BrokerOrderType::Limit(limit) => limit.0,
        };
        if price <= 0 {
            return Err(BrokerError::Order(format!(
                "{} has no tradable price",
                order.security
            )));
        }
        let cost = price * order.quantity as i64;
        if cost > self.cash_cents {
            return Err(BrokerError::Order(format!(
                "insufficient cash for {} x {}: need {}, have {}",
                order.quantity,
                order.security,
                Cents(cost),
                Cents(self.cash_cents)
            )));
        }

        self.cash_cents -= cost;
        match self.holdings.iter_mut().find(|h| h.security == order.security) {
            Some(h) => {
                h.quantity += order.quantity;
                h.price_cents = price;
                h.equity_cents = price * h.quantity as i64;
            }
            None => self.holdings.push(Holding {
                security: order.security.clone(),
                name: order.security.to_string(),
                quantity: order.quantity,
                price_cents: price,
                equity_cents: cost,
            }),
        }

        let id = OrderId(self.fills.len() as u64 + 1);
        self.fills.push(BrokerOrderStatus {
            id,
            status: OrderState::Filled,
            filled_quantity: order.quantity,
            remaining_quantity: 0,
            avg_fill_price_cents: price,
        });
        debug!(
            "Filled order {}: {} x {} @ {}",
            id.0,
            order.quantity,
            order.security,
            Cents(price)
        );
        Ok(id)
    }
}

/// Broker that reads and paper-trades a JSON account snapshot.
pub struct SnapshotBroker {
    path: PathBuf,
    ledger: Mutex<Option<Ledger>>,
}

impl SnapshotBroker {
    /// Create a broker for the snapshot at `path`. Nothing is read until
    /// [`Broker::connect`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ledger: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current account (including fills) back to the snapshot file.
    pub fn save(&self) -> Result<(), BrokerError> {
        let guard = self.lock()?;
        let account = guard.as_ref().ok_or(BrokerError::NotConnected)?;
        let json = serde_json::to_string_pretty(&account.to_file())
            .map_err(|e| BrokerError::Snapshot(format!("failed to serialize snapshot: {e}")))?;
        std::fs::write(&self.path, json).map_err(|e| {
            BrokerError::Snapshot(format!("failed to write {}: {e}", self.path.display()))
        })?;
        info!("Saved snapshot to {}", self.path.display());
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Ledger>>, BrokerError> {
        self.ledger
            .lock()
            .map_err(|_| BrokerError::Other("snapshot account lock poisoned".into()))
    }

    fn with_account<T>(
        &self,
        f: impl FnOnce(&mut Ledger) -> Result<T, BrokerError>,
    ) -> Result<T, BrokerError> {
        let mut guard = self.lock()?;
        let account = guard.as_mut().ok_or(BrokerError::NotConnected)?;
        f(account)
    }
}

impl Broker for SnapshotBroker {
    fn connect(&mut self) -> Result<(), BrokerError> {
        info!("Loading account snapshot from {}", self.path.display());
        let file = SnapshotFile::load(&self.path)
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        let account = Ledger::from_file(file);
        info!(
            "Snapshot loaded: {} holdings, cash {}",
            account.holdings.len(),
            Cents(account.cash_cents)
        );
        *self.lock()? = Some(account);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), BrokerError> {
        *self.lock()? = None;
        Ok(())
    }

    fn holdings(&self) -> Result<Vec<Holding>, BrokerError> {
        self.with_account(|a| Ok(a.holdings.clone()))
    }

    fn account(&self) -> Result<Account, BrokerError> {
        self.with_account(|a| {
            let gross: i64 = a.holdings.iter().map(|h| h.equity_cents).sum();
            Ok(Account {
                equity_cents: gross + a.cash_cents,
                cash_cents: a.cash_cents,
                gross_position_value_cents: gross,
            })
        })
    }

    fn submit_order(&self, order: &BrokerOrder) -> Result<OrderId, BrokerError> {
        if order.quantity == 0 {
            return Err(BrokerError::Order(format!(
                "zero-share order for {}",
                order.security
            )));
        }
        self.with_account(|a| a.fill(order))
    }

    fn order_status(&self, id: OrderId) -> Result<BrokerOrderStatus, BrokerError> {
        self.with_account(|a| {
            a.fills
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .ok_or(BrokerError::UnknownOrder(id.0))
        })
    }

    fn quote(&self, security: &SecurityId) -> Result<Quote, BrokerError> {
        self.with_account(|a| {
            let last = *a
                .quotes
                .get(security)
                .ok_or_else(|| BrokerError::UnknownSecurity(security.to_string()))?;
            Ok(Quote {
                security: security.clone(),
                bid_cents: last,
                ask_cents: last,
                last_cents: last,
            })
        })
    }
}
