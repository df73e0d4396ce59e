//! Glue between a `Broker` and a hanna `Portfolio`.

use hanna::{Cents, HoldingSnapshot, Portfolio, RefreshReport};
use hanna_broker::snapshot::SnapshotBroker;
use hanna_broker::{Account, Broker, BrokerError};
use log::{info, warn};
use rustc_hash::FxHashSet;

use crate::config::Config;
use crate::error::Result;

/// Broker state after a refresh.
#[derive(Debug, Clone)]
pub struct Refresh {
    /// Everything folded into the portfolio: held positions plus quotes for
    /// configured securities that are not held.
    pub snapshot: Vec<HoldingSnapshot>,
    pub report: RefreshReport,
    pub account: Account,
}

impl Refresh {
    pub fn cash(&self) -> f64 {
        Cents(self.account.cash_cents).to_dollars()
    }
}

/// Open the paper broker configured in `[broker]`.
pub fn connect_snapshot(config: &Config) -> Result<SnapshotBroker> {
    let mut broker = SnapshotBroker::new(&config.broker.snapshot);
    broker.connect()?;
    Ok(broker)
}

/// Pull holdings, quotes and cash from the broker into `portfolio`.
///
/// Configured securities without a position are priced from quotes so they
/// can be bought. A security the broker cannot quote stays unpriced and is
/// skipped by the planner.
pub fn refresh(portfolio: &mut Portfolio, broker: &dyn Broker) -> Result<Refresh> {
    let mut snapshot: Vec<HoldingSnapshot> =
        broker.holdings()?.iter().map(|h| h.to_snapshot()).collect();
    let held: FxHashSet<_> = snapshot.iter().map(|h| h.id.clone()).collect();

    let mut quoted = Vec::new();
    for ac in portfolio.asset_classes() {
        for security in ac.securities() {
            if held.contains(security.id()) {
                continue;
            }
            match broker.quote(security.id()) {
                Ok(quote) => quoted.push(HoldingSnapshot {
                    id: security.id().clone(),
                    name: security.name().to_string(),
                    price: Cents(quote.last_cents).to_dollars(),
                    quantity: 0,
                    equity: 0.0,
                }),
                Err(BrokerError::UnknownSecurity(id)) => {
                    warn!("No quote for {id}; it will not be bought this run");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    snapshot.extend(quoted);

    let report = portfolio.update(&snapshot)?;
    for h in &report.untracked {
        warn!(
            "Holding {} ({}) is not in any asset class and is ignored",
            h.id, h.name
        );
    }
    for id in &report.closed {
        info!("Position in {id} is no longer reported; closed");
    }

    let account = broker.account()?;
    info!(
        "Refreshed {} securities, portfolio value ${:.2}, cash {}",
        report.updated.len(),
        portfolio.value(),
        Cents(account.cash_cents)
    );

    Ok(Refresh {
        snapshot,
        report,
        account,
    })
}
