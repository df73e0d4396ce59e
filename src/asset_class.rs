//! Asset classes: target-weighted buckets of securities, and the whole-share
//! purchase planner.
//!
//! The planner solves an unbounded knapsack over integer cents: given a budget
//! and a set of share prices, pick share counts (any number of each) that spend
//! as much of the budget as possible without exceeding it.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::holding::Holding;
use crate::purchase::Purchase;
use crate::security::Security;
use crate::types::{Cents, SecurityId};

/// A named allocation bucket with a target share of the portfolio.
///
/// Securities are registered first; holdings may only exist for registered
/// securities, and at most one per security. `value` is the sum of holding
/// values and is maintained incrementally.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetClass {
    name: String,
    target_percentage: f64,
    securities: BTreeMap<SecurityId, Security>,
    holdings: BTreeMap<SecurityId, Holding>,
    value: f64,
}

impl AssetClass {
    /// `target_percentage` is a fraction in `[0, 1]`.
    pub fn new(name: impl Into<String>, target_percentage: f64) -> Self {
        Self {
            name: name.into(),
            target_percentage,
            securities: BTreeMap::new(),
            holdings: BTreeMap::new(),
            value: 0.0,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn target_percentage(&self) -> f64 {
        self.target_percentage
    }

    /// Aggregate market value of all holdings.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Registered securities, in id order.
    pub fn securities(&self) -> impl Iterator<Item = &Security> {
        self.securities.values()
    }

    /// Current holdings, in security id order.
    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values()
    }

    pub fn contains_security(&self, id: &SecurityId) -> bool {
        self.securities.contains_key(id)
    }

    pub fn contains_holding(&self, id: &SecurityId) -> bool {
        self.holdings.contains_key(id)
    }

    pub fn security(&self, id: &SecurityId) -> Result<&Security> {
        self.securities
            .get(id)
            .ok_or_else(|| self.unknown_security(id))
    }

    pub fn holding(&self, id: &SecurityId) -> Result<&Holding> {
        self.holdings.get(id).ok_or_else(|| Error::UnknownHolding {
            security: id.clone(),
            asset_class: self.name.clone(),
        })
    }

    /// Register a security as eligible for this asset class.
    pub fn add_security(&mut self, security: Security) -> Result<()> {
        if self.contains_security(security.id()) {
            return Err(Error::DuplicateSecurity {
                security: security.id().clone(),
                asset_class: self.name.clone(),
            });
        }
        self.securities.insert(security.id().clone(), security);
        Ok(())
    }

    /// Add a holding of an already registered security.
    pub fn add_holding(&mut self, holding: Holding) -> Result<()> {
        let id = holding.security_id();
        if !self.contains_security(id) {
            return Err(Error::MissingSecurity {
                security: id.clone(),
                asset_class: self.name.clone(),
            });
        }
        if self.contains_holding(id) {
            return Err(Error::DuplicateHolding {
                security: id.clone(),
                asset_class: self.name.clone(),
            });
        }
        self.value += holding.value();
        self.holdings.insert(id.clone(), holding);
        Ok(())
    }

    /// Refresh a security's display name and price.
    pub fn update_security(&mut self, id: &SecurityId, name: &str, price: f64) -> Result<()> {
        let security = self
            .securities
            .get_mut(id)
            .ok_or_else(|| Error::UnknownSecurity {
                security: id.clone(),
                asset_class: self.name.clone(),
            })?;
        security.set_name(name);
        security.set_price(price);
        Ok(())
    }

    /// Refresh the position in a security.
    ///
    /// Creates the holding if the security is registered but not yet held,
    /// and drops it when `num_shares` is zero. The aggregate value moves by
    /// the difference between the old and new holding value.
    pub fn update_holding(&mut self, id: &SecurityId, num_shares: u64, value: f64) -> Result<()> {
        if !self.contains_security(id) {
            return Err(self.unknown_security(id));
        }

        if num_shares == 0 {
            if let Some(old) = self.holdings.remove(id) {
                self.value -= old.value();
            }
            return Ok(());
        }

        match self.holdings.get_mut(id) {
            Some(holding) => {
                let old_value = holding.value();
                holding.set_position(num_shares, value)?;
                self.value += value - old_value;
                Ok(())
            }
            None => {
                let holding = Holding::new(self.security(id)?, num_shares, value)?;
                self.add_holding(holding)
            }
        }
    }

    /// Record an executed purchase: accumulate (or open) the holding and add
    /// its cost to the aggregate value.
    pub fn buy(&mut self, purchase: &Purchase) -> Result<()> {
        let id = purchase.security_id();
        if !self.contains_security(id) {
            return Err(self.unknown_security(id));
        }
        if purchase.num_shares() == 0 {
            return Ok(());
        }

        match self.holdings.get_mut(id) {
            Some(holding) => holding.buy(purchase.num_shares(), purchase.price()),
            None => {
                let holding =
                    Holding::new(purchase.security(), purchase.num_shares(), purchase.cost())?;
                self.holdings.insert(id.clone(), holding);
            }
        }
        self.value += purchase.cost();
        Ok(())
    }

    /// Securities the planner may buy: not buy-restricted and priced above
    /// zero, in id order.
    pub fn purchasable_securities(&self) -> impl Iterator<Item = &Security> {
        self.securities.values().filter(|s| s.is_purchasable())
    }

    /// Plan whole-share purchases that spend as much of `budget` as possible
    /// without exceeding it.
    ///
    /// Only purchasable securities are considered. When several combinations
    /// spend the same amount, the reconstruction prefers securities earlier in
    /// id order. Securities with zero planned shares are omitted; a negative
    /// budget plans nothing.
    pub fn plan_purchases(&self, budget: f64) -> BTreeMap<SecurityId, Purchase> {
        let eligible: Vec<(&Security, Cents)> = self
            .purchasable_securities()
            .filter_map(|s| s.price_cents().map(|cents| (s, cents)))
            .collect();
        let prices: Vec<Cents> = eligible.iter().map(|&(_, cents)| cents).collect();
        let shares = plan_whole_shares(&prices, Cents::from_dollars(budget));

        eligible
            .into_iter()
            .zip(shares)
            .filter(|&(_, n)| n > 0)
            .filter_map(|((security, _), n)| {
                // priced by construction of `eligible`
                Purchase::new(security, n)
                    .ok()
                    .map(|p| (security.id().clone(), p))
            })
            .collect()
    }

    fn unknown_security(&self, id: &SecurityId) -> Error {
        Error::UnknownSecurity {
            security: id.clone(),
            asset_class: self.name.clone(),
        }
    }
}

/// Unbounded knapsack over cents: share counts per price that maximize total
/// spend without exceeding `budget`.
///
/// `best[i]` holds the largest spend reachable with a budget of `i` cents.
/// Reconstruction starts at `best[budget]` and repeatedly removes the first
/// price `p` (in slice order) for which `best[spend - p] + p == spend`, so the
/// returned counts spend exactly `best[budget]`. Non-positive prices are never
/// bought. Runs in O(budget × prices) time and O(budget) space.
pub fn plan_whole_shares(prices: &[Cents], budget: Cents) -> Vec<u64> {
    let mut shares = vec![0u64; prices.len()];
    if budget.0 <= 0 {
        return shares;
    }

    let budget = budget.0 as usize;
    let prices: Vec<usize> = prices.iter().map(|p| p.0.max(0) as usize).collect();

    let mut best = vec![0usize; budget + 1];
    for i in 1..=budget {
        for &p in &prices {
            if p > 0 && p <= i {
                let spend = best[i - p] + p;
                if spend > best[i] {
                    best[i] = spend;
                }
            }
        }
    }

    // Invariant: best[spend] == spend, i.e. `spend` is exactly reachable.
    let mut spend = best[budget];
    while spend > 0 {
        let last = prices
            .iter()
            .position(|&p| p > 0 && p <= spend && best[spend - p] + p == spend);
        match last {
            Some(j) => {
                shares[j] += 1;
                spend -= prices[j];
            }
            None => break,
        }
    }

    shares
}
