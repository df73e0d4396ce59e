//! The portfolio: asset classes, the deviation-based deposit split, and
//! deposit planning and execution.
//!
//! # Example
//!
//! ```
//! use hanna::{AssetClass, Portfolio, Security};
//!
//! let mut stocks = AssetClass::new("Stocks", 0.6);
//! stocks.add_security(Security::new("VTI").with_price(10.0)).unwrap();
//! let mut bonds = AssetClass::new("Bonds", 0.4);
//! bonds.add_security(Security::new("BND").with_price(7.0)).unwrap();
//!
//! let mut portfolio = Portfolio::new();
//! portfolio.add_asset_class(stocks).unwrap();
//! portfolio.add_asset_class(bonds).unwrap();
//!
//! let deposit = portfolio.plan_deposit(100.0);
//! assert_eq!(deposit.total(), 95.0); // 6 x $10 + 5 x $7
//!
//! portfolio.make_deposit(&deposit).unwrap();
//! assert_eq!(portfolio.value(), 95.0);
//! ```
//!
//! Planning borrows the portfolio immutably; refresh and execution borrow it
//! mutably. A portfolio has a single writer and is not meant to be shared
//! across threads while it is being refreshed or deposited into.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use crate::asset_class::AssetClass;
use crate::deposit::Deposit;
use crate::error::{Error, Result};
use crate::purchase::Purchase;
use crate::types::SecurityId;

/// One externally reported position, as handed over by a brokerage refresh.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HoldingSnapshot {
    pub id: SecurityId,
    pub name: String,
    pub price: f64,
    pub quantity: u64,
    /// Current market value of the position.
    pub equity: f64,
}

/// Outcome of [`Portfolio::update`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RefreshReport {
    /// Securities whose market data and position were refreshed.
    pub updated: Vec<SecurityId>,
    /// Holdings of securities that no asset class tracks. They do not count
    /// toward the portfolio value.
    pub untracked: Vec<HoldingSnapshot>,
    /// Tracked holdings absent from the snapshot, now closed.
    pub closed: Vec<SecurityId>,
}

/// Per-asset-class share of a deposit, most underweight class first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetClassBudgets {
    budgets: Vec<(String, f64)>,
    unallocated: f64,
}

impl AssetClassBudgets {
    /// `(asset class, budget)` in ascending deviation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.budgets.iter().map(|(name, b)| (name.as_str(), *b))
    }

    pub fn get(&self, asset_class: &str) -> Option<f64> {
        self.iter()
            .find(|(name, _)| *name == asset_class)
            .map(|(_, b)| b)
    }

    /// Sum of all budgets.
    pub fn total(&self) -> f64 {
        self.budgets.iter().map(|(_, b)| b).sum()
    }

    /// Deposit left after every underweight class was funded.
    #[inline]
    pub fn unallocated(&self) -> f64 {
        self.unallocated
    }

    pub fn len(&self) -> usize {
        self.budgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.budgets.is_empty()
    }
}

/// Asset classes keyed by name, plus an index from security to asset class.
///
/// The portfolio value is the sum of the asset class values. Only the asset
/// classes are serialized; deserializing re-adds them one by one, so the
/// index is rebuilt and the uniqueness rules of
/// [`Portfolio::add_asset_class`] apply to the payload.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PortfolioData"))]
pub struct Portfolio {
    asset_classes: BTreeMap<String, AssetClass>,
    #[cfg_attr(feature = "serde", serde(skip))]
    security_index: FxHashMap<SecurityId, String>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct PortfolioData {
    asset_classes: BTreeMap<String, AssetClass>,
}

#[cfg(feature = "serde")]
impl TryFrom<PortfolioData> for Portfolio {
    type Error = Error;

    fn try_from(data: PortfolioData) -> Result<Self> {
        let mut portfolio = Portfolio::new();
        for asset_class in data.asset_classes.into_values() {
            portfolio.add_asset_class(asset_class)?;
        }
        Ok(portfolio)
    }
}

/// `current value - portfolio_value * target`; negative means underweight.
fn target_deviation(asset_class: &AssetClass, portfolio_value: f64) -> f64 {
    asset_class.value() - portfolio_value * asset_class.target_percentage()
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset class. Names must be unique, and a security may belong to
    /// only one asset class.
    pub fn add_asset_class(&mut self, asset_class: AssetClass) -> Result<()> {
        let name = asset_class.name().to_string();
        if self.asset_classes.contains_key(&name) {
            return Err(Error::DuplicateAssetClass(name));
        }
        if let Some(dup) = asset_class
            .securities()
            .find(|s| self.security_index.contains_key(s.id()))
        {
            return Err(Error::DuplicateSecurity {
                security: dup.id().clone(),
                asset_class: name,
            });
        }

        for security in asset_class.securities() {
            self.security_index
                .insert(security.id().clone(), name.clone());
        }
        self.asset_classes.insert(name, asset_class);
        Ok(())
    }

    /// Asset classes in name order.
    pub fn asset_classes(&self) -> impl Iterator<Item = &AssetClass> {
        self.asset_classes.values()
    }

    pub fn asset_class(&self, name: &str) -> Result<&AssetClass> {
        self.asset_classes
            .get(name)
            .ok_or_else(|| Error::UnknownAssetClass(name.to_string()))
    }

    fn asset_class_mut(&mut self, name: &str) -> Result<&mut AssetClass> {
        self.asset_classes
            .get_mut(name)
            .ok_or_else(|| Error::UnknownAssetClass(name.to_string()))
    }

    /// Total value across asset classes.
    pub fn value(&self) -> f64 {
        self.asset_classes.values().map(AssetClass::value).sum()
    }

    /// Fraction of the portfolio held in the asset class (zero for an empty
    /// portfolio).
    pub fn asset_class_percentage(&self, name: &str) -> Result<f64> {
        let ac = self.asset_class(name)?;
        let total = self.value();
        Ok(if total > 0.0 { ac.value() / total } else { 0.0 })
    }

    /// Amount that should be invested in the asset class at its target.
    pub fn asset_class_target_value(&self, name: &str) -> Result<f64> {
        let ac = self.asset_class(name)?;
        Ok(self.value() * ac.target_percentage())
    }

    /// Current value minus target value; negative means underweight.
    pub fn asset_class_target_deviation(&self, name: &str) -> Result<f64> {
        let ac = self.asset_class(name)?;
        Ok(target_deviation(ac, self.value()))
    }

    pub fn contains_security(&self, id: &SecurityId) -> bool {
        self.security_index.contains_key(id)
    }

    /// The asset class a security is registered in.
    pub fn asset_class_for_security(&self, id: &SecurityId) -> Result<&AssetClass> {
        let name = self
            .security_index
            .get(id)
            .ok_or_else(|| Error::SecurityNotInPortfolio(id.clone()))?;
        self.asset_class(name)
    }

    /// Fraction of the portfolio held in one security (zero when it is not
    /// held or the portfolio is empty).
    pub fn security_percentage(&self, id: &SecurityId) -> Result<f64> {
        let ac = self.asset_class_for_security(id)?;
        let held = ac.holding(id).map(|h| h.value()).unwrap_or(0.0);
        let total = self.value();
        Ok(if total > 0.0 { held / total } else { 0.0 })
    }

    /// Split `deposit` across asset classes, most underweight first.
    ///
    /// Deviations are measured against the portfolio value as if the deposit
    /// had already landed. Each class receives `min(remaining, max(0, -deviation))`
    /// in ascending deviation order (ties in name order). Whatever is left after
    /// all classes is reported as [`AssetClassBudgets::unallocated`]; it is only
    /// non-zero when target percentages sum to less than one.
    pub fn asset_class_budgets(&self, deposit: f64) -> AssetClassBudgets {
        let post_deposit_value = self.value() + deposit;

        let mut deviations: Vec<(&str, f64)> = self
            .asset_classes
            .values()
            .map(|ac| (ac.name(), target_deviation(ac, post_deposit_value)))
            .collect();
        // stable: equal deviations keep name order
        deviations.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut remaining = deposit.max(0.0);
        let mut budgets = Vec::with_capacity(deviations.len());
        for (name, deviation) in deviations {
            let budget = (-deviation).max(0.0).min(remaining);
            remaining -= budget;
            budgets.push((name.to_string(), budget));
        }

        AssetClassBudgets {
            budgets,
            unallocated: remaining,
        }
    }

    /// Plan whole-share purchases for a deposit of `amount`.
    ///
    /// Asset classes are planned in budget order. Whatever one class cannot
    /// spend rolls over into the next class's budget; the rollover left after
    /// the last class is recorded on the deposit along with the unallocated
    /// remainder of the split. The portfolio is not modified.
    pub fn plan_deposit(&self, amount: f64) -> Deposit {
        let budgets = self.asset_class_budgets(amount);
        let mut deposit = Deposit::new(amount);
        let mut rollover = 0.0;

        for (name, budget) in budgets.iter() {
            let Some(ac) = self.asset_classes.get(name) else {
                continue;
            };
            let budget = budget + rollover;
            let purchases = ac.plan_purchases(budget);
            let spent: f64 = purchases.values().map(Purchase::cost).sum();
            for purchase in purchases.into_values() {
                deposit.add_purchase(name, purchase);
            }
            rollover = budget - spent;
        }

        deposit.set_unallocated(budgets.unallocated());
        deposit.set_rollover(rollover);
        deposit
    }

    /// Apply every purchase in a planned deposit.
    ///
    /// The whole deposit is validated before anything is applied, so a deposit
    /// naming an unknown asset class or security changes nothing. Applying the
    /// same deposit twice buys twice.
    pub fn make_deposit(&mut self, deposit: &Deposit) -> Result<()> {
        for (name, purchases) in deposit.purchases() {
            let ac = self.asset_class(name)?;
            for purchase in purchases {
                ac.security(purchase.security_id())?;
            }
        }

        for (name, purchases) in deposit.purchases() {
            let ac = self.asset_class_mut(name)?;
            for purchase in purchases {
                ac.buy(purchase)?;
            }
        }
        Ok(())
    }

    /// Fold a complete brokerage snapshot into the portfolio.
    ///
    /// Tracked securities get their name and price refreshed and their
    /// holding set to the reported quantity and equity. Tracked holdings the
    /// snapshot no longer lists are closed. Holdings of unknown securities are
    /// returned as untracked.
    pub fn update(&mut self, snapshot: &[HoldingSnapshot]) -> Result<RefreshReport> {
        let mut report = RefreshReport::default();
        let mut reported = BTreeSet::new();

        for holding in snapshot {
            let Some(name) = self.security_index.get(&holding.id).cloned() else {
                report.untracked.push(holding.clone());
                continue;
            };
            let ac = self.asset_class_mut(&name)?;
            ac.update_security(&holding.id, &holding.name, holding.price)?;
            ac.update_holding(&holding.id, holding.quantity, holding.equity)?;
            reported.insert(holding.id.clone());
            report.updated.push(holding.id.clone());
        }

        let mut stale = Vec::new();
        for ac in self.asset_classes.values() {
            for holding in ac.holdings() {
                if !reported.contains(holding.security_id()) {
                    stale.push((ac.name().to_string(), holding.security_id().clone()));
                }
            }
        }
        for (name, id) in stale {
            self.asset_class_mut(&name)?.update_holding(&id, 0, 0.0)?;
            report.closed.push(id);
        }

        Ok(report)
    }
}
