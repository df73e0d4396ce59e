//! Planned purchases for one deposit, grouped by asset class.

use std::collections::BTreeMap;

use crate::purchase::Purchase;

/// The output of [`Portfolio::plan_deposit`](crate::Portfolio::plan_deposit)
/// and the input of [`Portfolio::make_deposit`](crate::Portfolio::make_deposit).
///
/// Besides the purchases it records what could not be placed: `unallocated` is
/// the part of the amount the budget split gave to no asset class, `rollover`
/// is the budget left over after the last asset class was planned.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Deposit {
    amount: f64,
    purchases: BTreeMap<String, Vec<Purchase>>,
    unallocated: f64,
    rollover: f64,
}

impl Deposit {
    /// An empty deposit of `amount`.
    pub fn new(amount: f64) -> Self {
        Self {
            amount,
            ..Self::default()
        }
    }

    /// Append a purchase to the given asset class's list.
    pub fn add_purchase(&mut self, asset_class: impl Into<String>, purchase: Purchase) {
        self.purchases
            .entry(asset_class.into())
            .or_default()
            .push(purchase);
    }

    #[inline]
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Iterate `(asset class, purchases)` in asset-class name order.
    pub fn purchases(&self) -> impl Iterator<Item = (&str, &[Purchase])> {
        self.purchases
            .iter()
            .map(|(name, list)| (name.as_str(), list.as_slice()))
    }

    /// Purchases planned for one asset class (empty if none).
    pub fn purchases_for_asset_class(&self, asset_class: &str) -> &[Purchase] {
        self.purchases
            .get(asset_class)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn involves_asset_class(&self, asset_class: &str) -> bool {
        self.purchases.contains_key(asset_class)
    }

    /// Total cost of the purchases planned for one asset class.
    pub fn asset_class_expenditures(&self, asset_class: &str) -> f64 {
        self.purchases_for_asset_class(asset_class)
            .iter()
            .map(Purchase::cost)
            .sum()
    }

    /// Total cost across all asset classes.
    pub fn total(&self) -> f64 {
        self.purchases.values().flatten().map(Purchase::cost).sum()
    }

    /// Total number of shares across all purchases.
    pub fn num_shares(&self) -> u64 {
        self.purchases
            .values()
            .flatten()
            .map(Purchase::num_shares)
            .sum()
    }

    /// Number of individual purchases (one order each).
    pub fn num_purchases(&self) -> usize {
        self.purchases.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_purchases() == 0
    }

    /// Deposit amount the budget split could not assign to any asset class.
    #[inline]
    pub fn unallocated(&self) -> f64 {
        self.unallocated
    }

    /// Budget left after planning the last asset class.
    #[inline]
    pub fn rollover(&self) -> f64 {
        self.rollover
    }

    /// Amount left uninvested: `amount - total`, never below zero.
    pub fn unspent(&self) -> f64 {
        (self.amount - self.total()).max(0.0)
    }

    pub(crate) fn set_unallocated(&mut self, unallocated: f64) {
        self.unallocated = unallocated;
    }

    pub(crate) fn set_rollover(&mut self, rollover: f64) {
        self.rollover = rollover;
    }
}
