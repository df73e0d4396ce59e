//! Position tracking for a single security within an asset class.

use crate::error::{Error, Result};
use crate::security::Security;
use crate::types::SecurityId;

/// Shares of one security held in an asset class.
///
/// The holding refers to its security by id; the owning asset class keeps the
/// one `Security` instance that carries the price. `value` is the market value
/// as of the last refresh or purchase.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Holding {
    security: SecurityId,
    num_shares: u64,
    value: f64,
    average_buy_price: f64,
    dividends: f64,
}

impl Holding {
    /// Create a holding of `num_shares` worth `value` in total.
    ///
    /// The cost basis starts at `value / num_shares`; use
    /// [`Holding::with_average_buy_price`] when the real basis is known.
    pub fn new(security: &Security, num_shares: u64, value: f64) -> Result<Self> {
        if num_shares == 0 {
            return Err(Error::InvalidShares(security.id().clone()));
        }
        Ok(Self {
            security: security.id().clone(),
            num_shares,
            value,
            average_buy_price: value / num_shares as f64,
            dividends: 0.0,
        })
    }

    pub fn with_average_buy_price(mut self, average_buy_price: f64) -> Self {
        self.average_buy_price = average_buy_price;
        self
    }

    pub fn with_dividends(mut self, dividends: f64) -> Self {
        self.dividends = dividends;
        self
    }

    #[inline]
    pub fn security_id(&self) -> &SecurityId {
        &self.security
    }

    #[inline]
    pub fn num_shares(&self) -> u64 {
        self.num_shares
    }

    /// Market value recorded at the last refresh or purchase.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn average_buy_price(&self) -> f64 {
        self.average_buy_price
    }

    #[inline]
    pub fn dividends(&self) -> f64 {
        self.dividends
    }

    /// Current market value at the security's latest price.
    pub fn market_value(&self, security: &Security) -> Result<f64> {
        Ok(self.num_shares as f64 * security.require_price()?)
    }

    /// Total cost basis.
    pub fn cost(&self) -> f64 {
        self.average_buy_price * self.num_shares as f64
    }

    /// Fractional return including dividends: `(value - cost + dividends) / cost`.
    pub fn total_return(&self, security: &Security) -> Result<f64> {
        let value = self.market_value(security)?;
        let cost = self.cost();
        Ok((value - cost + self.dividends) / cost)
    }

    /// Record a purchase of `num_shares` at `price`.
    ///
    /// The average buy price is updated volume-weighted.
    pub fn buy(&mut self, num_shares: u64, price: f64) {
        if num_shares == 0 {
            return;
        }
        let total_cost = self.cost() + num_shares as f64 * price;
        self.num_shares += num_shares;
        self.value += num_shares as f64 * price;
        self.average_buy_price = total_cost / self.num_shares as f64;
    }

    /// Overwrite the position with refreshed brokerage data.
    pub(crate) fn set_position(&mut self, num_shares: u64, value: f64) -> Result<()> {
        if num_shares == 0 {
            return Err(Error::InvalidShares(self.security.clone()));
        }
        self.num_shares = num_shares;
        self.value = value;
        Ok(())
    }

    pub fn set_average_buy_price(&mut self, average_buy_price: f64) {
        self.average_buy_price = average_buy_price;
    }

    pub fn set_dividends(&mut self, dividends: f64) {
        self.dividends = dividends;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sec(price: f64) -> Security {
        Security::new("VTI").with_price(price)
    }

    #[test]
    fn new_holding() {
        let h = Holding::new(&sec(10.0), 3, 30.0).unwrap();
        assert_eq!(h.security_id().as_str(), "VTI");
        assert_eq!(h.num_shares(), 3);
        assert_eq!(h.value(), 30.0);
        assert_eq!(h.average_buy_price(), 10.0);
        assert_eq!(h.cost(), 30.0);
    }

    #[test]
    fn zero_shares_rejected() {
        assert_eq!(
            Holding::new(&sec(10.0), 0, 0.0),
            Err(Error::InvalidShares(SecurityId::new("VTI")))
        );
    }

    #[test]
    fn holdings_of_different_securities_differ() {
        let a = Holding::new(&Security::new("A").with_price(10.0), 1, 10.0).unwrap();
        let b = Holding::new(&Security::new("B").with_price(10.0), 1, 10.0).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn buy_updates_vwap() {
        let mut h = Holding::new(&sec(100.0), 1, 100.0).unwrap();
        h.buy(2, 101.0);
        assert_eq!(h.num_shares(), 3);
        assert_eq!(h.value(), 302.0);
        assert_eq!(h.cost(), 302.0);
        assert!((h.average_buy_price() - 302.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn buy_zero_is_noop() {
        let mut h = Holding::new(&sec(10.0), 1, 10.0).unwrap();
        h.buy(0, 50.0);
        assert_eq!(h.num_shares(), 1);
        assert_eq!(h.value(), 10.0);
    }

    #[test]
    fn market_value_needs_price() {
        let priced = sec(12.5);
        let h = Holding::new(&priced, 4, 40.0).unwrap();
        assert_eq!(h.market_value(&priced).unwrap(), 50.0);

        let unpriced = Security::new("VTI");
        assert_eq!(
            h.market_value(&unpriced),
            Err(Error::UndefinedPrice(SecurityId::new("VTI")))
        );
        assert!(h.total_return(&unpriced).is_err());
    }

    #[test]
    fn total_return_includes_dividends() {
        let s = sec(12.0);
        let h = Holding::new(&s, 10, 100.0)
            .unwrap()
            .with_average_buy_price(10.0)
            .with_dividends(5.0);
        // (120 - 100 + 5) / 100
        assert!((h.total_return(&s).unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn set_position_rejects_zero() {
        let mut h = Holding::new(&sec(10.0), 1, 10.0).unwrap();
        assert!(h.set_position(0, 0.0).is_err());
        assert_eq!(h.num_shares(), 1);
        h.set_position(7, 77.0).unwrap();
        assert_eq!(h.num_shares(), 7);
        assert_eq!(h.value(), 77.0);
    }
}
