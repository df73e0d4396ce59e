//! A tradable instrument: stable identity plus refreshable market data.

use crate::error::{Error, Result};
use crate::types::{Cents, SecurityId};

/// A security eligible for an asset class.
///
/// The price stays `None` until the first refresh from the brokerage.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Security {
    id: SecurityId,
    name: String,
    price: Option<f64>,
    buy_restricted: bool,
}

impl Security {
    /// Create an unpriced security. The display name defaults to the id.
    pub fn new(id: impl Into<SecurityId>) -> Self {
        let id = id.into();
        Self {
            name: id.as_str().to_string(),
            id,
            price: None,
            buy_restricted: false,
        }
    }

    /// Builder-style display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder-style price.
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Builder-style buy restriction.
    pub fn with_buy_restricted(mut self, restricted: bool) -> Self {
        self.buy_restricted = restricted;
        self
    }

    #[inline]
    pub fn id(&self) -> &SecurityId {
        &self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn price(&self) -> Option<f64> {
        self.price
    }

    /// Price, or [`Error::UndefinedPrice`] if it was never refreshed.
    pub fn require_price(&self) -> Result<f64> {
        self.price.ok_or_else(|| Error::UndefinedPrice(self.id.clone()))
    }

    /// Price rounded up to whole cents, if priced.
    pub fn price_cents(&self) -> Option<Cents> {
        self.price.map(Cents::from_dollars_ceil)
    }

    #[inline]
    pub fn is_buy_restricted(&self) -> bool {
        self.buy_restricted
    }

    /// Whether the planner may buy this security: unrestricted and priced
    /// above zero.
    pub fn is_purchasable(&self) -> bool {
        !self.buy_restricted && self.price_cents().is_some_and(|c| c.0 > 0)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_price(&mut self, price: f64) {
        self.price = Some(price);
    }

    pub fn set_buy_restricted(&mut self, restricted: bool) {
        self.buy_restricted = restricted;
    }
}
