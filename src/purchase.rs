//! A planned (or executed) whole-share buy of one security.

use crate::error::Result;
use crate::security::Security;
use crate::types::SecurityId;

/// A buy of `num_shares` whole shares.
///
/// The security is snapshotted at construction, so the cost stays fixed even
/// if the live security is re-priced before execution.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Purchase {
    security: Security,
    num_shares: u64,
    cost: f64,
}

impl Purchase {
    /// Fails with `UndefinedPrice` if the security was never priced.
    pub fn new(security: &Security, num_shares: u64) -> Result<Self> {
        let price = security.require_price()?;
        Ok(Self {
            security: security.clone(),
            num_shares,
            cost: num_shares as f64 * price,
        })
    }

    #[inline]
    pub fn security(&self) -> &Security {
        &self.security
    }

    #[inline]
    pub fn security_id(&self) -> &SecurityId {
        self.security.id()
    }

    #[inline]
    pub fn num_shares(&self) -> u64 {
        self.num_shares
    }

    /// Price per share at planning time.
    pub fn price(&self) -> f64 {
        self.security.price().unwrap_or_default()
    }

    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost
    }
}
