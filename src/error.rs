//! Errors raised by portfolio bookkeeping and deposit planning.
//!
//! Every variant signals a configuration or data-integrity bug. Nothing in
//! the crate catches or retries them; they surface to the caller unchanged.

use crate::types::SecurityId;

/// Errors returned by portfolio, asset class, and holding operations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{security} was already added to the '{asset_class}' asset class")]
    DuplicateSecurity {
        security: SecurityId,
        asset_class: String,
    },

    #[error("a holding for {security} was already added to the '{asset_class}' asset class")]
    DuplicateHolding {
        security: SecurityId,
        asset_class: String,
    },

    #[error("portfolio already contains a '{0}' asset class")]
    DuplicateAssetClass(String),

    #[error("must add {security} to '{asset_class}' before adding it as a holding")]
    MissingSecurity {
        security: SecurityId,
        asset_class: String,
    },

    #[error("{security} is not in the '{asset_class}' asset class's securities")]
    UnknownSecurity {
        security: SecurityId,
        asset_class: String,
    },

    #[error("{security} is not in the '{asset_class}' asset class's holdings")]
    UnknownHolding {
        security: SecurityId,
        asset_class: String,
    },

    #[error("portfolio does not contain a '{0}' asset class")]
    UnknownAssetClass(String),

    #[error("portfolio does not contain security {0}")]
    SecurityNotInPortfolio(SecurityId),

    #[error("security {0} has an undefined price")]
    UndefinedPrice(SecurityId),

    #[error("holding of {0} must have a positive number of shares")]
    InvalidShares(SecurityId),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = Error::MissingSecurity {
            security: SecurityId::new("VTI"),
            asset_class: "US Equity".into(),
        };
        assert_eq!(
            err.to_string(),
            "must add VTI to 'US Equity' before adding it as a holding"
        );
        assert_eq!(
            Error::UndefinedPrice(SecurityId::new("BND")).to_string(),
            "security BND has an undefined price"
        );
    }

    #[test]
    fn is_error() {
        let err: Box<dyn std::error::Error> = Box::new(Error::UnknownAssetClass("Bonds".into()));
        assert!(err.to_string().contains("Bonds"));
    }
}
