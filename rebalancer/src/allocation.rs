//! Target allocation (portfolio.json) loading and validation.

use std::path::Path;

use hanna::{AssetClass, Portfolio, Security, SecurityId};
use log::warn;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Target percentages may miss 1.0 by this much without complaint.
pub const PERCENTAGE_TOLERANCE: f64 = 1e-6;

/// The asset classes a deposit is spread across.
#[derive(Debug, Clone, Deserialize)]
pub struct AllocationSpec {
    pub asset_classes: Vec<AssetClassSpec>,
}

/// One asset class: name, target share of the portfolio, eligible securities.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetClassSpec {
    pub name: String,
    pub target_percentage: f64,
    pub securities: Vec<SecurityId>,
    /// Securities that are held and tracked but never bought.
    #[serde(default)]
    pub buy_restrictions: Vec<SecurityId>,
}

impl AllocationSpec {
    /// Load and validate a portfolio.json file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::AllocationRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: AllocationSpec = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Validate the allocation.
    fn validate(&self) -> Result<()> {
        if self.asset_classes.is_empty() {
            return Err(Error::Allocation("asset class list is empty".into()));
        }

        let mut names = FxHashSet::default();
        let mut owner: FxHashMap<&SecurityId, &str> = FxHashMap::default();

        for ac in &self.asset_classes {
            if ac.name.trim().is_empty() {
                return Err(Error::Allocation("empty asset class name".into()));
            }
            if !names.insert(ac.name.as_str()) {
                return Err(Error::Allocation(format!(
                    "duplicate asset class: {}",
                    ac.name
                )));
            }
            if !(0.0..=1.0).contains(&ac.target_percentage) {
                return Err(Error::Allocation(format!(
                    "target percentage for {} ({}) is outside [0, 1]",
                    ac.name, ac.target_percentage
                )));
            }
            if ac.securities.is_empty() {
                warn!("Asset class {} lists no securities", ac.name);
            }

            for id in &ac.securities {
                if id.as_str().is_empty() {
                    return Err(Error::Allocation(format!(
                        "empty security id in {}",
                        ac.name
                    )));
                }
                match owner.insert(id, &ac.name) {
                    Some(other) if other == ac.name => {
                        return Err(Error::Allocation(format!(
                            "security {id} is listed twice in {other}"
                        )));
                    }
                    Some(other) => {
                        return Err(Error::Allocation(format!(
                            "security {id} is listed in both {other} and {}",
                            ac.name
                        )));
                    }
                    None => {}
                }
            }

            for id in &ac.buy_restrictions {
                if !ac.securities.contains(id) {
                    return Err(Error::Allocation(format!(
                        "restricted security {id} is not a security of {}",
                        ac.name
                    )));
                }
            }
        }

        let sum = self.total_percentage();
        if sum > 1.0 + PERCENTAGE_TOLERANCE {
            return Err(Error::Allocation(format!(
                "target percentages sum to {sum:.4} (> 1.0)"
            )));
        }
        if sum < 1.0 - PERCENTAGE_TOLERANCE {
            warn!(
                "Target percentages sum to {sum:.4}; {:.2}% of each deposit stays unallocated",
                (1.0 - sum) * 100.0
            );
        }

        Ok(())
    }

    pub fn total_percentage(&self) -> f64 {
        self.asset_classes.iter().map(|ac| ac.target_percentage).sum()
    }

    /// All configured security ids, in file order.
    pub fn security_ids(&self) -> Vec<SecurityId> {
        self.asset_classes
            .iter()
            .flat_map(|ac| ac.securities.iter().cloned())
            .collect()
    }

    /// Build an empty, unpriced portfolio from the allocation.
    pub fn to_portfolio(&self) -> Result<Portfolio> {
        let mut portfolio = Portfolio::new();
        for spec in &self.asset_classes {
            let mut ac = AssetClass::new(spec.name.as_str(), spec.target_percentage);
            for id in &spec.securities {
                let restricted = spec.buy_restrictions.contains(id);
                ac.add_security(Security::new(id.clone()).with_buy_restricted(restricted))?;
            }
            portfolio.add_asset_class(ac)?;
        }
        Ok(portfolio)
    }
}
