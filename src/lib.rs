//! # hanna
//!
//! Deposit planning for a target-allocation portfolio.
//!
//! Given asset classes with target percentages and a cash deposit, `hanna`
//! decides which securities to buy, in whole shares, so the portfolio moves
//! toward its targets while spending as much of the deposit as possible.
//!
//! ## Planning in two steps
//!
//! 1. **Budget split** ([`Portfolio::asset_class_budgets`]): each asset class's
//!    deviation from target is measured as if the deposit had already landed,
//!    and the deposit is handed out most-underweight first.
//! 2. **Whole-share purchases** ([`AssetClass::plan_purchases`]): each budget
//!    is spent with an unbounded knapsack over integer cents. Whatever a class
//!    cannot spend rolls over into the next class's budget.
//!
//! ```
//! use hanna::{AssetClass, Portfolio, Security};
//!
//! let mut equity = AssetClass::new("Equity", 0.6);
//! equity.add_security(Security::new("VTI").with_price(10.0)).unwrap();
//! equity.add_security(Security::new("VXUS").with_price(3.0)).unwrap();
//!
//! let mut bonds = AssetClass::new("Bonds", 0.4);
//! bonds.add_security(Security::new("BND").with_price(7.0)).unwrap();
//!
//! let mut portfolio = Portfolio::new();
//! portfolio.add_asset_class(equity).unwrap();
//! portfolio.add_asset_class(bonds).unwrap();
//!
//! let deposit = portfolio.plan_deposit(100.0);
//! assert_eq!(deposit.purchases_for_asset_class("Equity")[0].num_shares(), 6);
//! assert_eq!(deposit.purchases_for_asset_class("Bonds")[0].num_shares(), 5);
//! assert_eq!(deposit.unspent(), 5.0);
//! ```
//!
//! ## Determinism
//!
//! Securities are enumerated in id order and asset classes in name order, so
//! the same portfolio and amount always yield the same [`Deposit`]. When
//! several share combinations spend the same amount, the knapsack prefers
//! securities with smaller ids.
//!
//! ## Money
//!
//! Amounts are `f64` dollars at the API surface. The planner converts budgets
//! and prices to [`Cents`] once and does all optimization in integers.

mod asset_class;
mod deposit;
mod error;
mod holding;
mod portfolio;
mod purchase;
mod security;
mod types;

pub use asset_class::{AssetClass, plan_whole_shares};
pub use deposit::Deposit;
pub use error::{Error, Result};
pub use holding::Holding;
pub use portfolio::{AssetClassBudgets, HoldingSnapshot, Portfolio, RefreshReport};
pub use purchase::Purchase;
pub use security::Security;
pub use types::{Cents, SecurityId};
