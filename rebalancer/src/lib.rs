//! hanna-rebalancer: turns cash deposits into whole-share purchases.
//!
//! Reads target asset-class percentages from a JSON file, refreshes holdings
//! and prices from a broker, plans the deposit with `hanna`, and submits one
//! market buy per planned purchase with an audit trail.

pub mod allocation;
pub mod audit;
pub mod broker;
pub mod config;
pub mod error;
pub mod execution;
pub mod report;
