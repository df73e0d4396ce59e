// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! End-to-end deposit runs against the mock broker.

use hanna::SecurityId;
use hanna_broker::mock::{FillMode, MockBroker};
use hanna_broker::{Broker, BrokerOrderType};
use hanna_rebalancer::allocation::AllocationSpec;
use hanna_rebalancer::config::Config;
use hanna_rebalancer::error::Error;
use hanna_rebalancer::execution::{self, RunOptions};

fn sid(id: &str) -> SecurityId {
    SecurityId::new(id)
}

fn allocation() -> AllocationSpec {
    AllocationSpec::from_json(
        r#"{
            "asset_classes": [
                {
                    "name": "US Equity",
                    "target_percentage": 0.5,
                    "securities": ["VTI", "ITOT"],
                    "buy_restrictions": ["ITOT"]
                },
                { "name": "International", "target_percentage": 0.3, "securities": ["VXUS"] },
                { "name": "Bonds", "target_percentage": 0.2, "securities": ["BND"] }
            ]
        }"#,
    )
    .unwrap()
}

fn config(dir: &tempfile::TempDir, max_orders: usize) -> Config {
    Config::from_toml(&format!(
        r#"
[broker]
snapshot = "unused.json"

[account]
id = "TEST"

[execution]
order_interval_ms = 0
max_orders_per_run = {max_orders}
min_deposit_usd = 1.0

[logging]
dir = "{}"
audit_file = "audit.jsonl"
"#,
        dir.path().display()
    ))
    .unwrap()
}

/// $1840 invested (US $1240, Intl $600, Bonds $0) with $500 cash.
fn broker(mode: FillMode) -> MockBroker {
    let mut broker = MockBroker::builder()
        .fill_mode(mode)
        .with_holding(sid("VTI"), 4, 250_00)
        .with_holding(sid("ITOT"), 2, 120_00)
        .with_holding(sid("VXUS"), 10, 60_00)
        .with_quote(sid("BND"), 72_00, 72_00)
        .with_cash(500_00)
        .build();
    broker.connect().unwrap();
    broker
}

fn live() -> RunOptions {
    RunOptions {
        force: true,
        allocation_file: "portfolio.json".into(),
        ..RunOptions::default()
    }
}

fn audit_events(dir: &tempfile::TempDir) -> Vec<String> {
    std::fs::read_to_string(dir.path().join("audit.jsonl"))
        .unwrap()
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            v["event"].as_str().unwrap().to_string()
        })
        .collect()
}

// ============================================================================
// Planning
// ============================================================================

#[test]
fn plan_spends_cash_toward_bonds() {
    let broker = broker(FillMode::ImmediateFull);
    let planned = execution::plan(&allocation(), &broker, None).unwrap();

    assert_eq!(planned.portfolio.value(), 1840.0);
    let bonds = planned.deposit.purchases_for_asset_class("Bonds");
    assert_eq!(bonds[0].security_id(), &sid("BND"));
    assert_eq!(bonds[0].num_shares(), 6);
    let intl = planned.deposit.purchases_for_asset_class("International");
    assert_eq!(intl[0].num_shares(), 1);
    assert!((planned.deposit.total() - 492.0).abs() < 1e-9);
    assert!((planned.deposit.rollover() - 8.0).abs() < 1e-9);
}

#[test]
fn plan_with_explicit_amount() {
    let broker = broker(FillMode::ImmediateFull);
    let planned = execution::plan(&allocation(), &broker, Some(100.0)).unwrap();

    assert_eq!(planned.deposit.amount(), 100.0);
    assert_eq!(planned.deposit.num_purchases(), 1);
    assert_eq!(planned.deposit.purchases_for_asset_class("Bonds")[0].num_shares(), 1);
    assert!((planned.deposit.rollover() - 28.0).abs() < 1e-9);
}

#[test]
fn plan_reports_untracked_holdings() {
    let mut broker = MockBroker::builder()
        .with_holding(sid("GLD"), 1, 180_00)
        .with_cash(0)
        .build();
    broker.connect().unwrap();

    let planned = execution::plan(&allocation(), &broker, None).unwrap();
    assert_eq!(planned.refresh.report.untracked.len(), 1);
    assert_eq!(planned.portfolio.value(), 0.0);
    assert!(planned.deposit.is_empty());
}

#[test]
fn plan_rejects_negative_amount() {
    let broker = broker(FillMode::ImmediateFull);
    assert!(matches!(
        execution::plan(&allocation(), &broker, Some(-5.0)),
        Err(Error::Amount(_))
    ));
}

// ============================================================================
// Runs
// ============================================================================

#[test]
fn dry_run_submits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let broker = broker(FillMode::ImmediateFull);
    let opts = RunOptions {
        dry_run: true,
        ..live()
    };

    let summary = execution::run(&config(&dir, 50), &allocation(), &broker, &opts).unwrap();

    assert_eq!(summary.submitted, 0);
    assert!(broker.submitted_orders().is_empty());
    assert_eq!(summary.planned.num_purchases(), 2);
    assert!(summary.executed.is_empty());
    assert_eq!(
        audit_events(&dir),
        vec!["run_started", "holdings_refreshed", "deposit_planned"]
    );
}

#[test]
fn live_run_submits_one_order_per_purchase() {
    let dir = tempfile::tempdir().unwrap();
    let broker = broker(FillMode::ImmediateFull);

    let summary = execution::run(&config(&dir, 50), &allocation(), &broker, &live()).unwrap();

    let orders = broker.submitted_orders();
    assert_eq!(orders.len(), 2);
    // asset classes run in name order
    assert_eq!(orders[0].security, sid("BND"));
    assert_eq!(orders[0].quantity, 6);
    assert_eq!(orders[0].order_type, BrokerOrderType::Market);
    assert_eq!(orders[1].security, sid("VXUS"));
    assert_eq!(orders[1].quantity, 1);

    assert_eq!(summary.submitted, 2);
    assert_eq!(summary.filled, 2);
    assert_eq!(summary.failed, 0);
    assert!((summary.executed.total() - 492.0).abs() < 1e-9);

    let events = audit_events(&dir);
    assert_eq!(events.first().map(String::as_str), Some("run_started"));
    assert_eq!(events.last().map(String::as_str), Some("run_completed"));
    assert_eq!(events.iter().filter(|e| *e == "order_submitted").count(), 2);
}

#[test]
fn rejected_orders_are_counted_and_not_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let broker = broker(FillMode::Reject);

    let summary = execution::run(&config(&dir, 50), &allocation(), &broker, &live()).unwrap();

    assert_eq!(summary.submitted, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.filled, 0);
    assert!(summary.executed.is_empty());
    assert_eq!(
        audit_events(&dir)
            .iter()
            .filter(|e| *e == "order_failed")
            .count(),
        2
    );
}

#[test]
fn partial_fills_record_filled_shares_only() {
    let dir = tempfile::tempdir().unwrap();
    let broker = broker(FillMode::ImmediatePartial(0.5));

    let summary = execution::run(&config(&dir, 50), &allocation(), &broker, &live()).unwrap();

    // BND fills 3 of 6; VXUS fills 0 of 1
    assert_eq!(summary.executed.num_shares(), 3);
    assert_eq!(summary.executed.purchases_for_asset_class("Bonds")[0].num_shares(), 3);
    assert!(!summary.executed.involves_asset_class("International"));
    assert!((summary.executed.total() - 216.0).abs() < 1e-9);
}

#[test]
fn deposit_below_minimum_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let broker = broker(FillMode::ImmediateFull);
    let opts = RunOptions {
        amount: Some(0.5),
        ..live()
    };

    let summary = execution::run(&config(&dir, 50), &allocation(), &broker, &opts).unwrap();

    assert_eq!(summary.submitted, 0);
    assert!(broker.submitted_orders().is_empty());
    assert!(audit_events(&dir).contains(&"deposit_below_minimum".to_string()));
}

#[test]
fn too_many_orders_aborts_before_submitting() {
    let dir = tempfile::tempdir().unwrap();
    let broker = broker(FillMode::ImmediateFull);

    let err = execution::run(&config(&dir, 1), &allocation(), &broker, &live()).unwrap_err();

    match err {
        Error::OrderLimit(msg) => {
            assert!(msg.contains("2 orders generated"));
            assert!(msg.contains("max_orders_per_run is 1"));
        }
        other => panic!("expected OrderLimit, got {other:?}"),
    }
    assert!(broker.submitted_orders().is_empty());
}

#[test]
fn disconnected_broker_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let broker = MockBroker::builder().build();
    assert!(matches!(
        execution::run(&config(&dir, 50), &allocation(), &broker, &live()),
        Err(Error::Broker(_))
    ));
}

// ============================================================================
// Helpers
// ============================================================================

#[test]
fn enforce_max_orders_per_run_allows_under_limit() {
    assert!(execution::enforce_max_orders_per_run(3, 5).is_ok());
    assert!(execution::enforce_max_orders_per_run(5, 5).is_ok());
}

#[test]
fn enforce_max_orders_per_run_rejects_over_limit() {
    assert!(matches!(
        execution::enforce_max_orders_per_run(10, 5),
        Err(Error::OrderLimit(_))
    ));
}
