//! Execution orchestrator: refresh → plan → confirm → execute → report.
//!
//! This is the main workflow that ties together all components. Every entry
//! point takes an already connected `Broker` so tests can drive it with the
//! mock broker.

use std::time::Duration;

use hanna::{AssetClassBudgets, Deposit, Portfolio, Purchase};
use hanna_broker::{Broker, BrokerOrder, OrderState};
use log::{error, info, warn};

use crate::allocation::AllocationSpec;
use crate::audit::{self, AuditLog};
use crate::broker::{self, Refresh};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::report::{self, PlanReport};

/// Options for a deposit run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub force: bool,
    /// Deposit this much instead of the account's cash balance.
    pub amount: Option<f64>,
    pub allocation_file: String,
}

/// A refreshed portfolio and the deposit planned for it.
#[derive(Debug, Clone)]
pub struct Planned {
    pub portfolio: Portfolio,
    pub refresh: Refresh,
    pub budgets: AssetClassBudgets,
    pub deposit: Deposit,
}

/// What a run did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub planned: Deposit,
    /// Purchases the broker reported as (partially) filled.
    pub executed: Deposit,
    pub submitted: usize,
    pub filled: usize,
    pub failed: usize,
}

/// Resolve the deposit amount: an explicit amount wins over available cash.
pub fn deposit_amount(requested: Option<f64>, cash: f64) -> Result<f64> {
    let amount = requested.unwrap_or(cash);
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::Amount(format!("{amount} is not a non-negative amount")));
    }
    if amount > cash + 1e-9 {
        warn!("Deposit ${amount:.2} exceeds available cash ${cash:.2}");
    }
    Ok(amount)
}

pub fn enforce_max_orders_per_run(order_count: usize, max_orders_per_run: usize) -> Result<()> {
    if order_count > max_orders_per_run {
        return Err(Error::OrderLimit(format!(
            "{order_count} orders generated, but max_orders_per_run is {max_orders_per_run}"
        )));
    }
    Ok(())
}

/// Sleep between order submissions.
pub fn rate_limit_delay(interval_ms: u64) {
    if interval_ms > 0 {
        std::thread::sleep(Duration::from_millis(interval_ms));
    }
}

/// Refresh a fresh portfolio from the broker and plan a deposit into it.
pub fn plan(
    allocation: &AllocationSpec,
    broker: &dyn Broker,
    amount: Option<f64>,
) -> Result<Planned> {
    let mut portfolio = allocation.to_portfolio()?;
    let refresh = broker::refresh(&mut portfolio, broker)?;
    let amount = deposit_amount(amount, refresh.cash())?;

    let budgets = portfolio.asset_class_budgets(amount);
    let deposit = portfolio.plan_deposit(amount);
    if deposit.unallocated() > 0.0 {
        warn!(
            "${:.2} of the deposit is not allocated to any asset class",
            deposit.unallocated()
        );
    }
    info!(
        "Planned {} purchases for ${:.2}, rollover ${:.2}",
        deposit.num_purchases(),
        deposit.total(),
        deposit.rollover()
    );

    Ok(Planned {
        portfolio,
        refresh,
        budgets,
        deposit,
    })
}

/// Execute a full deposit run.
pub fn run(
    config: &Config,
    allocation: &AllocationSpec,
    broker: &dyn Broker,
    opts: &RunOptions,
) -> Result<RunSummary> {
    // 1. Open audit log
    let mut audit = AuditLog::open(&config.audit_path())?;
    audit::log_run_started(
        &mut audit,
        &opts.allocation_file,
        &config.account.id,
        opts.dry_run,
    )?;

    // 2. Refresh and plan
    let Planned {
        mut portfolio,
        refresh,
        budgets,
        deposit,
    } = plan(allocation, broker, opts.amount)?;
    audit::log_refresh(&mut audit, &refresh.snapshot, &refresh.report, refresh.cash())?;

    println!(
        "Account {}: ${:.2} invested, ${:.2} cash",
        config.account.id,
        portfolio.value(),
        refresh.cash(),
    );
    print!("\n{}", report::allocation(&portfolio));

    let mut summary = RunSummary {
        planned: deposit.clone(),
        ..RunSummary::default()
    };

    if deposit.amount() < config.execution.min_deposit_usd {
        println!(
            "\nDeposit ${:.2} is below the ${:.2} minimum; nothing to do.",
            deposit.amount(),
            config.execution.min_deposit_usd
        );
        audit.log(
            "deposit_below_minimum",
            serde_json::json!({ "amount": deposit.amount() }),
        )?;
        return Ok(summary);
    }

    // 3. Display the plan
    audit::log_plan(&mut audit, &budgets, &deposit)?;
    print!(
        "\n{}",
        PlanReport {
            budgets: &budgets,
            deposit: &deposit,
        }
    );

    if deposit.is_empty() {
        println!("\nNo whole shares fit the deposit.");
        audit.log_simple("nothing_to_buy")?;
        return Ok(summary);
    }

    enforce_max_orders_per_run(deposit.num_purchases(), config.execution.max_orders_per_run)?;

    // 4. Dry run stops here
    if opts.dry_run {
        println!("\n[DRY RUN] No orders submitted.");
        return Ok(summary);
    }

    // 5. Confirm execution
    if !opts.force {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Execute?")
            .default(false)
            .interact()
            .map_err(|e| Error::Aborted(format!("confirmation prompt failed: {e}")))?;

        if !confirmed {
            println!("Aborted.");
            audit.log("user_confirmed", serde_json::json!({"approved": false}))?;
            return Ok(summary);
        }

        audit.log("user_confirmed", serde_json::json!({"approved": true}))?;
    }

    // 6. Submit one market buy per purchase
    let total = deposit.num_purchases();
    let mut executed = Deposit::new(deposit.amount());
    let mut i = 0;

    for (asset_class, purchases) in deposit.purchases() {
        for purchase in purchases {
            i += 1;
            print!(
                "[{i}/{total}] BUY {} {} @ ${:.2} ... ",
                purchase.num_shares(),
                purchase.security_id(),
                purchase.price(),
            );
            summary.submitted += 1;

            let order =
                BrokerOrder::market_buy(purchase.security_id().clone(), purchase.num_shares());
            let outcome = broker
                .submit_order(&order)
                .and_then(|id| Ok((id, broker.order_status(id)?)));

            match outcome {
                Ok((id, status)) => {
                    audit::log_order_submitted(&mut audit, asset_class, purchase, id)?;
                    audit::log_order_status(&mut audit, purchase, &status)?;

                    match status.status {
                        OrderState::Filled => {
                            println!(
                                "FILLED {} @ ${:.2} avg",
                                status.filled_quantity,
                                status.avg_fill_price_cents as f64 / 100.0
                            );
                            summary.filled += 1;
                            record_fill(&mut executed, asset_class, purchase, status.filled_quantity)?;
                        }
                        OrderState::PartiallyFilled => {
                            println!(
                                "PARTIAL {}/{} @ ${:.2} avg",
                                status.filled_quantity,
                                purchase.num_shares(),
                                status.avg_fill_price_cents as f64 / 100.0
                            );
                            warn!(
                                "Partial fill for {}: {}/{}",
                                purchase.security_id(),
                                status.filled_quantity,
                                purchase.num_shares()
                            );
                            summary.filled += 1;
                            record_fill(&mut executed, asset_class, purchase, status.filled_quantity)?;
                        }
                        OrderState::Pending | OrderState::Submitted => {
                            println!("PENDING");
                            warn!(
                                "Order {} for {} is still open; the next refresh will pick up its fill",
                                id.0,
                                purchase.security_id()
                            );
                        }
                        OrderState::Cancelled | OrderState::Rejected => {
                            println!("{:?}", status.status);
                            summary.failed += 1;
                        }
                    }
                }
                Err(e) => {
                    println!("ERROR: {e}");
                    error!("Order failed for {}: {e}", purchase.security_id());
                    audit::log_order_failed(&mut audit, purchase, &e.to_string())?;
                    summary.failed += 1;
                }
            }

            if i < total {
                rate_limit_delay(config.execution.order_interval_ms);
            }
        }
    }

    // 7. Record fills and report
    portfolio.make_deposit(&executed)?;
    audit::log_run_completed(
        &mut audit,
        summary.submitted,
        summary.filled,
        summary.failed,
        executed.total(),
    )?;
    println!(
        "\n{} submitted, {} filled, {} failed, ${:.2} spent. Audit logged to {}",
        summary.submitted,
        summary.filled,
        summary.failed,
        executed.total(),
        config.audit_path().display()
    );
    print!("\n{}", report::allocation(&portfolio));

    summary.executed = executed;
    Ok(summary)
}

fn record_fill(
    executed: &mut Deposit,
    asset_class: &str,
    planned: &Purchase,
    filled: u64,
) -> Result<()> {
    if filled > 0 {
        executed.add_purchase(asset_class, Purchase::new(planned.security(), filled)?);
    }
    Ok(())
}

/// Show the deposit plan without touching the audit log or the broker's orders.
pub fn show_plan(allocation: &AllocationSpec, broker: &dyn Broker, amount: Option<f64>) -> Result<()> {
    let planned = plan(allocation, broker, amount)?;
    print!("{}", report::allocation(&planned.portfolio));
    print!(
        "\n{}",
        PlanReport {
            budgets: &planned.budgets,
            deposit: &planned.deposit,
        }
    );
    Ok(())
}

/// Show account, allocation and holdings the allocation does not track.
pub fn check_status(config: &Config, allocation: &AllocationSpec, broker: &dyn Broker) -> Result<()> {
    let mut portfolio = allocation.to_portfolio()?;
    let refresh = broker::refresh(&mut portfolio, broker)?;

    println!(
        "Account {}: ${:.2} invested, ${:.2} cash\n",
        config.account.id,
        portfolio.value(),
        refresh.cash(),
    );
    print!("{}", report::allocation(&portfolio));

    if !refresh.report.untracked.is_empty() {
        println!("\nUNTRACKED HOLDINGS:");
        for h in &refresh.report.untracked {
            println!("  {:10} {:>6} @ ${:>8.2} = ${:>10.2}", h.id, h.quantity, h.price, h.equity);
        }
    }
    Ok(())
}
