//! JSONL audit trail logging.
//!
//! Each rebalancer run appends events to an audit.jsonl file,
//! one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use hanna::{AssetClassBudgets, Deposit, HoldingSnapshot, Purchase, RefreshReport};
use hanna_broker::{BrokerOrderStatus, OrderId};
use serde::Serialize;

use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, serde_json::json!({}))
    }
}

/// Convenience: log a run start event.
pub fn log_run_started(
    audit: &mut AuditLog,
    allocation_file: &str,
    account_id: &str,
    dry_run: bool,
) -> Result<()> {
    audit.log(
        "run_started",
        serde_json::json!({
            "allocation_file": allocation_file,
            "account": account_id,
            "dry_run": dry_run,
        }),
    )
}

/// Convenience: log holdings fetched and what the refresh did with them.
pub fn log_refresh(
    audit: &mut AuditLog,
    holdings: &[HoldingSnapshot],
    report: &RefreshReport,
    cash: f64,
) -> Result<()> {
    let holding_data: Vec<_> = holdings
        .iter()
        .filter(|h| h.quantity > 0)
        .map(|h| {
            serde_json::json!({
                "id": h.id,
                "qty": h.quantity,
                "price": h.price,
                "equity": h.equity,
            })
        })
        .collect();
    let untracked: Vec<_> = report.untracked.iter().map(|h| &h.id).collect();

    audit.log(
        "holdings_refreshed",
        serde_json::json!({
            "holdings": holding_data,
            "untracked": untracked,
            "closed": report.closed,
            "cash": cash,
        }),
    )
}

/// Convenience: log the planned deposit.
pub fn log_plan(audit: &mut AuditLog, budgets: &AssetClassBudgets, deposit: &Deposit) -> Result<()> {
    let budget_data: Vec<_> = budgets
        .iter()
        .map(|(name, budget)| serde_json::json!({ "asset_class": name, "budget": budget }))
        .collect();
    let purchase_data: Vec<_> = deposit
        .purchases()
        .flat_map(|(asset_class, purchases)| {
            purchases.iter().map(move |p| {
                serde_json::json!({
                    "asset_class": asset_class,
                    "id": p.security_id(),
                    "shares": p.num_shares(),
                    "price": p.price(),
                    "cost": p.cost(),
                })
            })
        })
        .collect();

    audit.log(
        "deposit_planned",
        serde_json::json!({
            "amount": deposit.amount(),
            "budgets": budget_data,
            "purchases": purchase_data,
            "total": deposit.total(),
            "rollover": deposit.rollover(),
            "unallocated": deposit.unallocated(),
        }),
    )
}

/// Convenience: log order submission.
pub fn log_order_submitted(
    audit: &mut AuditLog,
    asset_class: &str,
    purchase: &Purchase,
    order_id: OrderId,
) -> Result<()> {
    audit.log(
        "order_submitted",
        serde_json::json!({
            "asset_class": asset_class,
            "id": purchase.security_id(),
            "shares": purchase.num_shares(),
            "price": purchase.price(),
            "order_id": order_id.0,
        }),
    )
}

/// Convenience: log the final state of a submitted order.
pub fn log_order_status(
    audit: &mut AuditLog,
    purchase: &Purchase,
    status: &BrokerOrderStatus,
) -> Result<()> {
    audit.log(
        "order_status",
        serde_json::json!({
            "id": purchase.security_id(),
            "order_id": status.id.0,
            "status": format!("{:?}", status.status),
            "filled": status.filled_quantity,
            "remaining": status.remaining_quantity,
            "avg_price": status.avg_fill_price_cents as f64 / 100.0,
        }),
    )
}

/// Convenience: log an order the broker refused.
pub fn log_order_failed(audit: &mut AuditLog, purchase: &Purchase, error: &str) -> Result<()> {
    audit.log(
        "order_failed",
        serde_json::json!({
            "id": purchase.security_id(),
            "shares": purchase.num_shares(),
            "error": error,
        }),
    )
}

/// Convenience: log run completion.
pub fn log_run_completed(
    audit: &mut AuditLog,
    submitted: usize,
    filled: usize,
    failed: usize,
    spent: f64,
) -> Result<()> {
    audit.log(
        "run_completed",
        serde_json::json!({
            "submitted": submitted,
            "filled": filled,
            "failed": failed,
            "spent": spent,
        }),
    )
}
