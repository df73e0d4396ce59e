//! Allocation and deposit-plan reports for the terminal.

use hanna::{AssetClassBudgets, Deposit, Portfolio};
use serde::Serialize;

/// Current allocation compared against targets.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationReport {
    pub entries: Vec<AllocationEntry>,
    pub total_value: f64,
    pub tracking_error_pct: f64,
}

/// One asset class's row in the allocation report.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationEntry {
    pub asset_class: String,
    pub value: f64,
    pub target_weight: f64,
    pub actual_weight: f64,
    pub diff_weight: f64,
    /// Dollars above (+) or below (-) target.
    pub deviation: f64,
}

/// Compare each asset class's share of the portfolio against its target.
///
/// Tracking error is the RMS of the weight differences, in percent.
pub fn allocation(portfolio: &Portfolio) -> AllocationReport {
    let total_value = portfolio.value();
    let mut entries = Vec::new();
    let mut sum_sq_diff = 0.0_f64;

    for ac in portfolio.asset_classes() {
        let actual_weight = if total_value > 0.0 {
            ac.value() / total_value
        } else {
            0.0
        };
        let target_weight = ac.target_percentage();
        let diff_weight = actual_weight - target_weight;
        sum_sq_diff += diff_weight * diff_weight;

        entries.push(AllocationEntry {
            asset_class: ac.name().to_string(),
            value: ac.value(),
            target_weight,
            actual_weight,
            diff_weight,
            deviation: ac.value() - total_value * target_weight,
        });
    }

    let tracking_error_pct = (sum_sq_diff / entries.len().max(1) as f64).sqrt() * 100.0;

    AllocationReport {
        entries,
        total_value,
        tracking_error_pct,
    }
}

impl std::fmt::Display for AllocationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ALLOCATION:")?;
        writeln!(
            f,
            "  {:20} {:>12} {:>9} {:>9} {:>9} {:>12}",
            "Asset class", "Value", "Target%", "Actual%", "Diff%", "Deviation"
        )?;
        for e in &self.entries {
            writeln!(
                f,
                "  {:20} ${:>11.2} {:>8.2}% {:>8.2}% {:>+8.2}% {:>+12.2}",
                e.asset_class,
                e.value,
                e.target_weight * 100.0,
                e.actual_weight * 100.0,
                e.diff_weight * 100.0,
                e.deviation,
            )?;
        }
        writeln!(f, "\n  Total value: ${:.2}", self.total_value)?;
        writeln!(f, "  Tracking error: {:.3}%", self.tracking_error_pct)?;
        Ok(())
    }
}

/// A planned deposit with the budgets it was planned from.
#[derive(Debug, Clone)]
pub struct PlanReport<'a> {
    pub budgets: &'a AssetClassBudgets,
    pub deposit: &'a Deposit,
}

impl std::fmt::Display for PlanReport<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DEPOSIT PLAN (${:.2}):", self.deposit.amount())?;
        writeln!(
            f,
            "  {:>3}  {:20} {:10} {:>8} {:>10} {:>12}",
            "#", "Asset class", "Security", "Shares", "Price", "Cost"
        )?;

        let mut row = 0;
        for (name, budget) in self.budgets.iter() {
            let purchases = self.deposit.purchases_for_asset_class(name);
            if purchases.is_empty() {
                writeln!(f, "       {name:20} (budget ${budget:.2}, nothing bought)")?;
                continue;
            }
            for p in purchases {
                row += 1;
                writeln!(
                    f,
                    "  {:>3}  {:20} {:10} {:>8} ${:>9.2} ${:>11.2}",
                    row,
                    name,
                    p.security_id(),
                    p.num_shares(),
                    p.price(),
                    p.cost(),
                )?;
            }
        }

        writeln!(f, "\n  Total: ${:.2}", self.deposit.total())?;
        writeln!(f, "  Rollover: ${:.2}", self.deposit.rollover())?;
        if self.deposit.unallocated() > 0.0 {
            writeln!(f, "  Unallocated: ${:.2}", self.deposit.unallocated())?;
        }
        Ok(())
    }
}
