//! Supply vs demand diagnostics.
//!
//! When off-day planning fails, the usual cause is a structural mismatch
//! between what the roster can supply (quotas) and what the staffing table
//! demands. This summary makes the mismatch visible per shift type.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Supplied (per type) | Sum of employee quotas for that type |
//! | Demanded (per type) | Sum of resolved daily requirements for that type |
//! | Total work days | Sum of all quotas |
//! | Total required headcount | Sum of daily required headcounts |
//! | Leave conflicts | Employees whose hard leave leaves fewer days than their quota |

use std::fmt;

use serde::Serialize;

use crate::loader::RosterContext;
use crate::models::ShiftType;

/// Supply and demand of one working shift type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftBalance {
    /// Shift type.
    pub shift: ShiftType,
    /// Days of this type the quotas supply.
    pub supplied: u32,
    /// Days of this type the staffing table demands.
    pub demanded: u32,
}

impl ShiftBalance {
    /// `supplied - demanded`: positive means surplus, negative shortfall.
    pub fn balance(&self) -> i64 {
        i64::from(self.supplied) - i64::from(self.demanded)
    }
}

/// An employee whose hard leave cannot fit beside their quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaveConflict {
    /// Employee name.
    pub employee: String,
    /// Days not blocked by hard leave.
    pub available_days: usize,
    /// Working days the quota requires.
    pub required_days: u32,
}

/// Aggregate supply vs demand of a roster context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplyDemandSummary {
    /// Per working shift type, in A/B/C order.
    pub per_shift: Vec<ShiftBalance>,
    /// Sum of all employee quotas.
    pub total_work_days: u32,
    /// Sum of daily required headcounts.
    pub total_required_headcount: u32,
    /// Employees whose hard leave leaves too few days.
    pub leave_conflicts: Vec<LeaveConflict>,
}

impl SupplyDemandSummary {
    /// Computes the summary of a context.
    pub fn calculate(ctx: &RosterContext) -> Self {
        let demand = ctx.staffing().totals();
        let supply: crate::models::ShiftCounts =
            (0..ctx.employee_count()).map(|e| ctx.quota(e)).sum();

        let per_shift = ShiftType::WORKING
            .iter()
            .map(|&shift| ShiftBalance {
                shift,
                supplied: supply.get(shift),
                demanded: demand.get(shift),
            })
            .collect();

        let leave_conflicts = ctx
            .employees()
            .iter()
            .enumerate()
            .filter_map(|(e, employee)| {
                let available_days = ctx.day_count() - ctx.hard_off_count(e);
                let required_days = ctx.total_quota(e);
                (available_days < required_days as usize).then(|| LeaveConflict {
                    employee: employee.name.clone(),
                    available_days,
                    required_days,
                })
            })
            .collect();

        Self {
            per_shift,
            total_work_days: supply.total(),
            total_required_headcount: demand.total(),
            leave_conflicts,
        }
    }

    /// `total_work_days - total_required_headcount`.
    pub fn balance(&self) -> i64 {
        i64::from(self.total_work_days) - i64::from(self.total_required_headcount)
    }

    /// Whether supply covers demand overall and no leave conflicts exist.
    pub fn is_coverable(&self) -> bool {
        self.balance() >= 0 && self.leave_conflicts.is_empty()
    }
}

impl fmt::Display for SupplyDemandSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "work days {} vs required headcount {} ({:+})",
            self.total_work_days,
            self.total_required_headcount,
            self.balance()
        )?;
        for b in &self.per_shift {
            write!(
                f,
                "; {} supplied {} demanded {} ({:+})",
                b.shift.code(),
                b.supplied,
                b.demanded,
                b.balance()
            )?;
        }
        for c in &self.leave_conflicts {
            write!(
                f,
                "; {} has {} days free of hard leave for {} required",
                c.employee, c.available_days, c.required_days
            )?;
        }
        Ok(())
    }
}
