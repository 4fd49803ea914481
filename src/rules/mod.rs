//! Soft rules.
//!
//! A soft rule inspects a stage's decision-variable layout and registers
//! penalized terms into one objective. Rules never add hard constraints;
//! those belong to the stage builders.
//!
//! # Available Rules
//!
//! | Stage | Rule | Penalizes |
//! |-------|------|-----------|
//! | Off-day | `ConsecutiveWorkOverage` | Working days above the run limit in a window |
//! | Off-day | `IsolatedWorkDay` | Rest-work-rest patterns |
//! | Off-day | `SoftLeaveRest` | Soft off-days planned as working days |
//! | Shift | `StaffingShortfall` | Missing people per shift and day |
//! | Shift | `StaffingSurplus` | Extra people per shift and day |
//! | Shift | `QuotaDeviation` | Distance from each per-type quota |
//! | Shift | `SoftLeaveOnWorkday` | Soft off-days that still carry a shift |
//! | Shift | `IsolatedNight` | Single night shifts |
//! | Shift | `NightBeforeSingleRest` | Night shift followed by one rest day only |

mod engine;
pub mod offday;
pub mod shift;

pub use engine::{RuleSet, RuleSummary};
pub use offday::WorkGrid;
pub use shift::ShiftGrid;

use crate::cp::{Comparison, CpModel, LinearExpr, Penalty};

/// A penalized preference over some variable layout `C`.
pub trait SoftRule<C>: Send + Sync {
    /// Rule name, used to tag its terms.
    fn name(&self) -> &'static str;

    /// Registers this rule's terms.
    fn apply(&self, input: &C, acc: &mut ObjectiveAccumulator<'_>);

    /// Human-readable description.
    fn description(&self) -> &'static str {
        ""
    }
}

/// Collects weighted soft terms into a model's objective.
///
/// Each term is tagged with the rule currently being applied, so objective
/// costs can be broken down per rule after solving.
pub struct ObjectiveAccumulator<'m> {
    model: &'m mut CpModel,
    rule: &'static str,
    added: usize,
}

impl<'m> ObjectiveAccumulator<'m> {
    /// Accumulator adding to `model`.
    pub fn new(model: &'m mut CpModel) -> Self {
        Self {
            model,
            rule: "unnamed",
            added: 0,
        }
    }

    pub(crate) fn begin(&mut self, rule: &'static str) {
        self.rule = rule;
        self.added = 0;
    }

    /// Terms added since the current rule began.
    pub fn added(&self) -> usize {
        self.added
    }

    /// Adds a term `expr cmp rhs` with a cost schedule.
    ///
    /// Terms whose schedule can never cost anything are dropped.
    pub fn penalize(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        cmp: Comparison,
        rhs: i64,
        penalty: Penalty,
    ) {
        if penalty.cost(i64::from(i32::MAX)) == 0 {
            return;
        }
        self.model.add_soft(self.rule, name, expr, cmp, rhs, penalty);
        self.added += 1;
    }

    /// `weight` per unit `expr` exceeds `bound`.
    pub fn penalize_above(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        bound: i64,
        weight: i64,
    ) {
        self.penalize(name, expr, Comparison::LessOrEqual, bound, Penalty::PerUnit(weight));
    }

    /// `weight` per unit `expr` falls short of `bound`.
    pub fn penalize_below(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        bound: i64,
        weight: i64,
    ) {
        self.penalize(
            name,
            expr,
            Comparison::GreaterOrEqual,
            bound,
            Penalty::PerUnit(weight),
        );
    }

    /// `weight` once whenever `expr` is positive.
    pub fn penalize_when_positive(&mut self, name: impl Into<String>, expr: LinearExpr, weight: i64) {
        self.penalize(name, expr, Comparison::LessOrEqual, 0, Penalty::Flat(weight));
    }

    /// Cost schedule on `|expr - target|`.
    pub fn penalize_deviation(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        target: i64,
        penalty: Penalty,
    ) {
        self.penalize(name, expr, Comparison::Equal, target, penalty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_tags_rule() {
        let mut model = CpModel::new("m");
        let x = model.new_bool_var("x");
        let mut acc = ObjectiveAccumulator::new(&mut model);
        acc.begin("prefer_off");
        acc.penalize_when_positive("x", LinearExpr::sum([x]), 5);
        assert_eq!(acc.added(), 1);

        assert_eq!(model.soft_terms()[0].rule, "prefer_off");
        assert_eq!(model.evaluate(&[true]).objective, 5);
    }

    #[test]
    fn test_zero_weight_terms_dropped() {
        let mut model = CpModel::new("m");
        let x = model.new_bool_var("x");
        let mut acc = ObjectiveAccumulator::new(&mut model);
        acc.penalize_above("x", LinearExpr::sum([x]), 0, 0);
        assert_eq!(acc.added(), 0);
        assert_eq!(model.soft_term_count(), 0);
    }
}
