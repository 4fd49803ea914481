//! Off-day planning rules.
//!
//! Rules over the work/off layout: one boolean `work[e][d]` per employee and
//! day, true when the employee works.

use super::{ObjectiveAccumulator, RuleSet, SoftRule};
use crate::config::{PenaltyWeights, RestRules};
use crate::cp::{BoolVar, LinearExpr};
use crate::loader::RosterContext;
use crate::models::OffDayKind;

/// Work/off variable layout of the off-day model.
#[derive(Debug, Clone)]
pub struct WorkGrid<'a> {
    /// Roster context the model was built from.
    pub ctx: &'a RosterContext,
    /// `work[e][d]`.
    pub work: Vec<Vec<BoolVar>>,
}

impl WorkGrid<'_> {
    /// Variable of employee `e` on day `d`.
    pub fn var(&self, e: usize, d: usize) -> BoolVar {
        self.work[e][d]
    }

    /// Sum of `work[e][from..from + len]`.
    pub fn window(&self, e: usize, from: usize, len: usize) -> LinearExpr {
        LinearExpr::sum(self.work[e][from..from + len].iter().copied())
    }
}

/// Penalizes each working day above a run limit inside a rolling window.
///
/// Applies to employees flagged `limit_consecutive_work` only.
#[derive(Debug, Clone)]
pub struct ConsecutiveWorkOverage {
    /// Window length (days).
    pub window: usize,
    /// Working days per window before penalties start.
    pub max_work: i64,
    /// Cost per extra working day.
    pub weight: i64,
}

impl<'a> SoftRule<WorkGrid<'a>> for ConsecutiveWorkOverage {
    fn name(&self) -> &'static str {
        "consecutive_work_overage"
    }

    fn description(&self) -> &'static str {
        "working days above the preferred run limit"
    }

    fn apply(&self, grid: &WorkGrid<'a>, acc: &mut ObjectiveAccumulator<'_>) {
        let days = grid.ctx.day_count();
        if self.window == 0 || days < self.window {
            return;
        }
        for e in 0..grid.ctx.employee_count() {
            if !grid.ctx.preferences(e).limit_consecutive_work {
                continue;
            }
            for from in 0..=days - self.window {
                acc.penalize_above(
                    format!("overage[{e},{from}]"),
                    grid.window(e, from, self.window),
                    self.max_work,
                    self.weight,
                );
            }
        }
    }
}

/// Penalizes a single working day between two rest days.
///
/// `work[d] - work[d-1] - work[d+1] <= 0` holds unless the pattern is
/// rest-work-rest.
#[derive(Debug, Clone)]
pub struct IsolatedWorkDay {
    /// Cost per isolated working day.
    pub weight: i64,
}

impl<'a> SoftRule<WorkGrid<'a>> for IsolatedWorkDay {
    fn name(&self) -> &'static str {
        "isolated_work_day"
    }

    fn description(&self) -> &'static str {
        "rest-work-rest patterns"
    }

    fn apply(&self, grid: &WorkGrid<'a>, acc: &mut ObjectiveAccumulator<'_>) {
        let days = grid.ctx.day_count();
        for e in 0..grid.ctx.employee_count() {
            for d in 1..days.saturating_sub(1) {
                let expr = LinearExpr::new()
                    .with_term(grid.var(e, d), 1)
                    .with_term(grid.var(e, d - 1), -1)
                    .with_term(grid.var(e, d + 1), -1);
                acc.penalize_above(format!("isolated[{e},{d}]"), expr, 0, self.weight);
            }
        }
    }
}

/// Penalizes working on a soft off-day.
#[derive(Debug, Clone)]
pub struct SoftLeaveRest {
    /// Cost per soft off-day worked.
    pub weight: i64,
}

impl<'a> SoftRule<WorkGrid<'a>> for SoftLeaveRest {
    fn name(&self) -> &'static str {
        "soft_leave_rest"
    }

    fn description(&self) -> &'static str {
        "soft off-days planned as working days"
    }

    fn apply(&self, grid: &WorkGrid<'a>, acc: &mut ObjectiveAccumulator<'_>) {
        for e in 0..grid.ctx.employee_count() {
            for d in 0..grid.ctx.day_count() {
                if grid.ctx.off_day(e, d) == Some(OffDayKind::Soft) {
                    acc.penalize_when_positive(
                        format!("soft_leave[{e},{d}]"),
                        LinearExpr::sum([grid.var(e, d)]),
                        self.weight,
                    );
                }
            }
        }
    }
}

/// Default off-day rules.
pub fn offday_rules<'a>(rest: &RestRules, weights: &PenaltyWeights) -> RuleSet<WorkGrid<'a>> {
    RuleSet::new()
        .with_rule(ConsecutiveWorkOverage {
            window: rest.preferred_run_window_days,
            max_work: i64::from(rest.preferred_run_max_work),
            weight: weights.consecutive_work_overage,
        })
        .with_rule(IsolatedWorkDay {
            weight: weights.isolated_work_day,
        })
        .with_rule(SoftLeaveRest {
            weight: weights.soft_leave,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::CpModel;
    use crate::models::{PreferenceFlags, RequestedOffDay};
    use crate::testing;

    fn grid_model(ctx: &RosterContext) -> (CpModel, WorkGrid<'_>) {
        let mut model = CpModel::new("offday");
        let work = (0..ctx.employee_count())
            .map(|e| {
                (0..ctx.day_count())
                    .map(|d| model.new_bool_var(format!("work[{e},{d}]")))
                    .collect()
            })
            .collect();
        (model, WorkGrid { ctx, work })
    }

    fn values(rows: &[&str]) -> Vec<bool> {
        rows.iter()
            .flat_map(|r| r.chars().map(|c| c == '1'))
            .collect()
    }

    #[test]
    fn test_isolated_work_day() {
        let ctx = testing::week_context();
        let (mut model, grid) = grid_model(&ctx);
        let summary = RuleSet::new()
            .with_rule(IsolatedWorkDay { weight: 1 })
            .apply(&grid, &mut model);
        // 4 employees x 5 interior days
        assert_eq!(summary.total(), 20);

        let v = values(&["0101110", "1111100", "0011111", "1010101"]);
        // Row 0: day 1. Row 3: days 2 and 4 (0 and 6 are edges).
        assert_eq!(model.evaluate(&v).objective, 3);
    }

    #[test]
    fn test_overage_only_for_flagged() {
        let mut doc = testing::week_document();
        doc.cycles[0].preferences.insert(
            "n01".into(),
            PreferenceFlags::default().with_limit_consecutive_work(true),
        );
        let ctx = testing::context_of(doc);
        let (mut model, grid) = grid_model(&ctx);
        let rule = ConsecutiveWorkOverage {
            window: 6,
            max_work: 5,
            weight: 1,
        };
        let summary = RuleSet::new().with_rule(rule).apply(&grid, &mut model);
        assert_eq!(summary.total(), 2);

        let v = values(&["1111111", "1111111", "0000000", "0000000"]);
        // Employee 0 pays 1 per window, employee 1 is not flagged.
        assert_eq!(model.evaluate(&v).objective, 2);
    }

    #[test]
    fn test_soft_leave_rest() {
        let mut doc = testing::week_document();
        doc.cycles[0].off_days.insert(
            "n02".into(),
            vec![RequestedOffDay {
                date: testing::date(3, 5),
                kind: OffDayKind::Soft,
            }],
        );
        let ctx = testing::context_of(doc);
        let (mut model, grid) = grid_model(&ctx);
        offday_rules(&RestRules::default(), &PenaltyWeights::default()).apply(&grid, &mut model);

        let mut v = values(&["0110110", "1001100", "0110011", "1001001"]);
        let before = model.objective_breakdown(&v);
        assert!(before.iter().all(|(rule, _)| *rule != "soft_leave_rest"));
        v[7 + 1] = true;
        let after = model.objective_breakdown(&v);
        assert!(after.contains(&("soft_leave_rest", 5)));
    }
}
