//! Shift assignment rules.
//!
//! Rules over the shift layout: for every working cell of the work/off
//! matrix, one boolean per working shift type (exactly one of which is true).
//! Rest cells carry no variables.

use super::{ObjectiveAccumulator, RuleSet, SoftRule};
use crate::config::PenaltyWeights;
use crate::cp::{BoolVar, LinearExpr, Penalty};
use crate::loader::RosterContext;
use crate::models::{OffDayKind, ShiftType, WorkMatrix};

/// Shift-type variable layout of the shift model.
#[derive(Debug, Clone)]
pub struct ShiftGrid<'a> {
    /// Roster context the model was built from.
    pub ctx: &'a RosterContext,
    /// Work/off matrix the cells follow.
    pub matrix: &'a WorkMatrix,
    /// `cells[e][d]`: variables indexed like [`ShiftType::WORKING`], `None`
    /// on rest days.
    pub cells: Vec<Vec<Option<[BoolVar; 3]>>>,
}

impl ShiftGrid<'_> {
    /// Variable for `shift` in cell `(e, d)`, if the cell is a working day.
    pub fn var(&self, e: usize, d: usize, shift: ShiftType) -> Option<BoolVar> {
        let i = shift.working_index()?;
        self.cells[e][d].map(|c| c[i])
    }

    /// Headcount of `shift` on day `d`.
    pub fn day_expr(&self, d: usize, shift: ShiftType) -> LinearExpr {
        LinearExpr::sum((0..self.cells.len()).filter_map(|e| self.var(e, d, shift)))
    }

    /// Days of `shift` assigned to employee `e`.
    pub fn employee_expr(&self, e: usize, shift: ShiftType) -> LinearExpr {
        LinearExpr::sum((0..self.cells[e].len()).filter_map(|d| self.var(e, d, shift)))
    }

    fn night(&self, e: usize, d: usize) -> Option<BoolVar> {
        self.var(e, d, ShiftType::Night)
    }
}

/// Penalizes each person missing from a shift's daily requirement.
#[derive(Debug, Clone)]
pub struct StaffingShortfall {
    /// Cost per missing person.
    pub weight: i64,
}

impl<'a> SoftRule<ShiftGrid<'a>> for StaffingShortfall {
    fn name(&self) -> &'static str {
        "staffing_shortfall"
    }

    fn description(&self) -> &'static str {
        "shifts staffed below requirement"
    }

    fn apply(&self, grid: &ShiftGrid<'a>, acc: &mut ObjectiveAccumulator<'_>) {
        let table = grid.ctx.staffing();
        for d in 0..grid.ctx.day_count() {
            for shift in ShiftType::WORKING {
                let required = i64::from(table.required(d, shift));
                if required == 0 {
                    continue;
                }
                acc.penalize_below(
                    format!("shortfall[{d},{}]", shift.code()),
                    grid.day_expr(d, shift),
                    required,
                    self.weight,
                );
            }
        }
    }
}

/// Penalizes each person above a shift's daily requirement.
#[derive(Debug, Clone)]
pub struct StaffingSurplus {
    /// Cost per extra person.
    pub weight: i64,
}

impl<'a> SoftRule<ShiftGrid<'a>> for StaffingSurplus {
    fn name(&self) -> &'static str {
        "staffing_surplus"
    }

    fn description(&self) -> &'static str {
        "shifts staffed above requirement"
    }

    fn apply(&self, grid: &ShiftGrid<'a>, acc: &mut ObjectiveAccumulator<'_>) {
        let table = grid.ctx.staffing();
        for d in 0..grid.ctx.day_count() {
            for shift in ShiftType::WORKING {
                let expr = grid.day_expr(d, shift);
                if expr.is_empty() {
                    continue;
                }
                acc.penalize_above(
                    format!("surplus[{d},{}]", shift.code()),
                    expr,
                    i64::from(table.required(d, shift)),
                    self.weight,
                );
            }
        }
    }
}

/// Penalizes the distance between assigned days and each shift quota.
///
/// Deviations of 1, 2, 3… days cost `tiers[0]`, `tiers[1]`, … and every day
/// past the last tier adds `overflow`.
#[derive(Debug, Clone)]
pub struct QuotaDeviation {
    /// Cost of a deviation of exactly 1, 2, … days.
    pub tiers: Vec<i64>,
    /// Added cost per day past the last tier.
    pub overflow: i64,
}

impl<'a> SoftRule<ShiftGrid<'a>> for QuotaDeviation {
    fn name(&self) -> &'static str {
        "quota_deviation"
    }

    fn description(&self) -> &'static str {
        "shift counts away from quota"
    }

    fn apply(&self, grid: &ShiftGrid<'a>, acc: &mut ObjectiveAccumulator<'_>) {
        for e in 0..grid.ctx.employee_count() {
            let quota = grid.ctx.quota(e);
            for shift in ShiftType::WORKING {
                let target = quota.get(shift);
                // Zero-quota types are fixed off and cannot deviate.
                if target == 0 {
                    continue;
                }
                acc.penalize_deviation(
                    format!("quota[{e},{}]", shift.code()),
                    grid.employee_expr(e, shift),
                    i64::from(target),
                    Penalty::Tiered {
                        steps: self.tiers.clone(),
                        overflow_per_unit: self.overflow,
                    },
                );
            }
        }
    }
}

/// Records soft off-days that still fall on a working day.
///
/// Work/off is already fixed here, so the cost is constant per matrix; it
/// keeps the objective comparable across matrices.
#[derive(Debug, Clone)]
pub struct SoftLeaveOnWorkday {
    /// Cost per soft off-day worked.
    pub weight: i64,
}

impl<'a> SoftRule<ShiftGrid<'a>> for SoftLeaveOnWorkday {
    fn name(&self) -> &'static str {
        "soft_leave_on_workday"
    }

    fn apply(&self, grid: &ShiftGrid<'a>, acc: &mut ObjectiveAccumulator<'_>) {
        for req in grid.ctx.requests() {
            if req.kind != OffDayKind::Soft {
                continue;
            }
            let (e, d) = (req.employee, req.day);
            if let Some(cell) = grid.cells[e][d] {
                acc.penalize_when_positive(
                    format!("soft_leave[{e},{d}]"),
                    LinearExpr::sum(cell),
                    self.weight,
                );
            }
        }
    }
}

/// Penalizes a night shift with no night shift on either side.
///
/// Applies to employees flagged `prefer_continuous_night`.
#[derive(Debug, Clone)]
pub struct IsolatedNight {
    /// Cost per isolated night.
    pub weight: i64,
}

impl<'a> SoftRule<ShiftGrid<'a>> for IsolatedNight {
    fn name(&self) -> &'static str {
        "isolated_night"
    }

    fn description(&self) -> &'static str {
        "single night shifts"
    }

    fn apply(&self, grid: &ShiftGrid<'a>, acc: &mut ObjectiveAccumulator<'_>) {
        let days = grid.ctx.day_count();
        for e in 0..grid.ctx.employee_count() {
            if !grid.ctx.preferences(e).prefer_continuous_night {
                continue;
            }
            for d in 1..days.saturating_sub(1) {
                let Some(night) = grid.night(e, d) else {
                    continue;
                };
                let mut expr = LinearExpr::sum([night]);
                for neighbor in [d - 1, d + 1] {
                    if let Some(v) = grid.night(e, neighbor) {
                        expr.add_term(v, -1);
                    }
                }
                acc.penalize_above(format!("isolated_night[{e},{d}]"), expr, 0, self.weight);
            }
        }
    }
}

/// Penalizes a night shift followed by exactly one rest day.
///
/// Applies to employees flagged `prefer_double_rest_after_night`.
#[derive(Debug, Clone)]
pub struct NightBeforeSingleRest {
    /// Cost per night followed by a single rest day.
    pub weight: i64,
}

impl<'a> SoftRule<ShiftGrid<'a>> for NightBeforeSingleRest {
    fn name(&self) -> &'static str {
        "night_before_single_rest"
    }

    fn description(&self) -> &'static str {
        "night shift followed by one rest day only"
    }

    fn apply(&self, grid: &ShiftGrid<'a>, acc: &mut ObjectiveAccumulator<'_>) {
        let days = grid.ctx.day_count();
        for e in 0..grid.ctx.employee_count() {
            if !grid.ctx.preferences(e).prefer_double_rest_after_night {
                continue;
            }
            for d in 0..days.saturating_sub(2) {
                let single_rest = !grid.matrix.works(e, d + 1) && grid.matrix.works(e, d + 2);
                if !single_rest {
                    continue;
                }
                if let Some(night) = grid.night(e, d) {
                    acc.penalize_when_positive(
                        format!("single_rest[{e},{d}]"),
                        LinearExpr::sum([night]),
                        self.weight,
                    );
                }
            }
        }
    }
}

/// Default shift assignment rules.
pub fn shift_rules<'a>(weights: &PenaltyWeights) -> RuleSet<ShiftGrid<'a>> {
    RuleSet::new()
        .with_rule(StaffingShortfall {
            weight: weights.staffing_shortfall,
        })
        .with_rule(StaffingSurplus {
            weight: weights.staffing_surplus,
        })
        .with_rule(QuotaDeviation {
            tiers: weights.quota_deviation_tiers.clone(),
            overflow: weights.quota_deviation_overflow,
        })
        .with_rule(SoftLeaveOnWorkday {
            weight: weights.soft_leave_on_workday,
        })
        .with_rule(IsolatedNight {
            weight: weights.isolated_night,
        })
        .with_rule(NightBeforeSingleRest {
            weight: weights.night_before_single_rest,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::CpModel;
    use crate::models::{PreferenceFlags, RequestedOffDay};
    use crate::testing;

    use crate::testing::week_matrix as matrix;

    fn grid<'a>(
        ctx: &'a RosterContext,
        matrix: &'a WorkMatrix,
        model: &mut CpModel,
    ) -> ShiftGrid<'a> {
        let cells = (0..matrix.employee_count())
            .map(|e| {
                (0..matrix.day_count())
                    .map(|d| {
                        matrix.works(e, d).then(|| {
                            ShiftType::WORKING
                                .map(|s| model.new_bool_var(format!("x[{e},{d},{}]", s.code())))
                        })
                    })
                    .collect()
            })
            .collect();
        ShiftGrid { ctx, matrix, cells }
    }

    /// Assignment from code rows ('A', 'B', 'C' on working days).
    fn assign(grid: &ShiftGrid<'_>, model: &CpModel, rows: &[&str]) -> Vec<bool> {
        let mut values = vec![false; model.var_count()];
        for (e, row) in rows.iter().enumerate() {
            for (d, code) in row.chars().enumerate() {
                if let Some(shift) = ShiftType::from_code(&code.to_string()) {
                    if let Some(v) = grid.var(e, d, shift) {
                        values[v.index()] = true;
                    }
                }
            }
        }
        values
    }

    #[test]
    fn test_grid_skips_rest_days() {
        let ctx = testing::week_context();
        let m = matrix();
        let mut model = CpModel::new("shift");
        let g = grid(&ctx, &m, &mut model);
        assert_eq!(model.var_count(), 21 * 3);
        assert!(g.var(0, 2, ShiftType::Day).is_none());
        assert!(g.var(0, 2, ShiftType::Off).is_none());
        assert_eq!(g.day_expr(0, ShiftType::Night).terms().len(), 3);
    }

    #[test]
    fn test_staffing_shortfall_and_surplus() {
        let ctx = testing::week_context();
        let m = matrix();
        let mut model = CpModel::new("shift");
        let g = grid(&ctx, &m, &mut model);
        RuleSet::new()
            .with_rule(StaffingShortfall { weight: 100 })
            .with_rule(StaffingSurplus { weight: 30 })
            .apply(&g, &mut model);

        // Every day one A, one B, one C.
        let exact = assign(&g, &model, &["AB.AB.C", "BAA.AB.", ".CBB.AA", "C.CCCCB"]);
        assert_eq!(model.evaluate(&exact).objective, 0);

        // Day 0: two A, no C.
        let skewed = assign(&g, &model, &["AB.AB.C", "BAA.AB.", ".CBB.AA", "A.CCCCB"]);
        assert_eq!(
            model.objective_breakdown(&skewed),
            vec![("staffing_shortfall", 100), ("staffing_surplus", 30)]
        );
    }

    #[test]
    fn test_quota_deviation_tiers() {
        let ctx = testing::week_context();
        let m = matrix();
        let mut model = CpModel::new("shift");
        let g = grid(&ctx, &m, &mut model);
        let rule = QuotaDeviation {
            tiers: vec![15, 30, 50],
            overflow: 25,
        };
        RuleSet::new().with_rule(rule).apply(&g, &mut model);

        // Employee 0 (quota A2 B2 C1) works 5 days as all A: A +3, B -2, C -1.
        let values = assign(&g, &model, &["AA.AA.A", "...", "...", "..."]);
        let own: i64 = model
            .soft_terms()
            .iter()
            .filter(|t| t.name.starts_with("quota[0,"))
            .map(|t| t.cost(&values))
            .sum();
        assert_eq!(own, 50 + 30 + 15);
    }

    #[test]
    fn test_night_preferences() {
        let mut doc = testing::week_document();
        let flags = PreferenceFlags::default()
            .with_continuous_night(true)
            .with_double_rest_after_night(true);
        doc.cycles[0].preferences.insert("n04".into(), flags);
        let ctx = testing::context_of(doc);
        let m = matrix();
        let mut model = CpModel::new("shift");
        let g = grid(&ctx, &m, &mut model);
        let summary = shift_rules(&PenaltyWeights::default()).apply(&g, &mut model);
        // Employee 3 works 1011111: single rest after day 0 only.
        assert_eq!(summary.count("night_before_single_rest"), 1);

        let isolated = |row: &str| {
            let values = assign(&g, &model, &["", "", "", row]);
            model
                .objective_breakdown(&values)
                .into_iter()
                .filter(|(rule, _)| rule.contains("night"))
                .collect::<Vec<_>>()
        };
        // Night on day 0 before a single rest; night on day 3 alone.
        assert_eq!(
            isolated("C.AACBB"),
            vec![("isolated_night", 3), ("night_before_single_rest", 4)]
        );
        assert!(isolated("A.AACCC").is_empty());
    }

    #[test]
    fn test_soft_leave_on_workday() {
        let mut doc = testing::week_document();
        doc.cycles[0].off_days.insert(
            "n01".into(),
            vec![
                RequestedOffDay {
                    date: testing::date(3, 4),
                    kind: OffDayKind::Soft,
                },
                RequestedOffDay {
                    date: testing::date(3, 6),
                    kind: OffDayKind::Soft,
                },
            ],
        );
        let ctx = testing::context_of(doc);
        let m = matrix();
        let mut model = CpModel::new("shift");
        let g = grid(&ctx, &m, &mut model);
        let rule = SoftLeaveOnWorkday { weight: 5 };
        let summary = RuleSet::new().with_rule(rule).apply(&g, &mut model);
        // Day 2 is a rest day for employee 0.
        assert_eq!(summary.total(), 1);
    }
}
