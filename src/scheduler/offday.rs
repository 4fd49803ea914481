//! Off-day planning (work/off assignment).
//!
//! # Model
//!
//! One boolean `work[e][d]` per employee and day.
//!
//! Hard constraints:
//! - hard off-day requests force `work[e][d] = false`
//! - daily headcount: `Σ_e work[e][d] ≥ required_headcount(d)`
//! - type coverage: for every non-empty set `S` of shift types,
//!   `Σ_{e: quota_S(e) > 0} work[e][d] ≥ Σ_{s∈S} required_s(d)`, so the
//!   people on duty can take every required shift type (Hall's condition).
//!   Sets every employee qualifies for are implied by the headcount and
//!   skipped.
//! - quota: `Σ_d work[e][d] = total_quota(e)`
//! - rest windows: at most 6 working days in any 7, at most 12 in any 14
//!
//! Soft rules come from a [`RuleSet`] over [`WorkGrid`]
//! (see [`offday_rules`](crate::rules::offday::offday_rules)).
//!
//! Failure here ends the run: no shift assignment can repair a day-level
//! plan that does not exist.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::SupplyDemandSummary;
use crate::config::{RestRules, SchedulerConfig};
use crate::cp::{BoolVar, CpModel, CpSolver, LocalSearchSolver, SolveStatus, SolverConfig};
use crate::error::{Result, RosterError};
use crate::loader::RosterContext;
use crate::models::{OffDayKind, ShiftType, WorkMatrix};
use crate::rules::offday::offday_rules;
use crate::rules::{RuleSet, RuleSummary, WorkGrid};

/// Solver settings used when the configuration leaves a field unset.
pub fn default_offday_solver_config() -> SolverConfig {
    SolverConfig::default()
        .with_time_limit(Duration::from_secs(120))
        .with_hard_weight(50)
        .with_temperatures(3.0, 0.1)
}

/// Builds the off-day model of a context.
pub struct OffDayCpBuilder<'a> {
    ctx: &'a RosterContext,
    rest: RestRules,
    rules: RuleSet<WorkGrid<'a>>,
}

impl<'a> OffDayCpBuilder<'a> {
    /// Builder with the configured rest rules and default soft rules.
    pub fn new(ctx: &'a RosterContext, config: &SchedulerConfig) -> Self {
        Self {
            ctx,
            rest: config.rest.clone(),
            rules: offday_rules(&config.rest, &config.weights),
        }
    }

    /// Replaces the soft rules.
    pub fn with_rules(mut self, rules: RuleSet<WorkGrid<'a>>) -> Self {
        self.rules = rules;
        self
    }

    /// Creates a fresh model with its variable layout.
    pub fn build(&self) -> (CpModel, WorkGrid<'a>, RuleSummary) {
        let ctx = self.ctx;
        let days = ctx.day_count();
        let mut model = CpModel::new(format!("offday {}", ctx.cycle().id()));

        let work: Vec<Vec<_>> = (0..ctx.employee_count())
            .map(|e| {
                (0..days)
                    .map(|d| model.new_bool_var(format!("work[{e},{d}]")))
                    .collect()
            })
            .collect();

        for (e, row) in work.iter().enumerate() {
            for (d, &var) in row.iter().enumerate() {
                if ctx.off_day(e, d) == Some(OffDayKind::Hard) {
                    model.fix(var, false);
                }
            }
            model.add_exactly(format!("quota[{e}]"), row, i64::from(ctx.total_quota(e)));
            self.add_window(&mut model, e, row, self.rest.short_window_days, self.rest.short_window_max_work);
            self.add_window(&mut model, e, row, self.rest.long_window_days, self.rest.long_window_max_work);
        }

        for d in 0..days {
            let on_day: Vec<_> = work.iter().map(|row| row[d]).collect();
            let required = i64::from(ctx.staffing().required_headcount(d));
            model.add_at_least(format!("headcount[{d}]"), &on_day, required);
            self.add_type_coverage(&mut model, d, &on_day);
        }

        let grid = WorkGrid { ctx, work };
        let summary = self.rules.apply(&grid, &mut model);
        (model, grid, summary)
    }

    fn add_type_coverage(&self, model: &mut CpModel, d: usize, on_day: &[BoolVar]) {
        let ctx = self.ctx;
        for mask in 1u8..8 {
            let shifts: Vec<ShiftType> = ShiftType::WORKING
                .into_iter()
                .enumerate()
                .filter(|&(i, _)| mask & (1 << i) != 0)
                .map(|(_, s)| s)
                .collect();
            let required: u32 = shifts.iter().map(|&s| ctx.staffing().required(d, s)).sum();
            if required == 0 {
                continue;
            }
            let eligible: Vec<BoolVar> = on_day
                .iter()
                .enumerate()
                .filter(|&(e, _)| shifts.iter().any(|&s| ctx.quota(e).get(s) > 0))
                .map(|(_, &v)| v)
                .collect();
            if eligible.len() == on_day.len() {
                continue;
            }
            let codes: String = shifts.iter().map(|s| s.code()).collect();
            model.add_at_least(
                format!("coverage[{d},{codes}]"),
                &eligible,
                i64::from(required),
            );
        }
    }

    fn add_window(
        &self,
        model: &mut CpModel,
        e: usize,
        row: &[BoolVar],
        len: usize,
        max_work: u32,
    ) {
        if len == 0 || row.len() < len {
            return;
        }
        for from in 0..=row.len() - len {
            model.add_at_most(
                format!("rest{len}[{e},{from}]"),
                &row[from..from + len],
                i64::from(max_work),
            );
        }
    }
}

/// A solved work/off plan.
#[derive(Debug, Clone)]
pub struct OffDayPlan {
    /// Work/off matrix.
    pub matrix: WorkMatrix,
    /// Solver status (`Optimal` or `Feasible`).
    pub status: SolveStatus,
    /// Objective value.
    pub objective: i64,
    /// Proven lower bound on the objective.
    pub lower_bound: i64,
    /// Objective cost per soft rule.
    pub breakdown: Vec<(&'static str, i64)>,
    /// Search iterations.
    pub iterations: u64,
    /// Wall-clock time including model building.
    pub elapsed: Duration,
}

/// Solves the off-day model.
///
/// # Example
/// ```no_run
/// use u_roster::config::SchedulerConfig;
/// use u_roster::loader::{InMemorySource, RosterLoader};
/// use u_roster::scheduler::OffDaySolver;
///
/// let loader = RosterLoader::new(InMemorySource::from_json_file("roster.json").unwrap());
/// let ctx = loader.load("2024-03").unwrap();
/// let plan = OffDaySolver::new(&SchedulerConfig::default()).solve(&ctx).unwrap();
/// println!("{} ({})", plan.status, plan.objective);
/// ```
#[derive(Debug, Clone)]
pub struct OffDaySolver<S = LocalSearchSolver> {
    solver: S,
    solver_config: SolverConfig,
    config: SchedulerConfig,
}

impl OffDaySolver {
    /// Solver using the local search backend.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            solver: LocalSearchSolver,
            solver_config: config.offday_solver.resolve(&default_offday_solver_config()),
            config: config.clone(),
        }
    }
}

impl<S: CpSolver> OffDaySolver<S> {
    /// Swaps the solving backend.
    pub fn with_solver<T: CpSolver>(self, solver: T) -> OffDaySolver<T> {
        OffDaySolver {
            solver,
            solver_config: self.solver_config,
            config: self.config,
        }
    }

    /// Effective solver settings.
    pub fn solver_config(&self) -> &SolverConfig {
        &self.solver_config
    }

    /// Plans work and rest days.
    ///
    /// # Errors
    /// `Phase1Infeasible` with a supply/demand summary when no plan exists
    /// or none was found within the budget.
    pub fn solve(&self, ctx: &RosterContext) -> Result<OffDayPlan> {
        let start = Instant::now();
        let (model, grid, rules) = OffDayCpBuilder::new(ctx, &self.config).build();
        info!(
            cycle = ctx.cycle().id(),
            vars = model.var_count(),
            constraints = model.constraint_count(),
            soft_terms = rules.total(),
            "off-day model built"
        );

        let solution = self.solver.solve(&model, &self.solver_config);
        if !solution.status.has_solution() {
            let summary = SupplyDemandSummary::calculate(ctx);
            let reason = solution
                .reason
                .unwrap_or_else(|| "no feasible work/off assignment".to_string());
            warn!(
                cycle = ctx.cycle().id(),
                status = %solution.status,
                reason = reason.as_str(),
                summary = %summary,
                "off-day planning failed"
            );
            return Err(RosterError::Phase1Infeasible {
                status: solution.status,
                reason,
                summary: Box::new(summary),
            });
        }

        let rows = grid
            .work
            .iter()
            .map(|row| row.iter().map(|&v| solution.value(v)).collect())
            .collect();
        let matrix = WorkMatrix::from_rows(rows, ctx.day_count()).ok_or_else(|| {
            RosterError::Configuration("work matrix does not match the cycle".to_string())
        })?;

        let plan = OffDayPlan {
            matrix,
            status: solution.status,
            objective: solution.objective,
            lower_bound: solution.lower_bound,
            breakdown: model.objective_breakdown(&solution.values),
            iterations: solution.iterations,
            elapsed: start.elapsed(),
        };
        info!(
            cycle = ctx.cycle().id(),
            status = %plan.status,
            objective = plan.objective,
            lower_bound = plan.lower_bound,
            elapsed_ms = plan.elapsed.as_millis() as u64,
            "off-day plan ready"
        );
        Ok(plan)
    }
}
