//! Shift-type assignment.
//!
//! # Model
//!
//! For every working cell `(e, d)` of the work/off matrix, one boolean per
//! working shift type. Rest cells get no variables and become `Off`.
//!
//! Hard constraints:
//! - exactly one shift type per working cell
//! - a shift type with zero quota is never assigned to that employee
//! - handoff: no forbidden pair on consecutive working days
//!   (by default Night→Day, Night→Evening and Evening→Day)
//!
//! Staffing targets and quotas are soft (see
//! [`shift_rules`](crate::rules::shift::shift_rules)), so the model stays
//! feasible under tight quota/staffing tension.
//!
//! Every call to [`ShiftPlanner::plan`] builds a new model; nothing is
//! carried over between attempts.

use std::time::{Duration, Instant};

use tracing::info;

use crate::config::SchedulerConfig;
use crate::cp::{CpModel, CpSolver, LocalSearchSolver, SolveStatus, SolverConfig};
use crate::loader::RosterContext;
use crate::models::{HandoffRules, ShiftSchedule, ShiftType, WorkMatrix};
use crate::rules::shift::shift_rules;
use crate::rules::{RuleSet, RuleSummary, ShiftGrid};

const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Solver settings used when the configuration leaves a field unset.
pub fn default_shift_solver_config() -> SolverConfig {
    SolverConfig::default()
        .with_time_limit(Duration::from_secs(300))
        .with_hard_weight(1_000)
        .with_temperatures(60.0, 1.0)
}

/// Seed of a numbered attempt (1-based); attempt 1 uses `base` itself.
pub fn attempt_seed(base: u64, attempt: u32) -> u64 {
    base.wrapping_add(u64::from(attempt.saturating_sub(1)).wrapping_mul(SEED_STRIDE))
}

/// A shift schedule produced by one attempt.
#[derive(Debug, Clone)]
pub struct ShiftPlan {
    /// The schedule.
    pub schedule: ShiftSchedule,
    /// Solver status (`Optimal` or `Feasible`).
    pub status: SolveStatus,
    /// Objective value.
    pub objective: i64,
    /// Objective cost per soft rule.
    pub breakdown: Vec<(&'static str, i64)>,
    /// Seed the attempt ran with.
    pub seed: u64,
    /// Wall-clock time including model building.
    pub elapsed: Duration,
}

impl ShiftPlan {
    /// A plan carrying only a schedule, for planners that do not optimize.
    pub fn from_schedule(schedule: ShiftSchedule) -> Self {
        Self {
            schedule,
            status: SolveStatus::Feasible,
            objective: 0,
            breakdown: Vec::new(),
            seed: 0,
            elapsed: Duration::ZERO,
        }
    }
}

/// Why an attempt produced no schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanFailure {
    /// Solver status (`Infeasible` or `Timeout`).
    pub status: SolveStatus,
    /// Explanation.
    pub reason: String,
}

/// Produces a shift schedule for a fixed work/off matrix.
///
/// `attempt` is 1-based. Implementations must not keep state between
/// calls.
pub trait ShiftPlanner {
    /// Plans one attempt.
    fn plan(
        &self,
        ctx: &RosterContext,
        matrix: &WorkMatrix,
        attempt: u32,
    ) -> Result<ShiftPlan, PlanFailure>;
}

/// Builds the shift model of a context and work/off matrix.
pub struct ShiftCpBuilder<'a> {
    ctx: &'a RosterContext,
    matrix: &'a WorkMatrix,
    handoff: HandoffRules,
    rules: RuleSet<ShiftGrid<'a>>,
}

impl<'a> ShiftCpBuilder<'a> {
    /// Builder with standard handoff rules and the given soft rules.
    pub fn new(
        ctx: &'a RosterContext,
        matrix: &'a WorkMatrix,
        rules: RuleSet<ShiftGrid<'a>>,
    ) -> Self {
        Self {
            ctx,
            matrix,
            handoff: HandoffRules::standard(),
            rules,
        }
    }

    /// Replaces the handoff rules.
    pub fn with_handoff(mut self, handoff: HandoffRules) -> Self {
        self.handoff = handoff;
        self
    }

    /// Creates a fresh model with its variable layout.
    pub fn build(&self) -> (CpModel, ShiftGrid<'a>, RuleSummary) {
        let (ctx, matrix) = (self.ctx, self.matrix);
        let days = matrix.day_count();
        let mut model = CpModel::new(format!("shift {}", ctx.cycle().id()));

        let cells: Vec<Vec<_>> = (0..matrix.employee_count())
            .map(|e| {
                (0..days)
                    .map(|d| {
                        matrix.works(e, d).then(|| {
                            ShiftType::WORKING
                                .map(|s| model.new_bool_var(format!("x[{e},{d},{}]", s.code())))
                        })
                    })
                    .collect()
            })
            .collect();

        for (e, row) in cells.iter().enumerate() {
            let quota = ctx.quota(e);
            for (d, cell) in row.iter().enumerate() {
                let Some(vars) = cell else { continue };
                model.add_exactly(format!("one_shift[{e},{d}]"), vars, 1);
                for (i, shift) in ShiftType::WORKING.iter().enumerate() {
                    if quota.get(*shift) == 0 {
                        model.fix(vars[i], false);
                    }
                }
            }
        }

        let grid = ShiftGrid { ctx, matrix, cells };
        for e in 0..matrix.employee_count() {
            for d in 0..days.saturating_sub(1) {
                for &(from, to) in self.handoff.forbidden_pairs() {
                    if let (Some(a), Some(b)) = (grid.var(e, d, from), grid.var(e, d + 1, to)) {
                        model.add_at_most(
                            format!("handoff[{e},{d},{}{}]", from.code(), to.code()),
                            &[a, b],
                            1,
                        );
                    }
                }
            }
        }

        let summary = self.rules.apply(&grid, &mut model);
        (model, grid, summary)
    }
}

/// The CP-backed [`ShiftPlanner`].
#[derive(Debug, Clone)]
pub struct ShiftTypeSolver<S = LocalSearchSolver> {
    solver: S,
    solver_config: SolverConfig,
    handoff: HandoffRules,
    config: SchedulerConfig,
}

impl ShiftTypeSolver {
    /// Solver using the local search backend and standard handoff rules.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            solver: LocalSearchSolver,
            solver_config: config.shift_solver.resolve(&default_shift_solver_config()),
            handoff: HandoffRules::standard(),
            config: config.clone(),
        }
    }
}

impl<S: CpSolver> ShiftTypeSolver<S> {
    /// Swaps the solving backend.
    pub fn with_solver<T: CpSolver>(self, solver: T) -> ShiftTypeSolver<T> {
        ShiftTypeSolver {
            solver,
            solver_config: self.solver_config,
            handoff: self.handoff,
            config: self.config,
        }
    }

    /// Replaces the handoff rules.
    pub fn with_handoff(mut self, handoff: HandoffRules) -> Self {
        self.handoff = handoff;
        self
    }

    /// Effective solver settings (before per-attempt seeding).
    pub fn solver_config(&self) -> &SolverConfig {
        &self.solver_config
    }
}

impl<S: CpSolver> ShiftPlanner for ShiftTypeSolver<S> {
    fn plan(
        &self,
        ctx: &RosterContext,
        matrix: &WorkMatrix,
        attempt: u32,
    ) -> Result<ShiftPlan, PlanFailure> {
        let start = Instant::now();
        let builder = ShiftCpBuilder::new(ctx, matrix, shift_rules(&self.config.weights))
            .with_handoff(self.handoff.clone());
        let (model, grid, rules) = builder.build();

        let seed = attempt_seed(self.solver_config.seed, attempt);
        let solver_config = self.solver_config.clone().with_seed(seed);
        info!(
            cycle = ctx.cycle().id(),
            attempt,
            seed,
            vars = model.var_count(),
            constraints = model.constraint_count(),
            soft_terms = rules.total(),
            "shift model built"
        );

        let solution = self.solver.solve(&model, &solver_config);
        if !solution.status.has_solution() {
            return Err(PlanFailure {
                status: solution.status,
                reason: solution
                    .reason
                    .unwrap_or_else(|| "no feasible shift assignment".to_string()),
            });
        }

        let mut rows = Vec::with_capacity(matrix.employee_count());
        for (e, row) in grid.cells.iter().enumerate() {
            let mut shifts = Vec::with_capacity(row.len());
            for (d, cell) in row.iter().enumerate() {
                let shift = match cell {
                    None => ShiftType::Off,
                    Some(vars) => ShiftType::WORKING
                        .into_iter()
                        .zip(vars)
                        .find(|(_, v)| solution.value(**v))
                        .map(|(s, _)| s)
                        .ok_or_else(|| PlanFailure {
                            status: SolveStatus::Infeasible,
                            reason: format!("working cell ({e},{d}) has no shift"),
                        })?,
                };
                shifts.push(shift);
            }
            rows.push(shifts);
        }

        let schedule = ShiftSchedule::new(ctx.cycle().dates(), ctx.employee_names(), rows)
            .ok_or_else(|| PlanFailure {
                status: SolveStatus::Infeasible,
                reason: "schedule shape does not match the cycle".to_string(),
            })?;

        let plan = ShiftPlan {
            schedule,
            status: solution.status,
            objective: solution.objective,
            breakdown: model.objective_breakdown(&solution.values),
            seed,
            elapsed: start.elapsed(),
        };
        info!(
            cycle = ctx.cycle().id(),
            attempt,
            status = %plan.status,
            objective = plan.objective,
            elapsed_ms = plan.elapsed.as_millis() as u64,
            "shift plan ready"
        );
        Ok(plan)
    }
}
