//! Solver interface.

use std::time::Duration;

use super::{BoolVar, CpModel};

/// Terminal status of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    /// Feasible, and the objective meets the proven lower bound.
    Optimal,
    /// Feasible, optimality not proven.
    Feasible,
    /// Proven to have no feasible assignment.
    Infeasible,
    /// Stopped before any feasible assignment was found.
    Timeout,
}

impl SolveStatus {
    /// Whether the solution satisfies every hard constraint.
    #[inline]
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Feasible => "feasible",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// Solver limits and search parameters.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Wall-clock budget.
    pub time_limit: Duration,
    /// Maximum number of search iterations. Unbounded by default, so the
    /// wall-clock budget ends the search.
    pub max_iterations: u64,
    /// Restart from a fresh random assignment after this many iterations
    /// without improving the best state.
    pub stall_iterations: u64,
    /// Random seed.
    pub seed: u64,
    /// Cost of one unit of hard-constraint violation during search.
    pub hard_weight: i64,
    /// Temperature at the start of each cooling round.
    pub initial_temperature: f64,
    /// Temperature at the end of each cooling round.
    pub final_temperature: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(60),
            max_iterations: u64::MAX,
            stall_iterations: 400_000,
            seed: 42,
            hard_weight: 1_000,
            initial_temperature: 10.0,
            final_temperature: 0.5,
        }
    }
}

impl SolverConfig {
    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    /// Sets the iteration limit.
    pub fn with_max_iterations(mut self, n: u64) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the restart interval.
    pub fn with_stall_iterations(mut self, n: u64) -> Self {
        self.stall_iterations = n;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the hard-violation weight.
    pub fn with_hard_weight(mut self, weight: i64) -> Self {
        self.hard_weight = weight;
        self
    }

    /// Sets the annealing temperature range.
    pub fn with_temperatures(mut self, initial: f64, final_: f64) -> Self {
        self.initial_temperature = initial;
        self.final_temperature = final_;
        self
    }
}

/// Result of a solve call.
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Terminal status.
    pub status: SolveStatus,
    /// Best assignment found (meaningful only when `status.has_solution()`).
    pub values: Vec<bool>,
    /// Objective of `values`.
    pub objective: i64,
    /// Proven lower bound on the objective.
    pub lower_bound: i64,
    /// Iterations performed.
    pub iterations: u64,
    /// Time spent.
    pub elapsed: Duration,
    /// Why no solution was produced, if applicable.
    pub reason: Option<String>,
}

impl CpSolution {
    /// A solution without an assignment.
    pub fn failed(status: SolveStatus, var_count: usize, reason: impl Into<String>) -> Self {
        Self {
            status,
            values: vec![false; var_count],
            objective: 0,
            lower_bound: 0,
            iterations: 0,
            elapsed: Duration::ZERO,
            reason: Some(reason.into()),
        }
    }

    /// Value of a variable.
    #[inline]
    pub fn value(&self, var: BoolVar) -> bool {
        self.values[var.index()]
    }
}

/// A solving capability for [`CpModel`]s.
///
/// Implementations must not keep state between calls: every call builds
/// its own search state from the model.
pub trait CpSolver {
    /// Solves a model within the configured limits.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}
