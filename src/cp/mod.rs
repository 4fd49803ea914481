//! Constraint models and the solving capability behind them.
//!
//! The rostering stages describe their problems as a [`CpModel`]: boolean
//! decision variables, hard linear constraints over them, and soft terms
//! whose violation cost is minimized. Any [`CpSolver`] can solve such a
//! model; [`LocalSearchSolver`] is the built-in one.
//!
//! # Soft terms
//!
//! A soft term `expr cmp rhs` with penalty `p` stands for a non-negative
//! penalty variable `v ≥ violation(expr, rhs)` whose cost `p(v)` enters the
//! objective. Callers never create the penalty variable themselves.
//!
//! # Reference
//! - Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"
//! - Hoos & Stützle (2004), "Stochastic Local Search: Foundations and Applications"

mod model;
mod presolve;
mod search;
mod solver;

pub use model::{
    BoolVar, Comparison, CpModel, LinearConstraint, LinearExpr, ModelEvaluation, Penalty,
    SoftTerm,
};
pub use search::LocalSearchSolver;
pub use solver::{CpSolution, CpSolver, SolveStatus, SolverConfig};
