//! Two-phase roster generation.
//!
//! Phase 1 decides who works on which day; phase 2 assigns a shift type to
//! every working cell; a retry supervisor re-runs phase 2 until a schedule
//! passes independent verification or the attempt budget is spent.
//!
//! # Algorithm
//!
//! | Stage | Type | Model | Failure |
//! |-------|------|-------|---------|
//! | Off-day planning | [`OffDaySolver`] | `work[e][d]` booleans | fatal (`Phase1Infeasible`) |
//! | Shift assignment | [`ShiftTypeSolver`] | one-hot `{A,B,C}` per working cell | retried |
//! | Verification | [`VerificationEngine`](crate::verification::VerificationEngine) | none | retried |
//!
//! Decomposing by day first keeps each model small: phase 2 never has to
//! decide rest days, and phase 1 never sees shift types.
//!
//! # References
//!
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - Ernst et al. (2004), "Staff scheduling and rostering: A review of
//!   applications, methods and models"

mod diagnostics;
mod offday;
mod pipeline;
mod shift;
mod supervisor;

pub use diagnostics::{LeaveConflict, ShiftBalance, SupplyDemandSummary};
pub use offday::{default_offday_solver_config, OffDayCpBuilder, OffDayPlan, OffDaySolver};
pub use pipeline::{RosterResult, RosterScheduler};
pub use shift::{
    attempt_seed, default_shift_solver_config, PlanFailure, ShiftCpBuilder, ShiftPlan,
    ShiftPlanner, ShiftTypeSolver,
};
pub use supervisor::{
    AttemptFailure, AttemptRecord, RetrySupervisor, RosterOutcome, SupervisorState,
};
