//! Crate error type.
//!
//! Covers failures that end a scheduling run. Failures the retry
//! supervisor handles itself (an infeasible shift assignment attempt, a
//! schedule failing verification) are values in
//! [`RosterOutcome`](crate::scheduler::RosterOutcome), not errors.

use thiserror::Error;

use crate::cp::SolveStatus;
use crate::loader::SourceError;
use crate::models::ScheduleParseError;
use crate::scheduler::SupplyDemandSummary;
use crate::validation::ValidationError;

/// A fatal scheduling failure.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Cycle not found, malformed date range or invalid settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Input data does not refer consistently to the roster.
    #[error("data error: {}", join_messages(.0))]
    Data(Vec<ValidationError>),

    /// Off-day planning found no feasible work/off assignment.
    #[error("off-day planning {status}: {reason}")]
    Phase1Infeasible {
        /// Solver status (`Infeasible` or `Timeout`).
        status: SolveStatus,
        /// Solver explanation.
        reason: String,
        /// Aggregate supply vs demand, to help adjust quotas.
        summary: Box<SupplyDemandSummary>,
    },

    /// A schedule payload could not be parsed.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(#[from] ScheduleParseError),

    /// The data source failed.
    #[error(transparent)]
    Source(#[from] SourceError),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result alias for fallible roster operations.
pub type Result<T> = std::result::Result<T, RosterError>;
