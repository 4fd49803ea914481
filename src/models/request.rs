//! Pre-approved off-day requests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of off-day request.
///
/// Besides `hard` / `soft`, the labels used by the roster office are
/// accepted: `red-O`, `statutory`, `annual_leave` (hard) and `blue-O`,
/// `preferred` (soft).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OffDayKind {
    /// Must be honored: approved or statutory leave.
    #[serde(
        rename = "hard",
        alias = "hard_leave",
        alias = "red-O",
        alias = "statutory",
        alias = "annual_leave",
        alias = "紅O",
        alias = "特休"
    )]
    Hard,
    /// Preferred rest; penalized when not honored.
    #[serde(
        rename = "soft",
        alias = "soft_leave",
        alias = "blue-O",
        alias = "preferred",
        alias = "藍O"
    )]
    Soft,
}

impl OffDayKind {
    /// Whether the request must be honored.
    #[inline]
    pub fn is_hard(self) -> bool {
        matches!(self, OffDayKind::Hard)
    }
}

/// A requested off day, as listed under an employee in source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedOffDay {
    /// Requested date.
    pub date: NaiveDate,
    /// Hard or soft.
    pub kind: OffDayKind,
}

/// An off-day request resolved against the roster and cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffDayRequest {
    /// Employee index in the roster.
    pub employee: usize,
    /// Day index in the cycle.
    pub day: usize,
    /// Requested date.
    pub date: NaiveDate,
    /// Hard or soft.
    pub kind: OffDayKind,
}
