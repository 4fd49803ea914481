//! Verification report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rule categories checked by verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCategory {
    /// Exact daily headcount per shift type.
    DailyStaffing,
    /// Maximum run of consecutive working days.
    ContinuousWork,
    /// Night shift followed by Night or Off.
    ShiftConnection,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleCategory::DailyStaffing => "daily_staffing",
            RuleCategory::ContinuousWork => "continuous_work",
            RuleCategory::ShiftConnection => "shift_connection",
        };
        f.write_str(name)
    }
}

/// Pass/fail result and violation messages per rule category.
///
/// Field names match the diagnostic payload handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Daily staffing passed.
    pub daily_staffing_passed: bool,
    /// Daily staffing violations.
    pub daily_staffing_details: Vec<String>,
    /// Continuous work passed.
    pub continuous_work_passed: bool,
    /// Continuous work violations.
    pub continuous_work_details: Vec<String>,
    /// Shift connection passed.
    pub shift_connection_passed: bool,
    /// Shift connection violations.
    pub shift_connection_details: Vec<String>,
}

impl VerificationReport {
    /// Builds a report; a category passes iff it has no details.
    pub fn from_details(
        daily_staffing_details: Vec<String>,
        continuous_work_details: Vec<String>,
        shift_connection_details: Vec<String>,
    ) -> Self {
        Self {
            daily_staffing_passed: daily_staffing_details.is_empty(),
            daily_staffing_details,
            continuous_work_passed: continuous_work_details.is_empty(),
            continuous_work_details,
            shift_connection_passed: shift_connection_details.is_empty(),
            shift_connection_details,
        }
    }

    /// Whether every category passed.
    pub fn passed(&self) -> bool {
        self.daily_staffing_passed && self.continuous_work_passed && self.shift_connection_passed
    }

    /// Categories that failed.
    pub fn failed_categories(&self) -> Vec<RuleCategory> {
        let mut failed = Vec::new();
        if !self.daily_staffing_passed {
            failed.push(RuleCategory::DailyStaffing);
        }
        if !self.continuous_work_passed {
            failed.push(RuleCategory::ContinuousWork);
        }
        if !self.shift_connection_passed {
            failed.push(RuleCategory::ShiftConnection);
        }
        failed
    }

    /// Details of one category.
    pub fn details(&self, category: RuleCategory) -> &[String] {
        match category {
            RuleCategory::DailyStaffing => &self.daily_staffing_details,
            RuleCategory::ContinuousWork => &self.continuous_work_details,
            RuleCategory::ShiftConnection => &self.shift_connection_details,
        }
    }

    /// Total number of violation messages.
    pub fn violation_count(&self) -> usize {
        self.daily_staffing_details.len()
            + self.continuous_work_details.len()
            + self.shift_connection_details.len()
    }
}
