//! Input validation for rostering problems.
//!
//! Checks referential integrity of the roster inputs before any model is
//! built. Detects:
//! - Empty or duplicate roster entries
//! - Quotas, preferences or off-day requests naming unknown employees
//! - Employees without a quota
//! - Quotas that do not fit in the cycle
//! - Staffing policies missing a weekday row

use std::collections::{BTreeMap, HashSet};

use crate::models::{
    Employee, PreferenceFlags, RequestedOffDay, RosterCycle, ShiftCounts, StaffingPolicy,
};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The roster has no employees.
    EmptyRoster,
    /// Two employees share a name or id.
    DuplicateEmployee,
    /// An input entry names an employee not on the roster.
    UnknownEmployee,
    /// An employee has no shift quota.
    MissingQuota,
    /// An employee's quota exceeds the number of days in the cycle.
    QuotaExceedsCycle,
    /// The staffing policy lacks a row for some weekday.
    MissingStaffingRow,
}

impl ValidationError {
    /// Creates an error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Roster inputs as fetched from a data source, keyed by employee name.
#[derive(Debug, Clone, Copy)]
pub struct RosterInputs<'a> {
    /// Planning cycle.
    pub cycle: &'a RosterCycle,
    /// Roster, in order.
    pub employees: &'a [Employee],
    /// Shift quotas.
    pub quotas: &'a BTreeMap<String, ShiftCounts>,
    /// Preference flags.
    pub preferences: &'a BTreeMap<String, PreferenceFlags>,
    /// Off-day requests.
    pub off_days: &'a BTreeMap<String, Vec<RequestedOffDay>>,
    /// Staffing policy.
    pub policy: &'a StaffingPolicy,
}

/// Validates roster inputs.
///
/// Checks:
/// 1. The roster is not empty
/// 2. No duplicate employee names or ids
/// 3. Quotas, preferences and off-day requests only name rostered employees
/// 4. Every employee has a quota
/// 5. No quota total exceeds the cycle length
/// 6. The staffing policy has all seven weekday rows
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_roster(inputs: &RosterInputs<'_>) -> ValidationResult {
    let mut errors = Vec::new();

    if inputs.employees.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyRoster,
            format!("Cycle '{}' has no employees", inputs.cycle.id()),
        ));
    }

    let mut names = HashSet::new();
    let mut ids = HashSet::new();
    for e in inputs.employees {
        if !names.insert(e.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateEmployee,
                format!("Duplicate employee name: {}", e.name),
            ));
        }
        if !ids.insert(e.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateEmployee,
                format!("Duplicate employee id: {}", e.id),
            ));
        }
    }

    unknown_references("Shift quota", inputs.quotas.keys(), &names, &mut errors);
    unknown_references("Preference", inputs.preferences.keys(), &names, &mut errors);
    unknown_references("Off-day request", inputs.off_days.keys(), &names, &mut errors);

    let day_count = inputs.cycle.day_count();
    for e in inputs.employees {
        match inputs.quotas.get(&e.name) {
            None => errors.push(ValidationError::new(
                ValidationErrorKind::MissingQuota,
                format!("Employee '{}' has no shift quota", e.name),
            )),
            Some(q) if q.total() as usize > day_count => errors.push(ValidationError::new(
                ValidationErrorKind::QuotaExceedsCycle,
                format!(
                    "Employee '{}' quota totals {} days but the cycle has {}",
                    e.name,
                    q.total(),
                    day_count
                ),
            )),
            Some(_) => {}
        }
    }

    let missing = inputs.policy.missing_rows();
    if !missing.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::MissingStaffingRow,
            format!(
                "Staffing policy '{}' has no row for weekday(s) {:?}",
                inputs.policy.name, missing
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn unknown_references<'a>(
    what: &str,
    keys: impl Iterator<Item = &'a String>,
    names: &HashSet<&str>,
    errors: &mut Vec<ValidationError>,
) {
    for name in keys {
        if !names.contains(name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownEmployee,
                format!("{what} references unknown employee '{name}'"),
            ));
        }
    }
}
