//! Immutable roster context shared by every pipeline stage.

use std::collections::BTreeMap;

use tracing::warn;

use crate::models::{
    Employee, HolidayCalendar, OffDayKind, OffDayRequest, PreferenceFlags, RequestedOffDay,
    RosterCycle, ShiftCounts, StaffingPolicy, StaffingTable,
};
use crate::validation::{validate_roster, RosterInputs, ValidationError};

/// Everything the solvers need about one cycle, resolved to indices.
///
/// Employees are addressed by their roster position `e` and dates by their
/// day index `d` within the cycle. Built once per run and never mutated.
#[derive(Debug, Clone)]
pub struct RosterContext {
    cycle: RosterCycle,
    employees: Vec<Employee>,
    quotas: Vec<ShiftCounts>,
    preferences: Vec<PreferenceFlags>,
    requests: Vec<OffDayRequest>,
    off_days: Vec<Vec<Option<OffDayKind>>>,
    policy: StaffingPolicy,
    holidays: HolidayCalendar,
    staffing: StaffingTable,
}

impl RosterContext {
    /// Validates raw inputs and resolves them against the cycle.
    ///
    /// Off-day requests dated outside the cycle are skipped with a warning.
    /// Employees without preference flags get all-false flags. When the same
    /// date is requested both hard and soft, the hard request wins.
    pub fn assemble(
        cycle: RosterCycle,
        employees: Vec<Employee>,
        quotas: &BTreeMap<String, ShiftCounts>,
        preferences: &BTreeMap<String, PreferenceFlags>,
        off_days: &BTreeMap<String, Vec<RequestedOffDay>>,
        policy: StaffingPolicy,
        holidays: HolidayCalendar,
    ) -> Result<Self, Vec<ValidationError>> {
        validate_roster(&RosterInputs {
            cycle: &cycle,
            employees: &employees,
            quotas,
            preferences,
            off_days,
            policy: &policy,
        })?;

        let day_count = cycle.day_count();
        let quota_rows = employees
            .iter()
            .map(|e| quotas.get(&e.name).copied().unwrap_or_default())
            .collect();
        let preference_rows = employees
            .iter()
            .map(|e| preferences.get(&e.name).copied().unwrap_or_default())
            .collect();

        let mut grid = vec![vec![None; day_count]; employees.len()];
        let mut requests = Vec::new();
        for (e, employee) in employees.iter().enumerate() {
            let Some(list) = off_days.get(&employee.name) else {
                continue;
            };
            for req in list {
                let Some(d) = cycle.index_of(req.date) else {
                    warn!(
                        cycle = cycle.id(),
                        employee = employee.name.as_str(),
                        date = %req.date,
                        "off-day request outside the cycle skipped"
                    );
                    continue;
                };
                let cell: &mut Option<OffDayKind> = &mut grid[e][d];
                *cell = match (*cell, req.kind) {
                    (Some(OffDayKind::Hard), _) | (_, OffDayKind::Hard) => Some(OffDayKind::Hard),
                    _ => Some(OffDayKind::Soft),
                };
                requests.push(OffDayRequest {
                    employee: e,
                    day: d,
                    date: req.date,
                    kind: req.kind,
                });
            }
        }

        let holidays = holidays.within(cycle.start_date(), cycle.end_date());
        let staffing = StaffingTable::resolve(&policy, &cycle, &holidays);

        Ok(Self {
            cycle,
            employees,
            quotas: quota_rows,
            preferences: preference_rows,
            requests,
            off_days: grid,
            policy,
            holidays,
            staffing,
        })
    }

    /// Planning cycle.
    pub fn cycle(&self) -> &RosterCycle {
        &self.cycle
    }

    /// Roster, in order.
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Number of employees.
    pub fn employee_count(&self) -> usize {
        self.employees.len()
    }

    /// Number of days in the cycle.
    pub fn day_count(&self) -> usize {
        self.cycle.day_count()
    }

    /// Roster position of an employee name.
    pub fn employee_index(&self, name: &str) -> Option<usize> {
        self.employees.iter().position(|e| e.name == name)
    }

    /// Employee names, in roster order.
    pub fn employee_names(&self) -> Vec<String> {
        self.employees.iter().map(|e| e.name.clone()).collect()
    }

    /// Shift quota of employee `e`.
    pub fn quota(&self, e: usize) -> ShiftCounts {
        self.quotas[e]
    }

    /// Required working days of employee `e`.
    pub fn total_quota(&self, e: usize) -> u32 {
        self.quotas[e].total()
    }

    /// Preference flags of employee `e`.
    pub fn preferences(&self, e: usize) -> PreferenceFlags {
        self.preferences[e]
    }

    /// Off-day requests inside the cycle.
    pub fn requests(&self) -> &[OffDayRequest] {
        &self.requests
    }

    /// Requested off-day kind for a cell, if any.
    pub fn off_day(&self, e: usize, d: usize) -> Option<OffDayKind> {
        self.off_days[e][d]
    }

    /// Number of hard off days of employee `e`.
    pub fn hard_off_count(&self, e: usize) -> usize {
        self.off_days[e]
            .iter()
            .filter(|k| matches!(k, Some(OffDayKind::Hard)))
            .count()
    }

    /// Staffing policy the table was resolved from.
    pub fn policy(&self) -> &StaffingPolicy {
        &self.policy
    }

    /// Holidays inside the cycle.
    pub fn holidays(&self) -> &HolidayCalendar {
        &self.holidays
    }

    /// Staffing requirements per day.
    pub fn staffing(&self) -> &StaffingTable {
        &self.staffing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn assemble(off_days: BTreeMap<String, Vec<RequestedOffDay>>) -> RosterContext {
        let cycle = RosterCycle::new("c", d(1), d(7)).unwrap();
        let employees = vec![Employee::new("1", "kim"), Employee::new("2", "lee")];
        let quotas = [
            ("kim".to_string(), ShiftCounts::new(2, 2, 1)),
            ("lee".to_string(), ShiftCounts::new(1, 2, 2)),
        ]
        .into_iter()
        .collect();
        let preferences = [(
            "lee".to_string(),
            PreferenceFlags::default().with_continuous_night(true),
        )]
        .into_iter()
        .collect();
        RosterContext::assemble(
            cycle,
            employees,
            &quotas,
            &preferences,
            &off_days,
            StaffingPolicy::standard(),
            HolidayCalendar::new().with_holiday(d(6)).with_holiday(d(20)),
        )
        .unwrap()
    }

    #[test]
    fn test_resolves_indices_and_defaults() {
        let ctx = assemble(BTreeMap::new());
        assert_eq!(ctx.employee_count(), 2);
        assert_eq!(ctx.day_count(), 7);
        assert_eq!(ctx.employee_index("lee"), Some(1));
        assert_eq!(ctx.total_quota(0), 5);
        assert!(!ctx.preferences(0).prefer_continuous_night);
        assert!(ctx.preferences(1).prefer_continuous_night);
        assert_eq!(ctx.holidays().len(), 1);
        assert!(ctx.staffing().day(5).substituted);
    }

    #[test]
    fn test_off_days_outside_cycle_skipped() {
        let off_days = [(
            "kim".to_string(),
            vec![
                RequestedOffDay {
                    date: d(2),
                    kind: OffDayKind::Hard,
                },
                RequestedOffDay {
                    date: d(15),
                    kind: OffDayKind::Hard,
                },
            ],
        )]
        .into_iter()
        .collect();
        let ctx = assemble(off_days);
        assert_eq!(ctx.requests().len(), 1);
        assert_eq!(ctx.off_day(0, 1), Some(OffDayKind::Hard));
        assert_eq!(ctx.hard_off_count(0), 1);
    }

    #[test]
    fn test_hard_request_wins_over_soft() {
        let off_days = [(
            "lee".to_string(),
            vec![
                RequestedOffDay {
                    date: d(3),
                    kind: OffDayKind::Hard,
                },
                RequestedOffDay {
                    date: d(3),
                    kind: OffDayKind::Soft,
                },
            ],
        )]
        .into_iter()
        .collect();
        let ctx = assemble(off_days);
        assert_eq!(ctx.off_day(1, 2), Some(OffDayKind::Hard));
    }
}
