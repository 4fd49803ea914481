//! Roster fixtures shared by unit tests.

use chrono::NaiveDate;

use crate::config::{SchedulerConfig, SolveBudget};
use crate::loader::{CycleDocument, InMemorySource, RosterContext, RosterDocument, RosterLoader};
use crate::models::{Employee, ShiftCounts, StaffingPolicy, WorkMatrix};

/// Cycle of [`scenario_a_document`].
pub(crate) const CYCLE_ID: &str = "2024-03";

/// Cycle of [`week_document`].
pub(crate) const WEEK_ID: &str = "2024-w10";

pub(crate) fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn employees(n: usize) -> Vec<Employee> {
    (0..n)
        .map(|i| Employee::new(format!("{}", i + 1), format!("n{:02}", i + 1)))
        .collect()
}

fn cycle(id: &str, start: NaiveDate, end: NaiveDate, roster: &[Employee]) -> CycleDocument {
    CycleDocument {
        cycle_id: id.into(),
        start_date: start,
        end_date: end,
        employees: roster.to_vec(),
        shift_quotas: Default::default(),
        preferences: Default::default(),
        off_days: Default::default(),
        staffing_policy: StaffingPolicy::standard(),
    }
}

/// Nine nurses over March 2024, two per shift type every day, quotas
/// summing exactly to demand (62 per type), no off-day requests.
pub(crate) fn scenario_a_document() -> RosterDocument {
    let roster = employees(9);
    let mut cycle = cycle(CYCLE_ID, date(3, 1), date(3, 31), &roster);
    cycle.staffing_policy = StaffingPolicy::uniform("ward", ShiftCounts::new(2, 2, 2));
    let quotas = [
        ShiftCounts::new(7, 7, 7),
        ShiftCounts::new(7, 7, 7),
        ShiftCounts::new(7, 7, 7),
        ShiftCounts::new(7, 7, 7),
        ShiftCounts::new(7, 7, 7),
        ShiftCounts::new(7, 7, 7),
        ShiftCounts::new(7, 7, 6),
        ShiftCounts::new(7, 6, 7),
        ShiftCounts::new(6, 7, 7),
    ];
    cycle.shift_quotas = roster
        .iter()
        .zip(quotas)
        .map(|(e, q)| (e.name.clone(), q))
        .collect();
    RosterDocument {
        cycles: vec![cycle],
        holidays: Default::default(),
    }
}

/// Nine nurses over March 2024 under the standard ward policy (weekdays
/// A3/B2/C1, Saturday A2/B1/C1, Sunday A1/B1/C1). Quotas total A78/B52/C31,
/// exactly the demand, and several nurses have zero quota for some types.
pub(crate) fn standard_month_document() -> RosterDocument {
    let roster = employees(9);
    let mut cycle = cycle(CYCLE_ID, date(3, 1), date(3, 31), &roster);
    let quotas = [
        ShiftCounts::new(4, 0, 0),
        ShiftCounts::new(11, 6, 3),
        ShiftCounts::new(12, 7, 0),
        ShiftCounts::new(13, 7, 0),
        ShiftCounts::new(11, 6, 3),
        ShiftCounts::new(9, 8, 4),
        ShiftCounts::new(10, 11, 0),
        ShiftCounts::new(4, 0, 15),
        ShiftCounts::new(4, 7, 6),
    ];
    cycle.shift_quotas = roster
        .iter()
        .zip(quotas)
        .map(|(e, q)| (e.name.clone(), q))
        .collect();
    RosterDocument {
        cycles: vec![cycle],
        holidays: Default::default(),
    }
}

pub(crate) fn scenario_a_source() -> InMemorySource {
    InMemorySource::new(scenario_a_document())
}

/// Four nurses over one week (Mon 2024-03-04 to Sun 2024-03-10), one per
/// shift type every day, quotas of 7 per type.
pub(crate) fn week_document() -> RosterDocument {
    let roster = employees(4);
    let mut cycle = cycle(WEEK_ID, date(3, 4), date(3, 10), &roster);
    cycle.staffing_policy = StaffingPolicy::uniform("small", ShiftCounts::new(1, 1, 1));
    let quotas = [
        ShiftCounts::new(2, 2, 1),
        ShiftCounts::new(2, 1, 2),
        ShiftCounts::new(1, 2, 2),
        ShiftCounts::new(2, 2, 2),
    ];
    cycle.shift_quotas = roster
        .iter()
        .zip(quotas)
        .map(|(e, q)| (e.name.clone(), q))
        .collect();
    RosterDocument {
        cycles: vec![cycle],
        holidays: Default::default(),
    }
}

/// Context of a document's first cycle.
pub(crate) fn context_of(document: RosterDocument) -> RosterContext {
    let id = document.cycles[0].cycle_id.clone();
    let loader = RosterLoader::new(InMemorySource::new(document));
    RosterContext::clone(&loader.load(&id).unwrap())
}

pub(crate) fn week_context() -> RosterContext {
    context_of(week_document())
}

/// Configuration with test-sized solver budgets.
pub(crate) fn fast_config() -> SchedulerConfig {
    SchedulerConfig::default()
        .with_offday_solver(SolveBudget::default().with_time_limit_secs(20.0))
        .with_shift_solver(SolveBudget::default().with_time_limit_secs(20.0))
}

/// A work/off matrix for [`week_document`] that staffs three people a day
/// and matches every quota.
pub(crate) const WEEK_WORK: [&str; 4] = ["1101101", "1110110", "0111011", "1011111"];

pub(crate) fn week_matrix() -> WorkMatrix {
    let rows = WEEK_WORK
        .iter()
        .map(|r| r.chars().map(|c| c == '1').collect())
        .collect();
    WorkMatrix::from_rows(rows, 7).unwrap()
}
