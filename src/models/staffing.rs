//! Staffing requirements and the holiday calendar.
//!
//! A [`StaffingPolicy`] gives the required headcount per working shift
//! type for each weekday (`0` = Monday … `6` = Sunday). A
//! [`StaffingTable`] resolves the policy against a concrete cycle.
//!
//! # Holiday override
//! A holiday falling on a weekday is staffed like a Saturday.
//! A holiday on a Saturday or Sunday keeps its normal weekend row.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::{RosterCycle, ShiftCounts, ShiftType};

/// Weekday index of Saturday in a policy.
pub const SATURDAY: u8 = 5;

/// Weekday-indexed staffing requirement policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffingPolicy {
    /// Staffing group name.
    pub name: String,
    /// Requirement row per weekday index (0 = Monday).
    pub weekdays: BTreeMap<u8, ShiftCounts>,
}

impl Default for StaffingPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl StaffingPolicy {
    /// Creates a policy without rows.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weekdays: BTreeMap::new(),
        }
    }

    /// The standard ward policy: weekdays A3/B2/C1, Saturday A2/B1/C1,
    /// Sunday A1/B1/C1.
    pub fn standard() -> Self {
        let mut policy = Self::new("standard");
        for wd in 0..5 {
            policy = policy.with_row(wd, ShiftCounts::new(3, 2, 1));
        }
        policy
            .with_row(5, ShiftCounts::new(2, 1, 1))
            .with_row(6, ShiftCounts::new(1, 1, 1))
    }

    /// Same requirement every day of the week.
    pub fn uniform(name: impl Into<String>, counts: ShiftCounts) -> Self {
        let mut policy = Self::new(name);
        for wd in 0..7 {
            policy.weekdays.insert(wd, counts);
        }
        policy
    }

    /// Sets the row for a weekday index.
    pub fn with_row(mut self, weekday: u8, counts: ShiftCounts) -> Self {
        self.weekdays.insert(weekday, counts);
        self
    }

    /// Weekday indices (0..7) without a row.
    pub fn missing_rows(&self) -> Vec<u8> {
        (0..7).filter(|wd| !self.weekdays.contains_key(wd)).collect()
    }

    /// Row for a weekday (zero when absent).
    pub fn row(&self, weekday: Weekday) -> ShiftCounts {
        let idx = weekday.num_days_from_monday() as u8;
        self.weekdays.get(&idx).copied().unwrap_or_default()
    }

    /// Requirement for a date given whether it is a holiday.
    pub fn resolve(&self, date: NaiveDate, holiday: bool) -> (ShiftCounts, bool) {
        let weekday = date.weekday();
        let weekend = matches!(weekday, Weekday::Sat | Weekday::Sun);
        if holiday && !weekend {
            let saturday = self.weekdays.get(&SATURDAY).copied().unwrap_or_default();
            (saturday, true)
        } else {
            (self.row(weekday), false)
        }
    }
}

/// Public holidays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolidayCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Empty calendar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a holiday.
    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.dates.insert(date);
        self
    }

    /// Whether a date is a holiday.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// Holidays within `[start, end]`.
    pub fn within(&self, start: NaiveDate, end: NaiveDate) -> HolidayCalendar {
        HolidayCalendar {
            dates: self.dates.range(start..=end).copied().collect(),
        }
    }

    /// Iterates the holidays in order.
    pub fn iter(&self) -> impl Iterator<Item = &NaiveDate> {
        self.dates.iter()
    }

    /// Number of holidays.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether there are no holidays.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl FromIterator<NaiveDate> for HolidayCalendar {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self {
            dates: iter.into_iter().collect(),
        }
    }
}

/// Requirement resolved for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyRequirement {
    /// The date.
    pub date: NaiveDate,
    /// Required headcount per working shift type.
    pub counts: ShiftCounts,
    /// Whether the date is a holiday.
    pub holiday: bool,
    /// Whether the Saturday row was substituted for a weekday holiday.
    pub substituted: bool,
}

/// Staffing requirements resolved per date of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffingTable {
    days: Vec<DailyRequirement>,
}

impl StaffingTable {
    /// Resolves a policy over every date of the cycle.
    pub fn resolve(
        policy: &StaffingPolicy,
        cycle: &RosterCycle,
        holidays: &HolidayCalendar,
    ) -> Self {
        let days = cycle
            .dates()
            .into_iter()
            .map(|date| {
                let holiday = holidays.contains(date);
                let (counts, substituted) = policy.resolve(date, holiday);
                DailyRequirement {
                    date,
                    counts,
                    holiday,
                    substituted,
                }
            })
            .collect();
        Self { days }
    }

    /// Requirement at a day index.
    pub fn day(&self, day: usize) -> &DailyRequirement {
        &self.days[day]
    }

    /// All days in order.
    pub fn days(&self) -> &[DailyRequirement] {
        &self.days
    }

    /// Number of days.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Required headcount for one shift type on a day.
    pub fn required(&self, day: usize, shift: ShiftType) -> u32 {
        self.days[day].counts.get(shift)
    }

    /// Total required headcount on a day (all working types).
    pub fn required_headcount(&self, day: usize) -> u32 {
        self.days[day].counts.total()
    }

    /// Sum of requirements over the cycle, per shift type.
    pub fn totals(&self) -> ShiftCounts {
        self.days.iter().map(|d| d.counts).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_standard_policy_rows() {
        let policy = StaffingPolicy::standard();
        assert!(policy.missing_rows().is_empty());
        assert_eq!(policy.row(Weekday::Wed), ShiftCounts::new(3, 2, 1));
        assert_eq!(policy.row(Weekday::Sat), ShiftCounts::new(2, 1, 1));
        assert_eq!(policy.row(Weekday::Sun), ShiftCounts::new(1, 1, 1));
    }

    #[test]
    fn test_weekday_holiday_uses_saturday_row() {
        let policy = StaffingPolicy::standard();
        // 2024-03-06 is a Wednesday
        let (counts, substituted) = policy.resolve(d(2024, 3, 6), true);
        assert_eq!(counts, ShiftCounts::new(2, 1, 1));
        assert!(substituted);

        let (counts, substituted) = policy.resolve(d(2024, 3, 6), false);
        assert_eq!(counts, ShiftCounts::new(3, 2, 1));
        assert!(!substituted);
    }

    #[test]
    fn test_weekend_holiday_keeps_weekend_row() {
        let policy = StaffingPolicy::standard();
        // 2024-03-10 is a Sunday
        let (counts, substituted) = policy.resolve(d(2024, 3, 10), true);
        assert_eq!(counts, ShiftCounts::new(1, 1, 1));
        assert!(!substituted);
    }

    #[test]
    fn test_table_resolution() {
        let cycle = RosterCycle::new("w", d(2024, 3, 4), d(2024, 3, 10)).unwrap();
        let holidays = HolidayCalendar::new().with_holiday(d(2024, 3, 6));
        let table = StaffingTable::resolve(&StaffingPolicy::standard(), &cycle, &holidays);

        assert_eq!(table.len(), 7);
        assert!(table.day(2).holiday);
        assert!(table.day(2).substituted);
        assert_eq!(table.required_headcount(2), 4);
        assert_eq!(table.required_headcount(0), 6);
        // Mon, Tue, Thu, Fri: 3/2/1; Wed (holiday) + Sat: 2/1/1; Sun: 1/1/1
        assert_eq!(table.totals(), ShiftCounts::new(17, 11, 7));
    }

    #[test]
    fn test_policy_serde_weekday_keys() {
        let json = r#"{"name": "icu", "weekdays": {"0": {"A": 2, "B": 2, "C": 2}}}"#;
        let policy: StaffingPolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.row(Weekday::Mon), ShiftCounts::new(2, 2, 2));
        assert_eq!(policy.missing_rows(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_holiday_calendar_window() {
        let cal: HolidayCalendar = [d(2024, 2, 28), d(2024, 3, 6), d(2024, 4, 4)]
            .into_iter()
            .collect();
        let within = cal.within(d(2024, 3, 1), d(2024, 3, 31));
        assert_eq!(within.len(), 1);
        assert!(within.contains(d(2024, 3, 6)));
    }
}
