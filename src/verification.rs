//! Independent schedule verification.
//!
//! Re-checks a finished [`ShiftSchedule`] against the business rules without
//! looking at any solver model. Requirements are passed in explicitly so
//! callers can supply a freshly fetched table rather than the solver's copy.
//!
//! # Rule categories
//!
//! | Category | Passes when |
//! |----------|-------------|
//! | Daily staffing | Every date's headcount per shift type equals its requirement |
//! | Continuous work | No run of consecutive working days exceeds the limit (7) |
//! | Shift connection | A Night shift is followed by Night or Off |
//!
//! Both staffing shortfall and surplus are failures.

use chrono::Datelike;

use crate::models::{
    weekday_label, DailyRequirement, ShiftSchedule, ShiftType, StaffingTable, VerificationReport,
};

/// Checks schedules against staffing, continuous-work and handoff rules.
///
/// Verification is a pure function of its inputs: verifying the same
/// schedule twice yields identical reports.
///
/// # Example
/// ```
/// use u_roster::verification::VerificationEngine;
///
/// let engine = VerificationEngine::new().with_max_consecutive_work(6);
/// assert_eq!(engine.max_consecutive_work(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationEngine {
    max_consecutive_work: usize,
}

impl Default for VerificationEngine {
    fn default() -> Self {
        Self {
            max_consecutive_work: 7,
        }
    }
}

impl VerificationEngine {
    /// Engine with the standard 7-day run limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the longest accepted run of consecutive working days.
    pub fn with_max_consecutive_work(mut self, days: usize) -> Self {
        self.max_consecutive_work = days;
        self
    }

    /// Longest accepted run of consecutive working days.
    pub fn max_consecutive_work(&self) -> usize {
        self.max_consecutive_work
    }

    /// Verifies a schedule.
    pub fn verify(
        &self,
        schedule: &ShiftSchedule,
        requirements: &StaffingTable,
    ) -> VerificationReport {
        VerificationReport::from_details(
            self.check_daily_staffing(schedule, requirements),
            self.check_continuous_work(schedule),
            self.check_shift_connection(schedule),
        )
    }

    fn check_daily_staffing(
        &self,
        schedule: &ShiftSchedule,
        requirements: &StaffingTable,
    ) -> Vec<String> {
        let mut details = Vec::new();
        if schedule.day_count() != requirements.len() {
            details.push(format!(
                "schedule covers {} days but requirements cover {}",
                schedule.day_count(),
                requirements.len()
            ));
        }

        for (d, &date) in schedule.dates().iter().enumerate() {
            let Some(req) = requirements.days().iter().find(|r| r.date == date) else {
                details.push(format!("{date}: no staffing requirement"));
                continue;
            };
            for shift in ShiftType::WORKING {
                let required = req.counts.get(shift) as usize;
                let actual = schedule.headcount(d, shift);
                if actual < required {
                    details.push(format!(
                        "{}: {} shortage: required {required}, actual {actual}",
                        day_label(req),
                        shift.code()
                    ));
                } else if actual > required {
                    details.push(format!(
                        "{}: {} surplus: required {required}, actual {actual}",
                        day_label(req),
                        shift.code()
                    ));
                }
            }
        }
        details
    }

    fn check_continuous_work(&self, schedule: &ShiftSchedule) -> Vec<String> {
        let mut details = Vec::new();
        let dates = schedule.dates();
        for (e, name) in schedule.employees().iter().enumerate() {
            let row = schedule.row(e);
            let mut d = 0;
            while d < row.len() {
                if !row[d].is_working() {
                    d += 1;
                    continue;
                }
                let start = d;
                while d < row.len() && row[d].is_working() {
                    d += 1;
                }
                let run = d - start;
                if run > self.max_consecutive_work {
                    details.push(format!(
                        "{name}: {run} consecutive working days from {} to {} (limit {})",
                        dates[start],
                        dates[d - 1],
                        self.max_consecutive_work
                    ));
                }
            }
        }
        details
    }

    fn check_shift_connection(&self, schedule: &ShiftSchedule) -> Vec<String> {
        let mut details = Vec::new();
        let dates = schedule.dates();
        for (e, name) in schedule.employees().iter().enumerate() {
            for (d, pair) in schedule.row(e).windows(2).enumerate() {
                let (today, tomorrow) = (pair[0], pair[1]);
                if today == ShiftType::Night
                    && !matches!(tomorrow, ShiftType::Night | ShiftType::Off)
                {
                    details.push(format!(
                        "{name}: {} on {} followed by {} on {}",
                        today.code(),
                        dates[d],
                        tomorrow.code(),
                        dates[d + 1]
                    ));
                }
            }
        }
        details
    }
}

fn day_label(req: &DailyRequirement) -> String {
    let weekday = weekday_label(req.date.weekday());
    match (req.holiday, req.substituted) {
        (true, true) => format!("{} ({weekday}, holiday, Saturday staffing)", req.date),
        (true, false) => format!("{} ({weekday}, holiday)", req.date),
        _ => format!("{} ({weekday})", req.date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HolidayCalendar, RosterCycle, RuleCategory, ShiftCounts, StaffingPolicy};
    use crate::testing;

    fn schedule(rows: &[&str], start_day: u32) -> ShiftSchedule {
        let days = rows[0].len();
        let dates = (0..days as u32)
            .map(|i| testing::date(3, start_day + i))
            .collect();
        let names = (0..rows.len()).map(|e| format!("n{:02}", e + 1)).collect();
        let grid = rows
            .iter()
            .map(|r| {
                r.chars()
                    .map(|c| ShiftType::from_code(&c.to_string()).unwrap())
                    .collect()
            })
            .collect();
        ShiftSchedule::new(dates, names, grid).unwrap()
    }

    fn table(
        policy: &StaffingPolicy,
        start_day: u32,
        days: u32,
        holidays: &HolidayCalendar,
    ) -> StaffingTable {
        let cycle = RosterCycle::new(
            "t",
            testing::date(3, start_day),
            testing::date(3, start_day + days - 1),
        )
        .unwrap();
        StaffingTable::resolve(policy, &cycle, holidays)
    }

    fn one_each() -> StaffingPolicy {
        StaffingPolicy::uniform("one", ShiftCounts::new(1, 1, 1))
    }

    // Week 2024-03-04..10, one per type each day, valid handoffs.
    const VALID: [&str; 4] = ["BCOABOA", "AAAOABO", "OBBBOAB", "COCCCCC"];

    #[test]
    fn test_valid_schedule_passes() {
        let report = VerificationEngine::new().verify(
            &schedule(&VALID, 4),
            &table(&one_each(), 4, 7, &HolidayCalendar::new()),
        );
        assert!(report.passed(), "{report:?}");
        assert_eq!(report.violation_count(), 0);
    }

    #[test]
    fn test_shortage_and_surplus_reported() {
        let rows = ["BCOABOA", "AAAOABO", "OBBBOAB", "AOCCCCC"];
        let report = VerificationEngine::new().verify(
            &schedule(&rows, 4),
            &table(&one_each(), 4, 7, &HolidayCalendar::new()),
        );
        assert!(!report.daily_staffing_passed);
        assert_eq!(
            report.daily_staffing_details,
            vec![
                "2024-03-04 (Mon): A surplus: required 1, actual 2".to_string(),
                "2024-03-04 (Mon): C shortage: required 1, actual 0".to_string(),
            ]
        );
        assert!(report.continuous_work_passed);
        assert!(report.shift_connection_passed);
    }

    #[test]
    fn test_long_run_reported() {
        let engine = VerificationEngine::new();
        let requirements = table(&one_each(), 1, 9, &HolidayCalendar::new());
        let report = engine.verify(&schedule(&["AAAAAAAAO"], 1), &requirements);
        assert_eq!(
            report.continuous_work_details,
            vec![
                "n01: 8 consecutive working days from 2024-03-01 to 2024-03-08 (limit 7)"
                    .to_string()
            ]
        );
        assert_eq!(
            report.failed_categories(),
            vec![RuleCategory::DailyStaffing, RuleCategory::ContinuousWork]
        );

        let seven = engine.verify(&schedule(&["AAAAAAAOO"], 1), &requirements);
        assert!(seven.continuous_work_passed);
    }

    #[test]
    fn test_night_handoff_reported() {
        let rows = ["BCOABOA", "AAAOABO", "OBBBOAB", "COCCCCA"];
        let report = VerificationEngine::new().verify(
            &schedule(&rows, 4),
            &table(&one_each(), 4, 7, &HolidayCalendar::new()),
        );
        assert_eq!(
            report.shift_connection_details,
            vec!["n04: C on 2024-03-09 followed by A on 2024-03-10".to_string()]
        );
        assert_eq!(
            report.failed_categories(),
            vec![RuleCategory::DailyStaffing, RuleCategory::ShiftConnection]
        );
    }

    #[test]
    fn test_weekday_holiday_uses_saturday_row() {
        // 2024-03-06 is a Wednesday.
        let holidays = HolidayCalendar::new().with_holiday(testing::date(3, 6));
        let policy = StaffingPolicy::standard();
        let requirements = table(&policy, 6, 1, &holidays);
        let engine = VerificationEngine::new();

        // Saturday row: A2 B1 C1.
        let saturday = schedule(&["A", "A", "B", "C", "O", "O"], 6);
        assert!(engine.verify(&saturday, &requirements).passed());

        // Weekday row: A3 B2 C1 is now a surplus.
        let weekday = schedule(&["A", "A", "A", "B", "B", "C"], 6);
        let report = engine.verify(&weekday, &requirements);
        assert_eq!(
            report.daily_staffing_details,
            vec![
                "2024-03-06 (Wed, holiday, Saturday staffing): A surplus: required 2, actual 3"
                    .to_string(),
                "2024-03-06 (Wed, holiday, Saturday staffing): B surplus: required 1, actual 2"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_verification_is_idempotent() {
        let s = schedule(&["BCOABOA", "AAAOABO", "OBBBOAB", "AOCCCCA"], 4);
        let t = table(&one_each(), 4, 7, &HolidayCalendar::new());
        let engine = VerificationEngine::new();
        assert_eq!(engine.verify(&s, &t), engine.verify(&s, &t));
    }

    #[test]
    fn test_requirement_mismatch_reported() {
        let report = VerificationEngine::new().verify(
            &schedule(&VALID, 4),
            &table(&one_each(), 4, 6, &HolidayCalendar::new()),
        );
        assert_eq!(
            report.daily_staffing_details,
            vec![
                "schedule covers 7 days but requirements cover 6".to_string(),
                "2024-03-10: no staffing requirement".to_string(),
            ]
        );
    }
}
