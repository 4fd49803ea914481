//! Shift schedule (solution) model.
//!
//! A schedule assigns one [`ShiftType`] to every (employee, date) cell of
//! a cycle. It is the terminal artifact of the pipeline: handed to
//! verification and, on success, to the caller.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ShiftType, WorkMatrix};

/// Employee × date shift assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftSchedule {
    dates: Vec<NaiveDate>,
    employees: Vec<String>,
    rows: Vec<Vec<ShiftType>>,
}

/// Flat, serializable form of a schedule.
///
/// `schedule` maps employee name → one shift code per entry of `dates`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleExport {
    /// Dates the codes align to.
    pub dates: Vec<NaiveDate>,
    /// Employee name → codes (`"A"`, `"B"`, `"C"`, `"O"`).
    pub schedule: BTreeMap<String, Vec<String>>,
}

/// Error parsing a [`ScheduleExport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleParseError {
    /// A row does not have one code per date.
    #[error("employee '{employee}' has {actual} entries, expected {expected}")]
    LengthMismatch {
        /// Employee name.
        employee: String,
        /// Number of dates.
        expected: usize,
        /// Number of codes found.
        actual: usize,
    },
    /// A code is not one of A/B/C/O.
    #[error("employee '{employee}' has unknown shift code '{code}' on {date}")]
    UnknownCode {
        /// Employee name.
        employee: String,
        /// Date of the cell.
        date: NaiveDate,
        /// Offending code.
        code: String,
    },
}

impl ShiftSchedule {
    /// Creates a schedule. Returns `None` unless there is one row per
    /// employee and one cell per date in every row.
    pub fn new(
        dates: Vec<NaiveDate>,
        employees: Vec<String>,
        rows: Vec<Vec<ShiftType>>,
    ) -> Option<Self> {
        if rows.len() != employees.len() || rows.iter().any(|r| r.len() != dates.len()) {
            return None;
        }
        Some(Self {
            dates,
            employees,
            rows,
        })
    }

    /// Dates, in order.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Employee names, in roster order.
    pub fn employees(&self) -> &[String] {
        &self.employees
    }

    /// Number of days.
    pub fn day_count(&self) -> usize {
        self.dates.len()
    }

    /// Shift of employee `e` on day `d`.
    #[inline]
    pub fn get(&self, e: usize, d: usize) -> ShiftType {
        self.rows[e][d]
    }

    /// Row of employee `e`.
    pub fn row(&self, e: usize) -> &[ShiftType] {
        &self.rows[e]
    }

    /// Rows in roster order.
    pub fn rows(&self) -> &[Vec<ShiftType>] {
        &self.rows
    }

    /// Number of days employee `e` works `shift`.
    pub fn count(&self, e: usize, shift: ShiftType) -> usize {
        self.rows[e].iter().filter(|&&s| s == shift).count()
    }

    /// Number of employees on `shift` on day `d`.
    pub fn headcount(&self, d: usize, shift: ShiftType) -> usize {
        self.rows.iter().filter(|r| r[d] == shift).count()
    }

    /// Whether `Off` appears exactly where the matrix says off.
    pub fn consistent_with(&self, matrix: &WorkMatrix) -> bool {
        if matrix.employee_count() != self.rows.len() || matrix.day_count() != self.dates.len() {
            return false;
        }
        self.rows.iter().enumerate().all(|(e, row)| {
            row.iter()
                .enumerate()
                .all(|(d, s)| s.is_working() == matrix.works(e, d))
        })
    }

    /// Exports to the flat payload.
    pub fn export(&self) -> ScheduleExport {
        let schedule = self
            .employees
            .iter()
            .zip(&self.rows)
            .map(|(name, row)| {
                let codes = row.iter().map(|s| s.code().to_string()).collect();
                (name.clone(), codes)
            })
            .collect();
        ScheduleExport {
            dates: self.dates.clone(),
            schedule,
        }
    }

    /// Parses a flat payload. Employees come out ordered by name.
    pub fn from_export(export: &ScheduleExport) -> Result<Self, ScheduleParseError> {
        let expected = export.dates.len();
        let mut employees = Vec::with_capacity(export.schedule.len());
        let mut rows = Vec::with_capacity(export.schedule.len());

        for (name, codes) in &export.schedule {
            if codes.len() != expected {
                return Err(ScheduleParseError::LengthMismatch {
                    employee: name.clone(),
                    expected,
                    actual: codes.len(),
                });
            }
            let row = codes
                .iter()
                .zip(&export.dates)
                .map(|(code, date)| {
                    ShiftType::from_code(code).ok_or_else(|| ScheduleParseError::UnknownCode {
                        employee: name.clone(),
                        date: *date,
                        code: code.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            employees.push(name.clone());
            rows.push(row);
        }

        Ok(Self {
            dates: export.dates.clone(),
            employees,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ShiftType::*;

    fn dates(n: u32) -> Vec<NaiveDate> {
        (1..=n)
            .map(|d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap())
            .collect()
    }

    fn sample() -> ShiftSchedule {
        ShiftSchedule::new(
            dates(3),
            vec!["kim".into(), "lee".into()],
            vec![vec![Day, Night, Off], vec![Evening, Off, Night]],
        )
        .unwrap()
    }

    #[test]
    fn test_counts_and_headcount() {
        let s = sample();
        assert_eq!(s.count(0, Night), 1);
        assert_eq!(s.headcount(2, Night), 1);
        assert_eq!(s.headcount(1, Off), 1);
    }

    #[test]
    fn test_consistent_with_matrix() {
        let s = sample();
        let ok = WorkMatrix::from_rows(vec![vec![true, true, false], vec![true, false, true]], 3)
            .unwrap();
        let bad = WorkMatrix::from_rows(vec![vec![true, true, true], vec![true, false, true]], 3)
            .unwrap();
        assert!(s.consistent_with(&ok));
        assert!(!s.consistent_with(&bad));
    }

    #[test]
    fn test_export_payload_shape() {
        let export = sample().export();
        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["dates"][0], "2024-03-01");
        assert_eq!(json["schedule"]["kim"], serde_json::json!(["A", "C", "O"]));
        assert_eq!(ShiftSchedule::from_export(&export).unwrap(), sample());
    }

    #[test]
    fn test_parse_rejects_bad_rows() {
        let mut export = sample().export();
        export
            .schedule
            .insert("park".into(), vec!["A".into(), "X".into(), "O".into()]);
        assert!(matches!(
            ShiftSchedule::from_export(&export),
            Err(ScheduleParseError::UnknownCode { .. })
        ));

        let mut export = sample().export();
        export.schedule.insert("park".into(), vec!["A".into()]);
        assert!(matches!(
            ShiftSchedule::from_export(&export),
            Err(ScheduleParseError::LengthMismatch { actual: 1, .. })
        ));
    }
}
