//! Work/off matrix produced by off-day planning.

use serde::{Deserialize, Serialize};

/// Employee × day boolean matrix: `true` = working, `false` = off.
///
/// Produced once per run and read-only afterwards; there is no public
/// way to change a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkMatrix {
    day_count: usize,
    rows: Vec<Vec<bool>>,
}

impl WorkMatrix {
    /// Creates a matrix from per-employee rows.
    ///
    /// Returns `None` if the rows do not all have `day_count` cells.
    pub fn from_rows(rows: Vec<Vec<bool>>, day_count: usize) -> Option<Self> {
        if rows.iter().any(|r| r.len() != day_count) {
            return None;
        }
        Some(Self { day_count, rows })
    }

    /// Number of employees.
    pub fn employee_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of days.
    pub fn day_count(&self) -> usize {
        self.day_count
    }

    /// Whether employee `e` works on day `d`.
    #[inline]
    pub fn works(&self, e: usize, d: usize) -> bool {
        self.rows[e][d]
    }

    /// Row of an employee.
    pub fn row(&self, e: usize) -> &[bool] {
        &self.rows[e]
    }

    /// Working days of an employee.
    pub fn work_days(&self, e: usize) -> usize {
        self.rows[e].iter().filter(|&&w| w).count()
    }

    /// Employees working on day `d`.
    pub fn headcount(&self, d: usize) -> usize {
        self.rows.iter().filter(|r| r[d]).count()
    }

    /// Largest number of working days in any window of `len` days for
    /// employee `e`.
    pub fn max_window_work(&self, e: usize, len: usize) -> usize {
        let row = &self.rows[e];
        if len == 0 || row.is_empty() {
            return 0;
        }
        let len = len.min(row.len());
        let mut count = row[..len].iter().filter(|&&w| w).count();
        let mut best = count;
        for start in 1..=row.len() - len {
            if row[start - 1] {
                count -= 1;
            }
            if row[start + len - 1] {
                count += 1;
            }
            best = best.max(count);
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let m = WorkMatrix::from_rows(
            vec![vec![true, true, false, true], vec![false, true, true, true]],
            4,
        )
        .unwrap();
        assert_eq!(m.employee_count(), 2);
        assert_eq!(m.work_days(0), 3);
        assert_eq!(m.headcount(1), 2);
        assert_eq!(m.headcount(2), 1);
        assert!(!m.works(1, 0));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        assert!(WorkMatrix::from_rows(vec![vec![true], vec![true, false]], 2).is_none());
    }

    #[test]
    fn test_max_window_work() {
        let m = WorkMatrix::from_rows(
            vec![vec![true, true, false, true, true, true, false, true]],
            8,
        )
        .unwrap();
        assert_eq!(m.max_window_work(0, 3), 3);
        assert_eq!(m.max_window_work(0, 4), 3);
        assert_eq!(m.max_window_work(0, 7), 5);
        assert_eq!(m.max_window_work(0, 20), 6);
    }
}
