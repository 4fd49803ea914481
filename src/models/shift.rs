//! Shift types and per-type counts.
//!
//! A working day is subdivided into three shift types (Day, Evening,
//! Night), commonly labelled `A`, `B`, `C`. `Off` (`O`) marks rest.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One cell of a roster: a working shift or rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShiftType {
    /// Day shift (`A`).
    #[serde(rename = "A")]
    Day,
    /// Evening shift (`B`).
    #[serde(rename = "B")]
    Evening,
    /// Night shift (`C`).
    #[serde(rename = "C")]
    Night,
    /// Rest (`O`).
    #[serde(rename = "O")]
    Off,
}

impl ShiftType {
    /// The working variants, in index order.
    pub const WORKING: [ShiftType; 3] = [ShiftType::Day, ShiftType::Evening, ShiftType::Night];

    /// Single-letter code.
    pub fn code(self) -> &'static str {
        match self {
            ShiftType::Day => "A",
            ShiftType::Evening => "B",
            ShiftType::Night => "C",
            ShiftType::Off => "O",
        }
    }

    /// Parses a single-letter code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "A" | "a" => Some(ShiftType::Day),
            "B" | "b" => Some(ShiftType::Evening),
            "C" | "c" => Some(ShiftType::Night),
            "O" | "o" => Some(ShiftType::Off),
            _ => None,
        }
    }

    /// Whether this is a working variant.
    #[inline]
    pub fn is_working(self) -> bool {
        !matches!(self, ShiftType::Off)
    }

    /// Position in [`ShiftType::WORKING`] (`None` for `Off`).
    #[inline]
    pub fn working_index(self) -> Option<usize> {
        match self {
            ShiftType::Day => Some(0),
            ShiftType::Evening => Some(1),
            ShiftType::Night => Some(2),
            ShiftType::Off => None,
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            ShiftType::Day => "Day",
            ShiftType::Evening => "Evening",
            ShiftType::Night => "Night",
            ShiftType::Off => "Off",
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Counts per working shift type.
///
/// Used for per-employee quotas and per-date staffing requirements.
/// Serialized with the shift codes as keys: `{"A": 3, "B": 2, "C": 1}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftCounts {
    /// Day shifts.
    #[serde(rename = "A", default)]
    pub day: u32,
    /// Evening shifts.
    #[serde(rename = "B", default)]
    pub evening: u32,
    /// Night shifts.
    #[serde(rename = "C", default)]
    pub night: u32,
}

impl ShiftCounts {
    /// Creates counts for Day, Evening, Night.
    pub const fn new(day: u32, evening: u32, night: u32) -> Self {
        Self {
            day,
            evening,
            night,
        }
    }

    /// Count for a shift type (`Off` is always 0).
    pub fn get(&self, shift: ShiftType) -> u32 {
        match shift {
            ShiftType::Day => self.day,
            ShiftType::Evening => self.evening,
            ShiftType::Night => self.night,
            ShiftType::Off => 0,
        }
    }

    /// Sets the count for a working shift type. Ignored for `Off`.
    pub fn set(&mut self, shift: ShiftType, count: u32) {
        match shift {
            ShiftType::Day => self.day = count,
            ShiftType::Evening => self.evening = count,
            ShiftType::Night => self.night = count,
            ShiftType::Off => {}
        }
    }

    /// Sum over the working types.
    #[inline]
    pub fn total(&self) -> u32 {
        self.day + self.evening + self.night
    }
}

impl std::ops::Add for ShiftCounts {
    type Output = ShiftCounts;

    fn add(self, rhs: ShiftCounts) -> ShiftCounts {
        ShiftCounts::new(
            self.day + rhs.day,
            self.evening + rhs.evening,
            self.night + rhs.night,
        )
    }
}

impl std::iter::Sum for ShiftCounts {
    fn sum<I: Iterator<Item = ShiftCounts>>(iter: I) -> Self {
        iter.fold(ShiftCounts::default(), |acc, c| acc + c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for shift in [ShiftType::Day, ShiftType::Evening, ShiftType::Night, ShiftType::Off] {
            assert_eq!(ShiftType::from_code(shift.code()), Some(shift));
        }
        assert_eq!(ShiftType::from_code("X"), None);
        assert_eq!(ShiftType::Night.to_string(), "C");
    }

    #[test]
    fn test_working_index() {
        assert_eq!(ShiftType::Day.working_index(), Some(0));
        assert_eq!(ShiftType::Night.working_index(), Some(2));
        assert_eq!(ShiftType::Off.working_index(), None);
        assert!(!ShiftType::Off.is_working());
    }

    #[test]
    fn test_counts_serde_uses_codes() {
        let counts: ShiftCounts = serde_json::from_str(r#"{"A": 3, "C": 1}"#).unwrap();
        assert_eq!(counts, ShiftCounts::new(3, 0, 1));
        assert_eq!(counts.total(), 4);

        let json = serde_json::to_string(&ShiftCounts::new(1, 2, 3)).unwrap();
        assert_eq!(json, r#"{"A":1,"B":2,"C":3}"#);
    }

    #[test]
    fn test_counts_sum() {
        let total: ShiftCounts = [ShiftCounts::new(1, 0, 2), ShiftCounts::new(3, 1, 0)]
            .into_iter()
            .sum();
        assert_eq!(total, ShiftCounts::new(4, 1, 2));
        assert_eq!(total.get(ShiftType::Off), 0);
    }
}
