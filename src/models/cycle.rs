//! Planning cycle.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Raw cycle descriptor as supplied by a data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleDescriptor {
    /// Cycle identifier.
    pub cycle_id: String,
    /// First date (inclusive).
    pub start_date: NaiveDate,
    /// Last date (inclusive).
    pub end_date: NaiveDate,
}

/// A validated planning cycle: an ordered, gap-free range of dates.
///
/// Day indices `0..day_count()` are used throughout the crate to address
/// dates within the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterCycle {
    id: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl RosterCycle {
    /// Creates a cycle. Returns `None` when `end_date` precedes `start_date`.
    pub fn new(id: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Option<Self> {
        if end_date < start_date {
            return None;
        }
        Some(Self {
            id: id.into(),
            start_date,
            end_date,
        })
    }

    /// Creates a cycle from a descriptor.
    pub fn from_descriptor(descriptor: &CycleDescriptor) -> Option<Self> {
        Self::new(
            descriptor.cycle_id.clone(),
            descriptor.start_date,
            descriptor.end_date,
        )
    }

    /// Cycle identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// First date.
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Last date.
    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Number of dates, `end - start + 1`.
    pub fn day_count(&self) -> usize {
        (self.end_date - self.start_date).num_days() as usize + 1
    }

    /// Date at a day index.
    pub fn date(&self, day: usize) -> NaiveDate {
        self.start_date + Duration::days(day as i64)
    }

    /// All dates in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        (0..self.day_count()).map(|d| self.date(d)).collect()
    }

    /// Day index of a date, if inside the cycle.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        if self.contains(date) {
            Some((date - self.start_date).num_days() as usize)
        } else {
            None
        }
    }

    /// Whether a date lies inside the cycle.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Weekday of a day index.
    pub fn weekday(&self, day: usize) -> Weekday {
        self.date(day).weekday()
    }
}

/// Short English weekday label used in diagnostics.
pub(crate) fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}
