//! JSON document data source.
//!
//! Holds any number of cycles plus a shared holiday calendar:
//!
//! ```json
//! {
//!   "holidays": ["2024-03-06"],
//!   "cycles": [{
//!     "cycle_id": "2024-03",
//!     "start_date": "2024-03-01",
//!     "end_date": "2024-03-31",
//!     "employees": [{"id": "1", "name": "kim"}],
//!     "shift_quotas": {"kim": {"A": 7, "B": 7, "C": 7}},
//!     "preferences": {"kim": {"prefer_continuous_night": true}},
//!     "off_days": {"kim": [{"date": "2024-03-05", "kind": "red-O"}]},
//!     "staffing_policy": {"name": "ward", "weekdays": {"0": {"A": 2, "B": 2, "C": 2}}}
//!   }]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{RosterSource, SourceError};
use crate::models::{
    CycleDescriptor, Employee, HolidayCalendar, PreferenceFlags, RequestedOffDay, ShiftCounts,
    StaffingPolicy,
};

/// A complete roster document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterDocument {
    /// Cycles.
    #[serde(default)]
    pub cycles: Vec<CycleDocument>,
    /// Public holidays (any dates).
    #[serde(default)]
    pub holidays: HolidayCalendar,
}

/// Inputs of one cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleDocument {
    /// Cycle identifier.
    pub cycle_id: String,
    /// First date.
    pub start_date: NaiveDate,
    /// Last date.
    pub end_date: NaiveDate,
    /// Roster, in order.
    pub employees: Vec<Employee>,
    /// Employee name → quota.
    #[serde(default)]
    pub shift_quotas: BTreeMap<String, ShiftCounts>,
    /// Employee name → preference flags.
    #[serde(default)]
    pub preferences: BTreeMap<String, PreferenceFlags>,
    /// Employee name → requested off days.
    #[serde(default)]
    pub off_days: BTreeMap<String, Vec<RequestedOffDay>>,
    /// Staffing policy of the staffing group.
    #[serde(default)]
    pub staffing_policy: StaffingPolicy,
}

/// In-memory [`RosterSource`] backed by a [`RosterDocument`].
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    document: RosterDocument,
}

impl InMemorySource {
    /// Wraps a document.
    pub fn new(document: RosterDocument) -> Self {
        Self { document }
    }

    /// Parses a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Reads and parses a JSON document file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Adds a cycle.
    pub fn with_cycle(mut self, cycle: CycleDocument) -> Self {
        self.document.cycles.push(cycle);
        self
    }

    /// Adds a holiday.
    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.document.holidays = std::mem::take(&mut self.document.holidays).with_holiday(date);
        self
    }

    /// The underlying document.
    pub fn document(&self) -> &RosterDocument {
        &self.document
    }

    fn find(&self, cycle_id: &str) -> Result<&CycleDocument, SourceError> {
        self.document
            .cycles
            .iter()
            .find(|c| c.cycle_id == cycle_id)
            .ok_or_else(|| SourceError::UnknownCycle(cycle_id.to_string()))
    }
}

impl RosterSource for InMemorySource {
    fn cycle(&self, cycle_id: &str) -> Result<Option<CycleDescriptor>, SourceError> {
        Ok(self
            .document
            .cycles
            .iter()
            .find(|c| c.cycle_id == cycle_id)
            .map(|c| CycleDescriptor {
                cycle_id: c.cycle_id.clone(),
                start_date: c.start_date,
                end_date: c.end_date,
            }))
    }

    fn employees(&self, cycle_id: &str) -> Result<Vec<Employee>, SourceError> {
        Ok(self.find(cycle_id)?.employees.clone())
    }

    fn shift_quotas(&self, cycle_id: &str) -> Result<BTreeMap<String, ShiftCounts>, SourceError> {
        Ok(self.find(cycle_id)?.shift_quotas.clone())
    }

    fn preferences(
        &self,
        cycle_id: &str,
    ) -> Result<BTreeMap<String, PreferenceFlags>, SourceError> {
        Ok(self.find(cycle_id)?.preferences.clone())
    }

    fn off_day_requests(
        &self,
        cycle_id: &str,
    ) -> Result<BTreeMap<String, Vec<RequestedOffDay>>, SourceError> {
        Ok(self.find(cycle_id)?.off_days.clone())
    }

    fn staffing_policy(&self, cycle_id: &str) -> Result<StaffingPolicy, SourceError> {
        Ok(self.find(cycle_id)?.staffing_policy.clone())
    }

    fn holidays(&self, start: NaiveDate, end: NaiveDate) -> Result<HolidayCalendar, SourceError> {
        Ok(self.document.holidays.within(start, end))
    }
}
