//! Rostering domain models.
//!
//! Provides the data types shared by every stage of the pipeline: the
//! planning cycle, employees and their inputs, staffing requirements, and
//! the two solution artifacts (work/off matrix and shift schedule).
//!
//! # Lifecycle
//!
//! | Type | Created | Mutated |
//! |------|---------|---------|
//! | `RosterCycle`, `Employee`, `ShiftCounts`, `PreferenceFlags`, `OffDayRequest`, `StaffingTable` | once per run, by the loader | never |
//! | `WorkMatrix` | once per run, by off-day planning | never |
//! | `ShiftSchedule` | once per attempt, by shift assignment | never |
//! | `VerificationReport` | once per attempt, by verification | never |

mod cycle;
mod employee;
mod handoff;
mod matrix;
mod report;
mod request;
mod schedule;
mod shift;
mod staffing;

pub(crate) use cycle::weekday_label;
pub use cycle::{CycleDescriptor, RosterCycle};
pub use employee::{Employee, PreferenceFlags};
pub use handoff::HandoffRules;
pub use matrix::WorkMatrix;
pub use report::{RuleCategory, VerificationReport};
pub use request::{OffDayKind, OffDayRequest, RequestedOffDay};
pub use schedule::{ScheduleExport, ScheduleParseError, ShiftSchedule};
pub use shift::{ShiftCounts, ShiftType};
pub use staffing::{DailyRequirement, HolidayCalendar, StaffingPolicy, StaffingTable, SATURDAY};
