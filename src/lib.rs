//! Nurse rostering for shift-based wards.
//!
//! Generates monthly three-shift rosters (Day `A`, Evening `B`, Night `C`,
//! Off `O`) that meet daily staffing requirements, honour off-day requests
//! and respect rest and handoff rules, then re-checks every result
//! independently before accepting it.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `RosterCycle`, `Employee`, `ShiftType`,
//!   `StaffingTable`, `WorkMatrix`, `ShiftSchedule`, `VerificationReport`
//! - **`loader`**: `RosterSource` trait, in-memory/JSON source, cached
//!   `RosterContext` assembly
//! - **`cp`**: Boolean constraint model with weighted soft terms, presolve
//!   and a simulated-annealing solver
//! - **`rules`**: Pluggable soft rules for both planning phases
//! - **`scheduler`**: Off-day planning, shift assignment, retry supervisor
//!   and the end-to-end `RosterScheduler`
//! - **`verification`**: Independent staffing, continuous-work and handoff
//!   checks
//! - **`validation`**: Input integrity checks
//! - **`config`**: Solver budgets, rest windows and soft-rule weights
//!
//! # Example
//! ```no_run
//! use u_roster::config::SchedulerConfig;
//! use u_roster::loader::InMemorySource;
//! use u_roster::scheduler::RosterScheduler;
//!
//! let source = InMemorySource::from_json_file("roster.json").unwrap();
//! let scheduler = RosterScheduler::new(source, SchedulerConfig::default()).unwrap();
//! let result = scheduler.schedule("2024-03").unwrap();
//! println!("accepted: {}", result.is_accepted());
//! ```
//!
//! # References
//!
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - Kirkpatrick et al. (1983), "Optimization by Simulated Annealing"

pub mod config;
pub mod cp;
pub mod error;
pub mod loader;
pub mod models;
pub mod rules;
pub mod scheduler;
pub mod validation;
pub mod verification;

#[cfg(test)]
mod testing;

pub use error::{Result, RosterError};
