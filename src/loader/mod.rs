//! Roster context loading.
//!
//! A [`RosterSource`] answers the raw questions about a cycle (dates,
//! roster, quotas, preferences, off-day requests, staffing policy,
//! holidays). [`RosterLoader`] assembles and validates the answers into an
//! immutable [`RosterContext`].
//!
//! # Caching
//! Contexts are cached per cycle id behind `Arc`, so concurrent runs for
//! different cycles share nothing mutable and repeated runs for the same
//! cycle reuse one context. Staffing requirements for verification are
//! always fetched fresh through [`RosterLoader::load_requirements`].

mod context;
mod memory;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

pub use context::RosterContext;
pub use memory::{CycleDocument, InMemorySource, RosterDocument};

use crate::error::{Result, RosterError};
use crate::models::{
    CycleDescriptor, Employee, HolidayCalendar, PreferenceFlags, RequestedOffDay, RosterCycle,
    ShiftCounts, StaffingPolicy, StaffingTable,
};

/// Failure of a data source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source cannot be reached or refused the query.
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    /// The source has no such cycle.
    #[error("unknown cycle '{0}'")]
    UnknownCycle(String),
    /// Stored data could not be decoded.
    #[error("malformed roster document: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Stored data could not be read.
    #[error("cannot read roster document: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only provider of roster inputs.
///
/// Per-employee maps are keyed by employee name.
pub trait RosterSource: Send + Sync {
    /// Cycle descriptor, or `None` if the cycle does not exist.
    fn cycle(&self, cycle_id: &str) -> std::result::Result<Option<CycleDescriptor>, SourceError>;

    /// Roster of the cycle, in order.
    fn employees(&self, cycle_id: &str) -> std::result::Result<Vec<Employee>, SourceError>;

    /// Shift quotas.
    fn shift_quotas(
        &self,
        cycle_id: &str,
    ) -> std::result::Result<BTreeMap<String, ShiftCounts>, SourceError>;

    /// Preference flags.
    fn preferences(
        &self,
        cycle_id: &str,
    ) -> std::result::Result<BTreeMap<String, PreferenceFlags>, SourceError>;

    /// Off-day requests.
    fn off_day_requests(
        &self,
        cycle_id: &str,
    ) -> std::result::Result<BTreeMap<String, Vec<RequestedOffDay>>, SourceError>;

    /// Staffing policy of the cycle's staffing group.
    fn staffing_policy(&self, cycle_id: &str) -> std::result::Result<StaffingPolicy, SourceError>;

    /// Holidays between `start` and `end` inclusive.
    fn holidays(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<HolidayCalendar, SourceError>;
}

/// Loads and caches roster contexts from a source.
pub struct RosterLoader<S> {
    source: S,
    cache: RwLock<HashMap<String, Arc<RosterContext>>>,
}

impl<S: RosterSource> RosterLoader<S> {
    /// Creates a loader with an empty cache.
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Context of a cycle, from cache or freshly assembled.
    ///
    /// # Errors
    /// - `Configuration` if the cycle does not exist or its range is malformed
    /// - `Data` if inputs reference employees inconsistently
    /// - `Source` if the source fails
    pub fn load(&self, cycle_id: &str) -> Result<Arc<RosterContext>> {
        {
            let cache = self.cache.read().unwrap_or_else(|p| p.into_inner());
            if let Some(ctx) = cache.get(cycle_id) {
                debug!(cycle = cycle_id, "roster context cache hit");
                return Ok(Arc::clone(ctx));
            }
        }

        let ctx = Arc::new(self.fetch(cycle_id)?);
        let mut cache = self.cache.write().unwrap_or_else(|p| p.into_inner());
        let entry = cache
            .entry(cycle_id.to_string())
            .or_insert_with(|| Arc::clone(&ctx));
        Ok(Arc::clone(entry))
    }

    /// Staffing requirements of a cycle, fetched fresh from the source.
    pub fn load_requirements(&self, cycle_id: &str) -> Result<StaffingTable> {
        let cycle = self.fetch_cycle(cycle_id)?;
        let policy = self.source.staffing_policy(cycle_id)?;
        let missing = policy.missing_rows();
        if !missing.is_empty() {
            return Err(RosterError::Configuration(format!(
                "staffing policy '{}' has no row for weekday(s) {:?}",
                policy.name, missing
            )));
        }
        let holidays = self
            .source
            .holidays(cycle.start_date(), cycle.end_date())?
            .within(cycle.start_date(), cycle.end_date());
        Ok(StaffingTable::resolve(&policy, &cycle, &holidays))
    }

    /// Drops a cached context.
    pub fn invalidate(&self, cycle_id: &str) {
        let mut cache = self.cache.write().unwrap_or_else(|p| p.into_inner());
        cache.remove(cycle_id);
    }

    /// Number of cached contexts.
    pub fn cached(&self) -> usize {
        self.cache.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    fn fetch_cycle(&self, cycle_id: &str) -> Result<RosterCycle> {
        let descriptor = self.source.cycle(cycle_id)?.ok_or_else(|| {
            RosterError::Configuration(format!("cycle '{cycle_id}' not found"))
        })?;
        RosterCycle::from_descriptor(&descriptor).ok_or_else(|| {
            RosterError::Configuration(format!(
                "cycle '{cycle_id}' has malformed date range {}..{}",
                descriptor.start_date, descriptor.end_date
            ))
        })
    }

    fn fetch(&self, cycle_id: &str) -> Result<RosterContext> {
        let cycle = self.fetch_cycle(cycle_id)?;
        let employees = self.source.employees(cycle_id)?;
        let quotas = self.source.shift_quotas(cycle_id)?;
        let preferences = self.source.preferences(cycle_id)?;
        let off_days = self.source.off_day_requests(cycle_id)?;
        let policy = self.source.staffing_policy(cycle_id)?;
        let holidays = self.source.holidays(cycle.start_date(), cycle.end_date())?;

        let ctx = RosterContext::assemble(
            cycle,
            employees,
            &quotas,
            &preferences,
            &off_days,
            policy,
            holidays,
        )
        .map_err(RosterError::Data)?;

        info!(
            cycle = cycle_id,
            employees = ctx.employee_count(),
            days = ctx.day_count(),
            off_day_requests = ctx.requests().len(),
            holidays = ctx.holidays().len(),
            "roster context loaded"
        );
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn loader() -> RosterLoader<InMemorySource> {
        RosterLoader::new(testing::scenario_a_source())
    }

    #[test]
    fn test_load_caches_per_cycle() {
        let loader = loader();
        let a = loader.load(testing::CYCLE_ID).unwrap();
        let b = loader.load(testing::CYCLE_ID).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(loader.cached(), 1);

        loader.invalidate(testing::CYCLE_ID);
        let c = loader.load(testing::CYCLE_ID).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_unknown_cycle_is_configuration_error() {
        let err = loader().load("1999-01").unwrap_err();
        assert!(matches!(err, RosterError::Configuration(_)));
    }

    #[test]
    fn test_malformed_range_is_configuration_error() {
        let mut doc = testing::scenario_a_document();
        doc.cycles[0].end_date = doc.cycles[0].start_date.pred_opt().unwrap();
        let loader = RosterLoader::new(InMemorySource::new(doc));
        let err = loader.load(testing::CYCLE_ID).unwrap_err();
        assert!(err.to_string().contains("malformed date range"));
    }

    #[test]
    fn test_unknown_quota_employee_is_data_error() {
        let mut doc = testing::scenario_a_document();
        doc.cycles[0]
            .shift_quotas
            .insert("ghost".into(), ShiftCounts::new(1, 1, 1));
        let loader = RosterLoader::new(InMemorySource::new(doc));
        match loader.load(testing::CYCLE_ID) {
            Err(RosterError::Data(errors)) => assert!(errors[0].message.contains("ghost")),
            other => panic!("expected data error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_requirements_is_fresh() {
        let loader = loader();
        let ctx = loader.load(testing::CYCLE_ID).unwrap();
        let table = loader.load_requirements(testing::CYCLE_ID).unwrap();
        assert_eq!(&table, ctx.staffing());
        assert_eq!(loader.cached(), 1);
    }

    #[test]
    fn test_concurrent_cycles_are_independent() {
        let mut doc = testing::scenario_a_document();
        let mut second = doc.cycles[0].clone();
        second.cycle_id = "2024-04".into();
        second.start_date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        second.end_date = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        doc.cycles.push(second);
        let loader = RosterLoader::new(InMemorySource::new(doc));

        let (march, april) = std::thread::scope(|s| {
            let a = s.spawn(|| loader.load(testing::CYCLE_ID));
            let b = s.spawn(|| loader.load("2024-04"));
            (a.join().unwrap().unwrap(), b.join().unwrap().unwrap())
        });
        assert_eq!(march.day_count(), 31);
        assert_eq!(april.day_count(), 30);
        assert_eq!(loader.cached(), 2);
    }
}
