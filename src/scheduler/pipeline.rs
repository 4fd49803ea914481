//! End-to-end roster generation.
//!
//! [`RosterScheduler`] ties the stages together for one cycle:
//!
//! 1. load the roster context (cached per cycle)
//! 2. plan work and rest days; failure here ends the run
//! 3. fetch staffing requirements fresh from the source
//! 4. run the retry supervisor over shift assignment and verification
//!
//! Runs for different cycles may execute concurrently on one scheduler:
//! each run builds its own models and only shares immutable contexts.

use tracing::info;

use super::offday::{OffDayPlan, OffDaySolver};
use super::shift::{ShiftPlanner, ShiftTypeSolver};
use super::supervisor::{RetrySupervisor, RosterOutcome};
use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::loader::{RosterLoader, RosterSource};
use crate::models::{ScheduleExport, ShiftSchedule, VerificationReport};
use crate::verification::VerificationEngine;

/// Result of a full scheduling run.
#[derive(Debug, Clone)]
pub struct RosterResult {
    /// Cycle the run was for.
    pub cycle_id: String,
    /// Work/off plan the shift assignment was built on.
    pub offday: OffDayPlan,
    /// Outcome of the retry loop.
    pub outcome: RosterOutcome,
}

impl RosterResult {
    /// Whether a schedule passed verification.
    pub fn is_accepted(&self) -> bool {
        self.outcome.is_accepted()
    }

    /// Export form of the accepted schedule.
    pub fn export(&self) -> Option<ScheduleExport> {
        match &self.outcome {
            RosterOutcome::Accepted { schedule, .. } => Some(schedule.export()),
            RosterOutcome::RetriesExhausted { .. } => None,
        }
    }
}

/// Generates and verifies rosters from a data source.
///
/// # Example
/// ```no_run
/// use u_roster::config::SchedulerConfig;
/// use u_roster::loader::InMemorySource;
/// use u_roster::scheduler::RosterScheduler;
///
/// let source = InMemorySource::from_json_file("roster.json").unwrap();
/// let scheduler = RosterScheduler::new(source, SchedulerConfig::default()).unwrap();
/// let result = scheduler.schedule("2024-03").unwrap();
/// if let Some(export) = result.export() {
///     println!("{}", serde_json::to_string_pretty(&export).unwrap());
/// }
/// ```
pub struct RosterScheduler<S> {
    loader: RosterLoader<S>,
    config: SchedulerConfig,
}

impl<S: RosterSource> RosterScheduler<S> {
    /// Creates a scheduler over a source.
    ///
    /// # Errors
    /// `Configuration` if the settings are invalid.
    pub fn new(source: S, config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            loader: RosterLoader::new(source),
            config,
        })
    }

    /// Context loader.
    pub fn loader(&self) -> &RosterLoader<S> {
        &self.loader
    }

    /// Settings.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Runs off-day planning only.
    pub fn plan_offdays(&self, cycle_id: &str) -> Result<OffDayPlan> {
        let ctx = self.loader.load(cycle_id)?;
        OffDaySolver::new(&self.config).solve(&ctx)
    }

    /// Generates a roster with the default shift assignment solver.
    ///
    /// # Errors
    /// Loading failures and `Phase1Infeasible`. Shift assignment failures
    /// are reported in [`RosterResult::outcome`].
    pub fn schedule(&self, cycle_id: &str) -> Result<RosterResult> {
        self.schedule_with(cycle_id, &ShiftTypeSolver::new(&self.config))
    }

    /// Generates a roster with a caller-supplied shift planner.
    pub fn schedule_with<P: ShiftPlanner + ?Sized>(
        &self,
        cycle_id: &str,
        planner: &P,
    ) -> Result<RosterResult> {
        info!(cycle = cycle_id, "roster run started");
        let ctx = self.loader.load(cycle_id)?;
        let offday = OffDaySolver::new(&self.config).solve(&ctx)?;
        let requirements = self.loader.load_requirements(cycle_id)?;

        let outcome = RetrySupervisor::new(planner)
            .with_max_retries(self.config.max_retries)
            .with_verifier(self.verifier())
            .run(&ctx, &offday.matrix, &requirements);

        info!(
            cycle = cycle_id,
            accepted = outcome.is_accepted(),
            attempts = outcome.attempts(),
            "roster run finished"
        );
        Ok(RosterResult {
            cycle_id: cycle_id.to_string(),
            offday,
            outcome,
        })
    }

    /// Verifies an exported schedule against the cycle's current
    /// staffing requirements.
    ///
    /// # Errors
    /// `InvalidSchedule` if the export cannot be parsed, and loading
    /// failures.
    pub fn verify_schedule(
        &self,
        cycle_id: &str,
        export: &ScheduleExport,
    ) -> Result<VerificationReport> {
        let schedule = ShiftSchedule::from_export(export)?;
        let requirements = self.loader.load_requirements(cycle_id)?;
        Ok(self.verifier().verify(&schedule, &requirements))
    }

    fn verifier(&self) -> VerificationEngine {
        VerificationEngine::new().with_max_consecutive_work(self.config.rest.max_consecutive_work)
    }
}
