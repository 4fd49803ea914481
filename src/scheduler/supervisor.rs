//! Bounded retry of shift assignment and verification.
//!
//! # Algorithm
//!
//! ```text
//! Building ──plan ok──▶ Verifying ──passed──▶ Success
//!    ▲    │                 │
//!    │    └─plan failed─┐   └─failed─┐
//!    │                  ▼            ▼
//!    └──── attempts < max_retries ◀──┘
//!                       │ otherwise
//!                       ▼
//!               ExhaustedRetries
//! ```
//!
//! Every attempt asks the planner for a brand-new schedule; nothing from a
//! failed attempt feeds the next one. Attempts run one after another.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::shift::{ShiftPlan, ShiftPlanner};
use crate::cp::SolveStatus;
use crate::loader::RosterContext;
use crate::models::{RuleCategory, ShiftSchedule, StaffingTable, VerificationReport, WorkMatrix};
use crate::verification::VerificationEngine;

/// States of the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SupervisorState {
    /// Running shift assignment for the current attempt.
    Building,
    /// Checking the attempt's schedule.
    Verifying,
    /// A schedule passed verification.
    Success,
    /// The retry budget is spent.
    ExhaustedRetries,
}

/// Why an attempt did not produce an acceptable schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttemptFailure {
    /// Shift assignment found no schedule.
    Phase2Infeasible {
        /// Solver status.
        #[serde(serialize_with = "serialize_status")]
        status: SolveStatus,
        /// Explanation.
        reason: String,
    },
    /// The schedule failed one or more rule categories.
    VerificationFailed {
        /// Failed categories.
        categories: Vec<RuleCategory>,
        /// Number of violation messages.
        violations: usize,
    },
}

fn serialize_status<S: serde::Serializer>(
    status: &SolveStatus,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(status)
}

/// Summary of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    /// Attempt number, starting at 1.
    pub attempt: u32,
    /// Seed the attempt ran with, if a schedule was produced.
    pub seed: Option<u64>,
    /// Objective of the produced schedule, if any.
    pub objective: Option<i64>,
    /// Failure, or `None` for the accepted attempt.
    pub failure: Option<AttemptFailure>,
    /// Wall-clock time of planning plus verification (ms).
    pub elapsed_ms: u64,
}

/// Final result of the retry loop.
#[derive(Debug, Clone)]
pub enum RosterOutcome {
    /// A schedule passed verification.
    Accepted {
        /// Accepted schedule.
        schedule: ShiftSchedule,
        /// Its (passing) report.
        report: VerificationReport,
        /// Solver details of the accepted attempt.
        plan: ShiftPlan,
        /// Every attempt, the accepted one last.
        history: Vec<AttemptRecord>,
    },
    /// No attempt passed. Carries the last schedule that was verified.
    RetriesExhausted {
        /// Last verified schedule, if any attempt produced one.
        schedule: Option<ShiftSchedule>,
        /// Its report.
        report: Option<VerificationReport>,
        /// Every attempt.
        history: Vec<AttemptRecord>,
    },
}

impl RosterOutcome {
    /// Whether a schedule was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, RosterOutcome::Accepted { .. })
    }

    /// The accepted schedule, or the last verified one.
    pub fn schedule(&self) -> Option<&ShiftSchedule> {
        match self {
            RosterOutcome::Accepted { schedule, .. } => Some(schedule),
            RosterOutcome::RetriesExhausted { schedule, .. } => schedule.as_ref(),
        }
    }

    /// Report of [`schedule`](Self::schedule).
    pub fn report(&self) -> Option<&VerificationReport> {
        match self {
            RosterOutcome::Accepted { report, .. } => Some(report),
            RosterOutcome::RetriesExhausted { report, .. } => report.as_ref(),
        }
    }

    /// Attempt history.
    pub fn history(&self) -> &[AttemptRecord] {
        match self {
            RosterOutcome::Accepted { history, .. }
            | RosterOutcome::RetriesExhausted { history, .. } => history,
        }
    }

    /// Number of attempts made.
    pub fn attempts(&self) -> usize {
        self.history().len()
    }
}

/// Runs shift assignment and verification until a schedule passes.
pub struct RetrySupervisor<'p, P: ?Sized> {
    planner: &'p P,
    verifier: VerificationEngine,
    max_retries: u32,
}

impl<'p, P: ShiftPlanner + ?Sized> RetrySupervisor<'p, P> {
    /// Supervisor with the default verifier and 5 attempts.
    pub fn new(planner: &'p P) -> Self {
        Self {
            planner,
            verifier: VerificationEngine::new(),
            max_retries: 5,
        }
    }

    /// Sets the attempt budget (at least 1).
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Sets the verifier.
    pub fn with_verifier(mut self, verifier: VerificationEngine) -> Self {
        self.verifier = verifier;
        self
    }

    /// Runs the loop.
    ///
    /// `requirements` is the table verification checks against; pass a
    /// freshly fetched one rather than the context's own copy.
    pub fn run(
        &self,
        ctx: &RosterContext,
        matrix: &WorkMatrix,
        requirements: &StaffingTable,
    ) -> RosterOutcome {
        let mut state = SupervisorState::Building;
        let mut attempt: u32 = 0;
        let mut history: Vec<AttemptRecord> = Vec::new();
        let mut pending: Option<ShiftPlan> = None;
        let mut accepted: Option<(ShiftPlan, VerificationReport)> = None;
        let mut last: Option<(ShiftSchedule, VerificationReport)> = None;
        let mut started = Instant::now();

        loop {
            debug!(cycle = ctx.cycle().id(), attempt, ?state, "supervisor state");
            state = match state {
                SupervisorState::Building => {
                    attempt += 1;
                    started = Instant::now();
                    match self.planner.plan(ctx, matrix, attempt) {
                        Ok(plan) if plan.schedule.consistent_with(matrix) => {
                            pending = Some(plan);
                            SupervisorState::Verifying
                        }
                        Ok(plan) => {
                            let failure = AttemptFailure::Phase2Infeasible {
                                status: plan.status,
                                reason: "schedule does not follow the work/off matrix".into(),
                            };
                            self.record_failure(&mut history, attempt, Some(&plan), failure, started);
                            self.next_after_failure(attempt)
                        }
                        Err(err) => {
                            let failure = AttemptFailure::Phase2Infeasible {
                                status: err.status,
                                reason: err.reason,
                            };
                            self.record_failure(&mut history, attempt, None, failure, started);
                            self.next_after_failure(attempt)
                        }
                    }
                }
                SupervisorState::Verifying => match pending.take() {
                    None => SupervisorState::Building,
                    Some(plan) => {
                        let report = self.verifier.verify(&plan.schedule, requirements);
                        if report.passed() {
                            history.push(AttemptRecord {
                                attempt,
                                seed: Some(plan.seed),
                                objective: Some(plan.objective),
                                failure: None,
                                elapsed_ms: started.elapsed().as_millis() as u64,
                            });
                            accepted = Some((plan, report));
                            SupervisorState::Success
                        } else {
                            let failure = AttemptFailure::VerificationFailed {
                                categories: report.failed_categories(),
                                violations: report.violation_count(),
                            };
                            self.record_failure(&mut history, attempt, Some(&plan), failure, started);
                            last = Some((plan.schedule, report));
                            self.next_after_failure(attempt)
                        }
                    }
                },
                SupervisorState::Success => match accepted.take() {
                    None => SupervisorState::ExhaustedRetries,
                    Some((plan, report)) => {
                        info!(
                            cycle = ctx.cycle().id(),
                            attempt,
                            objective = plan.objective,
                            "schedule accepted"
                        );
                        return RosterOutcome::Accepted {
                            schedule: plan.schedule.clone(),
                            report,
                            plan,
                            history,
                        };
                    }
                },
                SupervisorState::ExhaustedRetries => {
                    warn!(
                        cycle = ctx.cycle().id(),
                        attempts = attempt,
                        "retry budget exhausted without an acceptable schedule"
                    );
                    let (schedule, report) = match last {
                        Some((s, r)) => (Some(s), Some(r)),
                        None => (None, None),
                    };
                    return RosterOutcome::RetriesExhausted {
                        schedule,
                        report,
                        history,
                    };
                }
            };
        }
    }

    fn next_after_failure(&self, attempt: u32) -> SupervisorState {
        if attempt >= self.max_retries {
            SupervisorState::ExhaustedRetries
        } else {
            SupervisorState::Building
        }
    }

    fn record_failure(
        &self,
        history: &mut Vec<AttemptRecord>,
        attempt: u32,
        plan: Option<&ShiftPlan>,
        failure: AttemptFailure,
        started: Instant,
    ) {
        warn!(attempt, failure = ?failure, "attempt failed");
        history.push(AttemptRecord {
            attempt,
            seed: plan.map(|p| p.seed),
            objective: plan.map(|p| p.objective),
            failure: Some(failure),
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShiftType;
    use crate::scheduler::shift::PlanFailure;
    use crate::testing;

    const VALID: [&str; 4] = ["BCOABOA", "AAAOABO", "OBBBOAB", "COCCCCC"];
    // Day 0 has two Day shifts and no Night shift.
    const NIGHT_SHORT: [&str; 4] = ["BCOABOA", "AAAOABO", "OBBBOAB", "AOCCCCC"];
    // Night on day 5 followed by Day on day 6 for employee 3.
    const BAD_HANDOFF: [&str; 4] = ["BCOABOC", "AAAOABO", "OBBBOAB", "COCCCCA"];

    fn schedule(ctx: &RosterContext, rows: &[&str]) -> ShiftSchedule {
        let grid = rows
            .iter()
            .map(|r| {
                r.chars()
                    .map(|c| ShiftType::from_code(&c.to_string()).unwrap())
                    .collect()
            })
            .collect();
        ShiftSchedule::new(ctx.cycle().dates(), ctx.employee_names(), grid).unwrap()
    }

    /// Returns one schedule for the first attempts, another afterwards.
    struct Scripted {
        first: &'static [&'static str],
        first_attempts: u32,
        then: &'static [&'static str],
    }

    impl ShiftPlanner for Scripted {
        fn plan(
            &self,
            ctx: &RosterContext,
            _matrix: &WorkMatrix,
            attempt: u32,
        ) -> Result<ShiftPlan, PlanFailure> {
            let rows = if attempt <= self.first_attempts {
                self.first
            } else {
                self.then
            };
            let mut plan = ShiftPlan::from_schedule(schedule(ctx, rows));
            plan.seed = u64::from(attempt);
            Ok(plan)
        }
    }

    struct AlwaysInfeasible;

    impl ShiftPlanner for AlwaysInfeasible {
        fn plan(
            &self,
            _ctx: &RosterContext,
            _matrix: &WorkMatrix,
            _attempt: u32,
        ) -> Result<ShiftPlan, PlanFailure> {
            Err(PlanFailure {
                status: SolveStatus::Timeout,
                reason: "budget spent".into(),
            })
        }
    }

    #[test]
    fn test_first_valid_attempt_accepted() {
        let ctx = testing::week_context();
        let planner = Scripted {
            first: &VALID,
            first_attempts: 0,
            then: &VALID,
        };
        let outcome =
            RetrySupervisor::new(&planner).run(&ctx, &testing::week_matrix(), ctx.staffing());
        assert!(outcome.is_accepted());
        assert_eq!(outcome.attempts(), 1);
        assert!(outcome.report().unwrap().passed());
    }

    #[test]
    fn test_staffing_shortfall_recovered_by_retry() {
        let ctx = testing::week_context();
        let planner = Scripted {
            first: &NIGHT_SHORT,
            first_attempts: 1,
            then: &VALID,
        };
        let matrix = testing::week_matrix();
        let outcome = RetrySupervisor::new(&planner).run(&ctx, &matrix, ctx.staffing());

        let RosterOutcome::Accepted {
            schedule, history, ..
        } = &outcome
        else {
            panic!("expected acceptance, got {outcome:?}");
        };
        assert_eq!(history.len(), 2);
        assert_eq!(
            history[0].failure,
            Some(AttemptFailure::VerificationFailed {
                categories: vec![RuleCategory::DailyStaffing],
                violations: 2,
            })
        );
        assert_eq!(history[1].failure, None);
        assert_ne!(history[0].seed, history[1].seed);
        assert_ne!(schedule, &self::schedule(&ctx, &NIGHT_SHORT));
    }

    #[test]
    fn test_shortfall_message_names_the_date() {
        let ctx = testing::week_context();
        let planner = Scripted {
            first: &NIGHT_SHORT,
            first_attempts: 5,
            then: &VALID,
        };
        let outcome =
            RetrySupervisor::new(&planner).run(&ctx, &testing::week_matrix(), ctx.staffing());
        let report = outcome.report().unwrap();
        assert!(!report.daily_staffing_passed);
        assert!(report
            .daily_staffing_details
            .contains(&"2024-03-04 (Mon): C shortage: required 1, actual 0".to_string()));
    }

    #[test]
    fn test_retries_exhausted_on_persistent_handoff_violation() {
        let ctx = testing::week_context();
        let planner = Scripted {
            first: &BAD_HANDOFF,
            first_attempts: u32::MAX,
            then: &VALID,
        };
        let outcome =
            RetrySupervisor::new(&planner).run(&ctx, &testing::week_matrix(), ctx.staffing());

        let RosterOutcome::RetriesExhausted {
            schedule,
            report,
            history,
        } = outcome
        else {
            panic!("expected exhaustion");
        };
        assert_eq!(history.len(), 5);
        assert_eq!(history[4].attempt, 5);
        assert!(history.iter().all(|h| matches!(
            h.failure,
            Some(AttemptFailure::VerificationFailed { .. })
        )));
        let report = report.unwrap();
        assert!(!report.shift_connection_passed);
        assert!(report.daily_staffing_passed);
        assert_eq!(schedule.unwrap().get(3, 6), ShiftType::Day);
    }

    #[test]
    fn test_planner_failures_consume_budget() {
        let ctx = testing::week_context();
        let outcome = RetrySupervisor::new(&AlwaysInfeasible)
            .with_max_retries(3)
            .run(&ctx, &testing::week_matrix(), ctx.staffing());
        assert!(!outcome.is_accepted());
        assert_eq!(outcome.attempts(), 3);
        assert!(outcome.schedule().is_none());
        assert!(matches!(
            outcome.history()[0].failure,
            Some(AttemptFailure::Phase2Infeasible {
                status: SolveStatus::Timeout,
                ..
            })
        ));
    }

    #[test]
    fn test_schedule_off_the_matrix_is_rejected() {
        let ctx = testing::week_context();
        // Employee 0 rests on day 2 in the matrix but works here.
        const OFF_MATRIX: [&str; 4] = ["BCAABOA", "AAAOABO", "OBBBOAB", "COCCCCC"];
        let planner = Scripted {
            first: &OFF_MATRIX,
            first_attempts: 1,
            then: &VALID,
        };
        let outcome =
            RetrySupervisor::new(&planner).run(&ctx, &testing::week_matrix(), ctx.staffing());
        assert!(outcome.is_accepted());
        assert!(matches!(
            outcome.history()[0].failure,
            Some(AttemptFailure::Phase2Infeasible { .. })
        ));
    }
}
