//! Scheduler configuration.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration:
//!
//! ```
//! use u_roster::config::SchedulerConfig;
//!
//! let config = SchedulerConfig::from_json_str(r#"{"max_retries": 3}"#).unwrap();
//! assert_eq!(config.max_retries, 3);
//! assert_eq!(config.rest.max_consecutive_work, 7);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cp::SolverConfig;
use crate::error::{Result, RosterError};

/// Top-level settings for a scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Shift assignment attempts before giving up.
    pub max_retries: u32,
    /// Limits for off-day planning.
    pub offday_solver: SolveBudget,
    /// Limits for each shift assignment attempt.
    pub shift_solver: SolveBudget,
    /// Rest-window rules.
    pub rest: RestRules,
    /// Soft-rule weights.
    pub weights: PenaltyWeights,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            offday_solver: SolveBudget::default(),
            shift_solver: SolveBudget::default(),
            rest: RestRules::default(),
            weights: PenaltyWeights::default(),
        }
    }
}

/// Limits and search parameters of one solve call.
///
/// Unset fields fall back to the defaults of the stage using the budget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveBudget {
    /// Wall-clock limit in seconds.
    pub time_limit_secs: Option<f64>,
    /// Iteration limit. When unset only the time limit ends the search.
    pub max_iterations: Option<u64>,
    /// Iterations without improvement before restarting.
    pub stall_iterations: Option<u64>,
    /// Base random seed.
    pub seed: Option<u64>,
    /// Penalty per unit of hard-constraint violation during search.
    pub hard_weight: Option<i64>,
    /// Annealing start temperature.
    pub initial_temperature: Option<f64>,
    /// Annealing end temperature.
    pub final_temperature: Option<f64>,
}

impl SolveBudget {
    /// Sets the time limit.
    pub fn with_time_limit_secs(mut self, secs: f64) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }

    /// Sets the iteration limit.
    pub fn with_max_iterations(mut self, n: u64) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Sets the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Resolves the budget over stage defaults.
    pub fn resolve(&self, defaults: &SolverConfig) -> SolverConfig {
        SolverConfig {
            time_limit: self
                .time_limit_secs
                .map(Duration::from_secs_f64)
                .unwrap_or(defaults.time_limit),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            stall_iterations: self.stall_iterations.unwrap_or(defaults.stall_iterations),
            seed: self.seed.unwrap_or(defaults.seed),
            hard_weight: self.hard_weight.unwrap_or(defaults.hard_weight),
            initial_temperature: self
                .initial_temperature
                .unwrap_or(defaults.initial_temperature),
            final_temperature: self.final_temperature.unwrap_or(defaults.final_temperature),
        }
    }

    fn validate(&self, stage: &str) -> Result<()> {
        if let Some(secs) = self.time_limit_secs {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(RosterError::Configuration(format!(
                    "{stage}: time_limit_secs must be positive, got {secs}"
                )));
            }
        }
        if self.max_iterations == Some(0) {
            return Err(RosterError::Configuration(format!(
                "{stage}: max_iterations must be positive"
            )));
        }
        if let Some(w) = self.hard_weight {
            if w <= 0 {
                return Err(RosterError::Configuration(format!(
                    "{stage}: hard_weight must be positive, got {w}"
                )));
            }
        }
        if let (Some(t0), Some(t1)) = (self.initial_temperature, self.final_temperature) {
            if t1 > t0 {
                return Err(RosterError::Configuration(format!(
                    "{stage}: final_temperature {t1} exceeds initial_temperature {t0}"
                )));
            }
        }
        Ok(())
    }
}

/// Rolling-window rest rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestRules {
    /// Length of the short rest window (days).
    pub short_window_days: usize,
    /// Maximum working days inside the short window.
    pub short_window_max_work: u32,
    /// Length of the long rest window (days).
    pub long_window_days: usize,
    /// Maximum working days inside the long window.
    pub long_window_max_work: u32,
    /// Window over which long runs are discouraged (days).
    pub preferred_run_window_days: usize,
    /// Working days in that window above which each extra day is penalized.
    pub preferred_run_max_work: u32,
    /// Longest accepted run of consecutive working days.
    pub max_consecutive_work: usize,
}

impl Default for RestRules {
    fn default() -> Self {
        Self {
            short_window_days: 7,
            short_window_max_work: 6,
            long_window_days: 14,
            long_window_max_work: 12,
            preferred_run_window_days: 6,
            preferred_run_max_work: 5,
            max_consecutive_work: 7,
        }
    }
}

/// Weights of the soft rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyWeights {
    /// Per working day above the preferred run limit.
    pub consecutive_work_overage: i64,
    /// Per isolated working day (rest-work-rest).
    pub isolated_work_day: i64,
    /// Per soft off-day planned as a working day.
    pub soft_leave: i64,
    /// Per missing person on a shift.
    pub staffing_shortfall: i64,
    /// Per extra person on a shift.
    pub staffing_surplus: i64,
    /// Cost of a quota deviation of exactly 1, 2, 3… days.
    pub quota_deviation_tiers: Vec<i64>,
    /// Added cost per day of deviation beyond the last tier.
    pub quota_deviation_overflow: i64,
    /// Per soft off-day that still falls on a working shift.
    pub soft_leave_on_workday: i64,
    /// Per isolated night shift.
    pub isolated_night: i64,
    /// Per night shift followed by a single rest day.
    pub night_before_single_rest: i64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            consecutive_work_overage: 1,
            isolated_work_day: 1,
            soft_leave: 5,
            staffing_shortfall: 100,
            staffing_surplus: 30,
            quota_deviation_tiers: vec![15, 30, 50],
            quota_deviation_overflow: 25,
            soft_leave_on_workday: 5,
            isolated_night: 3,
            night_before_single_rest: 4,
        }
    }
}

impl SchedulerConfig {
    /// Parses a JSON configuration and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RosterError::Configuration(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            RosterError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Sets the retry budget.
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Sets the off-day planning budget.
    pub fn with_offday_solver(mut self, budget: SolveBudget) -> Self {
        self.offday_solver = budget;
        self
    }

    /// Sets the shift assignment budget.
    pub fn with_shift_solver(mut self, budget: SolveBudget) -> Self {
        self.shift_solver = budget;
        self
    }

    /// Checks settings for values no run could work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(RosterError::Configuration(
                "max_retries must be at least 1".into(),
            ));
        }
        self.offday_solver.validate("offday_solver")?;
        self.shift_solver.validate("shift_solver")?;

        let r = &self.rest;
        if r.short_window_days == 0
            || r.long_window_days == 0
            || r.preferred_run_window_days == 0
            || r.max_consecutive_work == 0
        {
            return Err(RosterError::Configuration(
                "rest windows must be at least one day long".into(),
            ));
        }

        let w = &self.weights;
        if w.quota_deviation_tiers.is_empty() {
            return Err(RosterError::Configuration(
                "quota_deviation_tiers must not be empty".into(),
            ));
        }
        if w.quota_deviation_tiers[0] <= 0
            || w.quota_deviation_tiers.windows(2).any(|t| t[1] <= t[0])
        {
            return Err(RosterError::Configuration(format!(
                "quota_deviation_tiers must be positive and strictly increasing, got {:?}",
                w.quota_deviation_tiers
            )));
        }
        if w.quota_deviation_overflow <= 0 {
            return Err(RosterError::Configuration(
                "quota_deviation_overflow must be positive".into(),
            ));
        }
        let weights = [
            w.consecutive_work_overage,
            w.isolated_work_day,
            w.soft_leave,
            w.staffing_shortfall,
            w.staffing_surplus,
            w.soft_leave_on_workday,
            w.isolated_night,
            w.night_before_single_rest,
        ];
        if weights.iter().any(|&x| x < 0) {
            return Err(RosterError::Configuration(
                "penalty weights must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = SchedulerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SchedulerConfig::default());
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.weights.quota_deviation_tiers, vec![15, 30, 50]);
    }

    #[test]
    fn test_partial_nested_sections() {
        let json = r#"{
            "shift_solver": {"time_limit_secs": 30, "seed": 9},
            "weights": {"staffing_surplus": 0}
        }"#;
        let config = SchedulerConfig::from_json_str(json).unwrap();
        assert_eq!(config.shift_solver.seed, Some(9));
        assert_eq!(config.shift_solver.max_iterations, None);
        assert_eq!(config.weights.staffing_surplus, 0);
        assert_eq!(config.weights.staffing_shortfall, 100);
    }

    #[test]
    fn test_budget_resolves_over_defaults() {
        let defaults = SolverConfig::default().with_seed(1).with_hard_weight(50);
        let budget = SolveBudget::default().with_time_limit_secs(2.5).with_seed(3);
        let resolved = budget.resolve(&defaults);
        assert_eq!(resolved.time_limit, Duration::from_millis(2500));
        assert_eq!(resolved.seed, 3);
        assert_eq!(resolved.hard_weight, 50);
    }

    #[test]
    fn test_rejects_zero_retries() {
        let err = SchedulerConfig::from_json_str(r#"{"max_retries": 0}"#).unwrap_err();
        assert!(matches!(err, RosterError::Configuration(_)));
    }

    #[test]
    fn test_rejects_non_increasing_tiers() {
        let json = r#"{"weights": {"quota_deviation_tiers": [15, 15, 50]}}"#;
        assert!(SchedulerConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_rejects_zero_window() {
        let json = r#"{"rest": {"short_window_days": 0}}"#;
        assert!(SchedulerConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_rejects_bad_budget() {
        let json = r#"{"offday_solver": {"time_limit_secs": -1}}"#;
        assert!(SchedulerConfig::from_json_str(json).is_err());
        let json = r#"{"offday_solver": {"initial_temperature": 1, "final_temperature": 2}}"#;
        assert!(SchedulerConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = SchedulerConfig::from_json_str("{not json").unwrap_err();
        assert!(err.to_string().starts_with("configuration error"));
    }
}
