//! Employees and their soft preferences.

use serde::{Deserialize, Serialize};

/// A rostered employee.
///
/// Names are unique within a cycle and are the key every per-employee
/// input (quotas, preferences, off-day requests) refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Employee {
    /// Stable identifier.
    pub id: String,
    /// Display name (unique within a cycle).
    pub name: String,
}

impl Employee {
    /// Creates an employee.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Per-employee soft preference flags.
///
/// Missing flags deserialize as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceFlags {
    /// Discourage long runs of working days.
    pub limit_consecutive_work: bool,
    /// Discourage isolated night shifts.
    pub prefer_continuous_night: bool,
    /// Prefer two rest days after a night shift.
    pub prefer_double_rest_after_night: bool,
}

impl PreferenceFlags {
    /// Sets `limit_consecutive_work`.
    pub fn with_limit_consecutive_work(mut self, value: bool) -> Self {
        self.limit_consecutive_work = value;
        self
    }

    /// Sets `prefer_continuous_night`.
    pub fn with_continuous_night(mut self, value: bool) -> Self {
        self.prefer_continuous_night = value;
        self
    }

    /// Sets `prefer_double_rest_after_night`.
    pub fn with_double_rest_after_night(mut self, value: bool) -> Self {
        self.prefer_double_rest_after_night = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_default_to_false() {
        let flags: PreferenceFlags =
            serde_json::from_str(r#"{"prefer_continuous_night": true}"#).unwrap();
        assert!(flags.prefer_continuous_night);
        assert!(!flags.limit_consecutive_work);
        assert!(!flags.prefer_double_rest_after_night);
    }

    #[test]
    fn test_preference_builders() {
        let flags = PreferenceFlags::default()
            .with_limit_consecutive_work(true)
            .with_double_rest_after_night(true);
        assert!(flags.limit_consecutive_work);
        assert!(flags.prefer_double_rest_after_night);
        assert!(!flags.prefer_continuous_night);
    }
}
